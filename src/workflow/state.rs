use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum WorkflowStatus {
    Idle,
    Loading,
    Error(String),
}

/// The four fields a controller exposes to whoever renders it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl WorkflowSnapshot {
    pub fn status(&self) -> WorkflowStatus {
        if self.is_loading {
            WorkflowStatus::Loading
        } else if let Some(message) = &self.error {
            WorkflowStatus::Error(message.clone())
        } else {
            WorkflowStatus::Idle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyPrompt,
    NoImageSelected,
    /// The previous step has not produced its result yet.
    NotReady,
    Busy,
}

/// Failures are not returned: they land in the snapshot's `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed,
    Ignored(IgnoreReason),
}

/// At most one action in flight per controller.
#[derive(Debug, Default)]
pub(crate) struct SingleFlight {
    busy: AtomicBool,
}

impl SingleFlight {
    pub(crate) fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flag: &self.busy })
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

pub(crate) struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Never held across an await; a poisoned lock still yields its data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
