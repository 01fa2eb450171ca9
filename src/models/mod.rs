pub mod caption;
pub mod image;
pub mod sentiment;
pub mod upload;

pub use caption::*;
pub use image::*;
pub use sentiment::*;
pub use upload::*;
