use clap::{Parser, Subcommand};
use genflow::{
    logger::{self, LogLevel, LoggerConfig},
    ActionOutcome, Config, GeneratedImage, ImageWorkflow, InferenceClient, InferenceOutput,
    Payload, TextWorkflow, UploadedImage, WorkflowSnapshot,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "genflow", version, about = "Analyze-then-generate image workflows")]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze the tone of a prompt, then render the prompt as an image
    Text {
        prompt: String,
        /// Skip the confirmation step
        #[arg(short, long)]
        yes: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Produce an image-to-image variation of a picture
    Image {
        file: PathBuf,
        /// 0.0 replaces the picture entirely, 1.0 keeps it unchanged
        #[arg(short, long)]
        strength: Option<f32>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Describe a picture with the vision model
    Caption { file: PathBuf },
    /// Send one raw request to a hosted model
    Query {
        model: String,
        /// JSON payload
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        json: Option<String>,
        /// Binary payload read from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Where to write a binary response
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let logger_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default().with_level(LogLevel::Warn)
    };
    let logger_config = if cli.json_logs {
        LoggerConfig {
            show_colors: false,
            show_emojis: false,
            ..logger_config.with_json_output(true)
        }
    } else {
        logger_config
    };
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::info!("No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);
    let client = InferenceClient::new(&config)?;

    match cli.command {
        Command::Text {
            prompt,
            yes,
            output,
        } => run_text(&client, prompt, yes, output).await,
        Command::Image {
            file,
            strength,
            output,
        } => run_image(&client, &file, strength, output).await,
        Command::Caption { file } => run_caption(&client, &file).await,
        Command::Query {
            model,
            json,
            file,
            output,
        } => run_query(&client, &model, json, file, output).await,
    }
}

async fn run_text(
    client: &InferenceClient,
    prompt: String,
    yes: bool,
    output: Option<PathBuf>,
) -> CliResult {
    let workflow = TextWorkflow::from_client(client)?;
    workflow.set_prompt(prompt);

    settle(workflow.analyze().await, &workflow.snapshot())?;
    if let Some(line) = workflow.snapshot().primary {
        println!("Tone Analysis: {}", line);
    }

    if !yes && !confirm("Approve & generate image?").await? {
        println!("Skipped image generation.");
        return Ok(());
    }

    settle(workflow.generate_image().await, &workflow.snapshot())?;
    if let Some(image) = workflow.image() {
        save(&image, output).await?;
    }
    Ok(())
}

async fn run_image(
    client: &InferenceClient,
    file: &Path,
    strength: Option<f32>,
    output: Option<PathBuf>,
) -> CliResult {
    let mut workflow = ImageWorkflow::from_client(client)?;
    if let Some(strength) = strength {
        workflow = workflow.with_strength(strength);
    }

    let upload = UploadedImage::from_path(file).await?;
    workflow.select_image(upload);

    settle(workflow.analyze(), &workflow.snapshot())?;
    if let Some(caption) = workflow.caption() {
        println!("Caption: {}", caption.text);
    }

    settle(workflow.generate_variation().await, &workflow.snapshot())?;
    if let Some(image) = workflow.variation() {
        save(&image, output).await?;
    }
    Ok(())
}

async fn run_caption(client: &InferenceClient, file: &Path) -> CliResult {
    let upload = UploadedImage::from_path(file).await?;
    let caption = client.caption()?.describe(&upload).await?;
    println!("{}", caption.text);
    Ok(())
}

async fn run_query(
    client: &InferenceClient,
    model: &str,
    json: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> CliResult {
    let payload = match (json, file) {
        (Some(json), _) => Payload::Json(serde_json::from_str(&json)?),
        (None, Some(file)) => Payload::Binary(tokio::fs::read(&file).await?),
        (None, None) => return Err("either --json or --file is required".into()),
    };

    match client.dispatcher()?.query(model, payload).await? {
        InferenceOutput::StructuredData(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
        InferenceOutput::PlainText(text) => println!("{}", text),
        InferenceOutput::BinaryBlob { media_type, bytes } => {
            save(&GeneratedImage::from_bytes(&bytes, media_type), output).await?
        }
    }
    Ok(())
}

/// Turns a controller outcome into a CLI result; failures carry the
/// message the controller recorded.
fn settle(outcome: ActionOutcome, snapshot: &WorkflowSnapshot) -> CliResult {
    match outcome {
        ActionOutcome::Completed => Ok(()),
        ActionOutcome::Failed => Err(snapshot
            .error
            .clone()
            .unwrap_or_else(|| "action failed".to_string())
            .into()),
        ActionOutcome::Ignored(reason) => Err(format!("nothing to do: {:?}", reason).into()),
    }
}

async fn confirm(question: &str) -> Result<bool, Box<dyn Error>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{} [y/N] ", question).as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn save(image: &GeneratedImage, output: Option<PathBuf>) -> CliResult {
    let path = output.unwrap_or_else(|| {
        let extension = image.media_type.rsplit('/').next().unwrap_or("png");
        PathBuf::from(format!(
            "generated_image_{}.{}",
            chrono::Utc::now().timestamp(),
            extension
        ))
    });
    image.save(&path).await?;
    println!("Saved {}", path.display());
    Ok(())
}
