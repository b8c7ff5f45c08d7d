use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use acne_severity::acquisition::{guess_mime, upload_image, CaptureSession, SnapshotCamera};
use acne_severity::config::{ClassifierConfig, BUILD_BACKEND_URL, DEFAULT_MODEL_LOCATION};
use acne_severity::dispatch::{load_severity_model, Dispatcher, ModelSlot, PredictionPath};
use acne_severity::SeverityLevel;

#[derive(Parser)]
#[command(author, version, about = "Classify acne severity from a facial image")]
struct Args {
    /// Model bundle directory, manifest path or base URL
    #[arg(long, default_value = DEFAULT_MODEL_LOCATION)]
    model: String,
    /// Base URL of the remote prediction service
    #[arg(long, env = "ACNE_BACKEND_URL", default_value = BUILD_BACKEND_URL)]
    backend_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the model in-process
    Local { image: PathBuf },
    /// Upload the image to the prediction service
    Remote { image: PathBuf },
    /// Save one frame from a snapshot camera as PNG
    Capture {
        #[arg(long)]
        camera: PathBuf,
        #[arg(long, default_value = "capture.png")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = ClassifierConfig::new(&args.backend_url, &args.model);

    match args.command {
        Command::Local { image } => classify(&config, PredictionPath::Local, image).await,
        Command::Remote { image } => classify(&config, PredictionPath::Remote, image).await,
        Command::Capture { camera, out } => {
            let mut session = CaptureSession::new(Box::new(SnapshotCamera::new(camera)));
            session.start_capture().map_err(|e| {
                let notice = e.user_notice();
                anyhow::Error::new(e).context(notice)
            })?;
            let frame = session.capture_frame().context("capturing frame")?;
            session.stop_capture();
            std::fs::write(&out, frame.bytes())
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Saved {}", out.display());
            Ok(())
        }
    }
}

async fn classify(config: &ClassifierConfig, path: PredictionPath, image: PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(&image).with_context(|| format!("reading {}", image.display()))?;
    let mime = guess_mime(&bytes).unwrap_or("application/octet-stream");
    let source = upload_image(bytes, mime).with_context(|| format!("loading {}", image.display()))?;

    let client = reqwest::Client::new();
    let slot = Arc::new(ModelSlot::new());
    if path == PredictionPath::Local {
        let loader_client = client.clone();
        let model = config.model.clone();
        // A failed load leaves the slot Failed; classify() reports it below.
        let _ = slot
            .load_once(|| async move { load_severity_model(&model, &loader_client).await })
            .await;
    }

    let dispatcher = Dispatcher::from_config(config, slot, client);
    match dispatcher.classify(path, Some(&source)).await {
        Ok(result) => {
            println!("Predicted Acne Severity: {}", result.prediction.display_value());
            if let Some(scores) = &result.scores {
                for (level, score) in SeverityLevel::ALL.iter().zip(scores) {
                    println!("  {:<15} {:.4}", level.label(), score);
                }
            }
            Ok(())
        }
        Err(e) => {
            let notice = e.user_notice();
            Err(anyhow::Error::new(e).context(notice))
        }
    }
}
