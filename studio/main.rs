/// Acne Severity Studio
///
/// A browser front end for the severity classifier: pick or capture an
/// image, then ask either the bundled model or the backend service for a
/// severity level. Served by a synchronous tiny_http server; the model loads
/// in the background while the page is already usable.
///
/// Run with:
///   cargo run --bin studio --release
/// Then open http://127.0.0.1:7878

mod state;
mod render;
mod routes;
mod handlers;
mod util;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tiny_http::Server;

use acne_severity::config::{
    ClassifierConfig, BUILD_BACKEND_URL, DEFAULT_CAMERA_SNAPSHOT, DEFAULT_MODEL_LOCATION,
};
use acne_severity::dispatch::load_severity_model;
use acne_severity::{CaptureSession, Dispatcher, ModelSlot, SnapshotCamera};

use state::{AppContext, StudioState};

#[derive(Parser)]
#[command(author, version, about = "Browser studio for the acne severity classifier")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,
    /// Model bundle directory, manifest path or base URL
    #[arg(long, default_value = DEFAULT_MODEL_LOCATION)]
    model: String,
    /// Base URL of the remote prediction service
    #[arg(long, env = "ACNE_BACKEND_URL", default_value = BUILD_BACKEND_URL)]
    backend_url: String,
    /// Image file the camera reads its frames from
    #[arg(long, default_value = DEFAULT_CAMERA_SNAPSHOT)]
    camera: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = ClassifierConfig::new(&args.backend_url, &args.model);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("studio-worker")
        .build()
        .context("building async runtime")?;

    let client = reqwest::Client::new();
    let slot = Arc::new(ModelSlot::new());

    // The page is served while the model loads; local predictions report
    // "loading" until it settles.
    {
        let slot = slot.clone();
        let client = client.clone();
        let source = config.model.clone();
        runtime.spawn(async move {
            // A failure is logged and recorded in the slot.
            let _ = slot.load_once(|| load_severity_model(&source, &client)).await;
        });
    }

    let dispatcher = Dispatcher::from_config(&config, slot.clone(), client);
    let capture = CaptureSession::new(Box::new(SnapshotCamera::new(args.camera.clone())));
    let ctx = Arc::new(AppContext {
        state: Arc::new(Mutex::new(StudioState::new(capture))),
        dispatcher,
        slot,
        runtime: runtime.handle().clone(),
    });

    let server = Server::http(&args.addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", args.addr, e))?;

    println!("╔══════════════════════════════════════════════╗");
    println!("║          Acne Severity Studio                ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Open in your browser:                       ║");
    println!("║  http://{:<37}║", args.addr);
    println!("╚══════════════════════════════════════════════╝");
    log::info!("model: {}", config.model);
    log::info!("backend: {}", ctx.dispatcher.remote().endpoint());
    log::info!("camera snapshots: {}", args.camera.display());

    // Each request is dispatched on its own thread so a slow prediction does
    // not stall page loads and uploads.
    for request in server.incoming_requests() {
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, ctx);
        });
    }
    Ok(())
}
