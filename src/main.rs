//! Document Camera CLI
//!
//! Drives a session controller against the synthetic capture session:
//! permission check, configuration, start, a series of captures, stop.

use clap::Parser;
use doc_camera::{
    capture::{DeviceInventory, FileConfig, MockBehavior, MockPayload},
    controller::StatsSnapshot,
    AccessCompletion, CameraDelegate, CameraError, CapturedImage, DeviceOrientation,
    InterfaceOrientation, MockSession, PreviewRotation, PreviewTarget, SessionController,
    WorkerQueue,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "doc-camera")]
#[command(about = "Capture photos through a simulated camera session")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of photos to capture
    #[arg(short = 'n', long)]
    captures: Option<u32>,

    /// Keep capturing until interrupted
    #[arg(long)]
    continuous: bool,

    /// Answer the permission check with a denial
    #[arg(long)]
    deny_permission: bool,

    /// Simulate a device without a back camera
    #[arg(long)]
    no_device: bool,

    /// Directory decoded photos are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,
}

/// What the delegate reports back to the capture loop.
enum Outcome {
    Captured,
    Failed(CameraError),
    Terminal(&'static str),
}

struct DemoScreen {
    grant: bool,
    output_dir: Option<PathBuf>,
    rotation: Mutex<PreviewRotation>,
    outcomes: Mutex<mpsc::Sender<Outcome>>,
}

impl DemoScreen {
    fn send(&self, outcome: Outcome) {
        if let Ok(tx) = self.outcomes.lock() {
            let _ = tx.send(outcome);
        }
    }

    fn save(&self, image: &CapturedImage) {
        let Some(dir) = &self.output_dir else {
            return;
        };

        let timestamp = image.captured_at().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("photo_{}_{:03}.png", timestamp, image.request_id()));
        match image.upright().save(&path) {
            Ok(()) => info!(path = %path.display(), "Saved photo"),
            Err(e) => warn!(path = %path.display(), "Failed to save photo: {}", e),
        }
    }
}

impl PreviewTarget for DemoScreen {
    fn interface_orientation(&self) -> InterfaceOrientation {
        InterfaceOrientation::Portrait
    }

    fn device_orientation(&self) -> DeviceOrientation {
        DeviceOrientation::Portrait
    }

    fn preview_rotation(&self) -> PreviewRotation {
        self.rotation.lock().map(|r| *r).unwrap_or_default()
    }

    fn set_preview_rotation(&self, rotation: PreviewRotation) {
        if let Ok(mut current) = self.rotation.lock() {
            *current = rotation;
        }
    }

    fn session_attached(&self) {
        info!("Preview attached to session");
    }
}

impl CameraDelegate for DemoScreen {
    fn check_access(&self, completion: AccessCompletion) {
        info!(granted = self.grant, "Answering camera access check");
        completion.resolve(self.grant);
    }

    fn did_capture(&self, image: CapturedImage) {
        info!(
            request_id = image.request_id(),
            orientation = ?image.orientation(),
            "Received {}x{} photo",
            image.width(),
            image.height()
        );
        self.save(&image);
        self.send(Outcome::Captured);
    }

    fn access_denied(&self) {
        self.send(Outcome::Terminal("camera access denied"));
    }

    fn configuration_failed(&self) {
        self.send(Outcome::Terminal("camera configuration failed"));
    }

    fn log_error(&self, error: &CameraError) {
        warn!(kind = ?error.kind(), "{}", error);
        if !error.is_terminal() {
            self.send(Outcome::Failed(error.clone()));
        }
    }

    fn running_state_changed(&self, is_running: bool) {
        info!(is_running, "Session running state changed");
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Document Camera v{}", doc_camera::VERSION);
    info!("This is a demonstration using a simulated capture session");

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    // Command-line flags override the file
    let demo = &mut config.demo;
    if let Some(captures) = args.captures {
        demo.captures = captures;
    }
    demo.continuous |= args.continuous;
    demo.grant_permission &= !args.deny_permission;
    demo.device_available &= !args.no_device;
    if args.output_dir.is_some() {
        demo.output_dir = args.output_dir.clone();
    }
    if let Some(port) = args.metrics_port {
        demo.metrics_port = port;
    }
    let demo = config.demo.clone();

    if let Some(dir) = &demo.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    let behavior = MockBehavior {
        inventory: if demo.device_available {
            DeviceInventory::typical()
        } else {
            DeviceInventory::default()
        },
        payload: MockPayload::Png {
            width: demo.photo_width,
            height: demo.photo_height,
        },
        ..Default::default()
    };

    let ui = match WorkerQueue::new("doc-camera-ui") {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            eprintln!("Failed to start UI queue: {}", e);
            std::process::exit(1);
        }
    };

    let controller =
        match SessionController::with_config(MockSession::new(behavior), ui, config.controller) {
            Ok(controller) => controller,
            Err(e) => {
                eprintln!("Failed to create controller: {}", e);
                std::process::exit(1);
            }
        };

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    #[cfg(feature = "metrics")]
    let metrics = start_metrics_server(demo.metrics_port);
    #[cfg(not(feature = "metrics"))]
    {
        if demo.metrics_port != 0 {
            warn!("Metrics requested but the binary was built without the `metrics` feature");
        }
    }

    let (tx, rx) = mpsc::channel();
    let screen = Arc::new(DemoScreen {
        grant: demo.grant_permission,
        output_dir: demo.output_dir.clone(),
        rotation: Mutex::new(PreviewRotation::default()),
        outcomes: Mutex::new(tx),
    });

    controller.setup(&screen, &screen);
    controller.start();

    let interval = Duration::from_millis(demo.capture_interval_ms);
    let wait = Duration::from_secs(5);
    let mut delivered = 0u32;
    let mut failed = 0u32;
    let mut attempt = 0u32;

    while running.load(Ordering::SeqCst) && (demo.continuous || attempt < demo.captures) {
        attempt += 1;

        if let Err(e) = controller.capture_photo() {
            error!("Capture {} not started: {}", attempt, e);
            if e.is_terminal() {
                break;
            }
            std::thread::sleep(interval);
            continue;
        }

        match rx.recv_timeout(wait) {
            Ok(Outcome::Captured) => delivered += 1,
            Ok(Outcome::Failed(e)) => {
                warn!("Capture {} failed: {}", attempt, e);
                failed += 1;
            }
            Ok(Outcome::Terminal(reason)) => {
                error!("Giving up: {}", reason);
                break;
            }
            Err(_) => {
                warn!("Capture {} timed out", attempt);
                failed += 1;
            }
        }

        #[cfg(feature = "metrics")]
        update_metrics(&metrics, &controller.stats());

        std::thread::sleep(interval);
    }

    controller.stop();
    if !controller.sync(wait) {
        warn!("Session did not stop in time");
    }

    let stats = controller.stats();
    #[cfg(feature = "metrics")]
    update_metrics(&metrics, &stats);
    report(&stats, delivered, failed);

    if delivered == 0 && attempt > 0 {
        std::process::exit(1);
    }
}

fn report(stats: &StatsSnapshot, delivered: u32, failed: u32) {
    info!(
        "Done. {} delivered, {} failed ({} requested, {} rejected, {} restarts)",
        delivered, failed, stats.captures_requested, stats.captures_rejected, stats.restarts
    );
}

#[cfg(feature = "metrics")]
type MetricsHandle = Option<Arc<tokio::sync::RwLock<doc_camera::metrics::MetricsState>>>;

#[cfg(feature = "metrics")]
fn start_metrics_server(port: u16) -> MetricsHandle {
    use doc_camera::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    if port == 0 {
        return None;
    }

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Failed to create metrics registry: {}", e);
            return None;
        }
    };

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            error!("Metrics server failed: {}", e);
        }
    });

    Some(state)
}

#[cfg(feature = "metrics")]
fn update_metrics(metrics: &MetricsHandle, stats: &StatsSnapshot) {
    if let Some(state) = metrics {
        state.blocking_write().update(stats);
    }
}
