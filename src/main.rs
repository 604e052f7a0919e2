use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use timeplayer::audio::AlsaEngineFactory;
use timeplayer::config::Settings;
use timeplayer::init_app_dirs;
use timeplayer::notification::NotificationShade;
use timeplayer::service::PlaybackService;
use timeplayer::ui::{Args, Cli};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "timeplayer=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Logs go to stderr so they do not fight the status line on stdout.
    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    init_app_dirs()?;

    // Load configuration from file or use defaults
    let config_path = match &args.config {
        Some(path) => PathBuf::from(path),
        None => Settings::default_path(),
    };
    let mut settings = Settings::load(&config_path)?;

    // Command-line arguments (or their env fallbacks) win over the file
    if let Some(device) = &args.alsa_device {
        settings.alsa_device = device.clone();
    }
    if let Some(refresh_ms) = args.refresh_ms {
        settings.refresh_interval_ms = refresh_ms;
    }
    settings.validate()?;
    info!(
        "Starting timeplayer on ALSA device '{}' (config: {})",
        settings.alsa_device,
        config_path.display()
    );

    let shade = NotificationShade::new();
    let engine_factory = Arc::new(AlsaEngineFactory::new(settings.alsa_device.clone()));
    let service = PlaybackService::start(&settings, engine_factory, Box::new(shade.clone())).await?;

    let mut cli = Cli::new(shade);
    let result = cli.run(&service).await;

    service.stop().await;
    info!("timeplayer exited.");
    result
}
