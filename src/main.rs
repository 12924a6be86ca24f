use tracing::error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(message) = run().await {
        error!(error = %message, "minus80-agent startup failed");
        std::process::exit(1);
    }
}

#[cfg(feature = "gpio")]
async fn run() -> Result<(), String> {
    use minus80_agent::{
        config::AppConfig, directory::CsvDirectory, engine::EscalationEngine,
        gpio::GpioSignalSource, mailer::SmtpMailer, service, watcher::Watcher,
    };
    use std::sync::Arc;
    use tracing::info;

    let config = AppConfig::from_env().map_err(|error| error.to_string())?;

    let source =
        Arc::new(GpioSignalSource::new(config.gpio_pin).map_err(|error| error.to_string())?);
    let directory = CsvDirectory::new(&config.roster_path);
    let mailer = SmtpMailer::new(&config.smtp_relay, &config.sender, &config.smtp_password)
        .map_err(|error| error.to_string())?;

    info!(
        site_key = %config.site_key,
        pin = config.gpio_pin,
        debounce = ?config.debounce,
        "beginning monitor of alarm contact"
    );

    let watcher = Watcher::new(Arc::clone(&source), config.debounce);
    let engine = Arc::new(EscalationEngine::new(
        source,
        directory,
        mailer,
        config.site_key,
        config.it_recipient,
        config.timings,
    ));

    service::run(watcher, engine)
        .await
        .map_err(|error| error.to_string())
}

#[cfg(not(feature = "gpio"))]
async fn run() -> Result<(), String> {
    Err("built without gpio support; rebuild with --features gpio".to_owned())
}
