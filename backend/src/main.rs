use std::path::PathBuf;

use foodshare_backend::config::BackendConfig;
use foodshare_backend::domain::DonationFilter;
use foodshare_backend::domain::models::donation::DonationStatus;
use foodshare_backend::initialize_backend;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Optional config path as the only argument
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = BackendConfig::load(config_path.as_deref())?;

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting foodshare backend with {:?} storage", config.storage);
    let state = initialize_backend(&config)?;

    for status in DonationStatus::ALL {
        let count = state
            .donation_service
            .list_donations(&DonationFilter::with_status(status))?
            .len();
        info!("{} donation(s) {}", count, status);
    }

    Ok(())
}
