pub mod cli;

use anyhow::Result;
use localrag_core::config::Config;
use localrag_hybrid::RagService;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `info`), so stdout stays
/// clean for answers and `--json` output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Layered config (`config.toml`, `config.<RUST_ENV>.toml`, `APP_*`) wired into a service.
pub fn load_service() -> Result<RagService> {
    let settings = Config::load()?.settings()?;
    Ok(RagService::from_settings(settings)?)
}
