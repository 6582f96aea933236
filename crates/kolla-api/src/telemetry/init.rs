use kolla_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "kolla=debug,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to one JSON
/// object per line; anything else gets the compact console format.
pub fn init_telemetry(config: &Config) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter());

    if config.log_format() == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = config.environment(),
        log_format = config.log_format(),
        "Telemetry initialized"
    );
    Ok(())
}
