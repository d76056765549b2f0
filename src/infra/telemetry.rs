use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "holocron_cache_hit_total",
            Unit::Count,
            "Entity-list lookups served from the cache."
        );
        describe_counter!(
            "holocron_cache_miss_total",
            Unit::Count,
            "Entity-list lookups that found no live entry."
        );
        describe_counter!(
            "holocron_cache_read_error_total",
            Unit::Count,
            "Cache reads that failed or held an undecodable value and were treated as misses."
        );
        describe_counter!(
            "holocron_cache_expire_total",
            Unit::Count,
            "Forced expiries of the movie list after a comment was written."
        );
        describe_histogram!(
            "holocron_catalog_refresh_ms",
            Unit::Milliseconds,
            "Time to fetch, enrich and store an entity list on a cache miss."
        );
    });
}
