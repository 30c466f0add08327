use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::{
    application::{
        contact::METRIC_CONTACT_MESSAGES,
        posts::{METRIC_LISTING_MS, METRIC_POSTS_CREATED, METRIC_VALIDATION_REJECTED},
    },
    config::{LogFormat, LoggingSettings},
};

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
            METRIC_POSTS_CREATED,
            Unit::Count,
            "Total number of posts stored through the API or importer."
        );
        describe_counter!(
            METRIC_CONTACT_MESSAGES,
            Unit::Count,
            "Total number of contact messages stored."
        );
        describe_counter!(
            METRIC_VALIDATION_REJECTED,
            Unit::Count,
            "Total number of submissions rejected by validation, labelled by form."
        );
        describe_histogram!(
            METRIC_LISTING_MS,
            Unit::Milliseconds,
            "Paginated listing latency in milliseconds."
        );
    });
}
