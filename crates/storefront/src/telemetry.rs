//! Tracing and Sentry initialization.
//!
//! The storefront is a library, so the host application decides when to call
//! [`init`]. The returned guard must be kept alive for the lifetime of the
//! process or Sentry events are dropped on shutdown.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::StorefrontConfig;

/// Initialize Sentry error tracking and return a guard that must be kept alive.
///
/// Returns `None` when no DSN is configured; tracing still works without it.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events forwarded to Sentry.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        _ => sentry_tracing::EventFilter::Breadcrumb,
    }
}

/// Set up the tracing subscriber (env-filter driven) plus the Sentry layer.
///
/// Call once at startup. Respects `RUST_LOG`, defaulting to `info` for this
/// crate and `warn` elsewhere.
pub fn init(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let guard = init_sentry(config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,showmyfit_storefront=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    guard
}
