//! Application execution logic.
//!
//! `list` enumerates once and renders the result; `watch` keeps the adapter
//! group reconciled with the OS until a shutdown signal arrives.

use std::sync::Arc;

use thiserror::Error;
use tokio::signal;

use nicwatch::config::ValidatedConfig;
use nicwatch::group::NetworkGroup;
use nicwatch::hardware::{
    AdapterHardware, HardwareFactory, MemorySettings, PassiveFactory, PassiveHardware,
};
use nicwatch::monitor::{ChangeNotifier, MonitorError};
use nicwatch::network::classify::PhysicalPolicy;
use nicwatch::network::platform::PlatformFetcher;
use nicwatch::network::{AdapterDescriptor, FetchError, SnapshotProvider};
use nicwatch::registry::{AdapterObserver, AdapterSet, TrackedAdapter};

#[cfg(windows)]
use nicwatch::monitor::platform::PlatformListener;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// The group type the binary runs with.
type AppGroup = NetworkGroup<PlatformFetcher, Box<dyn PhysicalPolicy>, PassiveHardware>;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Adapter enumeration failed.
    #[error("Failed to enumerate network adapters: {0}")]
    Enumerate(#[source] FetchError),

    /// The adapter list could not be rendered as JSON.
    #[error("Failed to render adapter list: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The change notifier did not stop cleanly.
    #[error("Change notifier failed: {0}")]
    Monitor(#[from] MonitorError),

    /// Signal handlers could not be installed.
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Logs every adapter arrival and departure.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl AdapterObserver<PassiveHardware> for LoggingObserver {
    fn adapter_added(&self, adapter: &TrackedAdapter<PassiveHardware>) {
        let descriptor = adapter.descriptor();
        tracing::info!("+ {} ({})", descriptor.display_name(), descriptor.id);
    }

    fn adapter_removed(&self, adapter: &TrackedAdapter<PassiveHardware>) {
        let descriptor = adapter.descriptor();
        tracing::info!("- {} ({})", descriptor.display_name(), descriptor.id);
    }
}

fn build_group(
    config: &ValidatedConfig,
    observers: Vec<Arc<dyn AdapterObserver<PassiveHardware>>>,
) -> Result<AppGroup, FetchError> {
    let provider = SnapshotProvider::new(PlatformFetcher::new(), config.build_policy());
    let factory: Arc<dyn HardwareFactory<Hardware = PassiveHardware>> = Arc::new(PassiveFactory);

    NetworkGroup::try_new(
        provider,
        factory,
        Arc::new(MemorySettings::new()),
        config.physical_only,
        observers,
    )
}

/// Enumerates adapters once and renders them as text or JSON.
///
/// # Errors
///
/// Returns an error if enumeration fails or the JSON cannot be produced.
pub fn list(config: &ValidatedConfig) -> Result<String, RunError> {
    let group = build_group(config, Vec::new()).map_err(RunError::Enumerate)?;

    let output = if config.json {
        let mut json = render_json(&group.adapters())?;
        json.push('\n');
        json
    } else {
        group.report()
    };

    group.close();
    Ok(output)
}

/// Renders the descriptors of `adapters` as a pretty-printed JSON array.
fn render_json<H: AdapterHardware>(adapters: &AdapterSet<H>) -> Result<String, RunError> {
    let descriptors: Vec<&AdapterDescriptor> =
        adapters.iter().map(|adapter| adapter.descriptor()).collect();
    Ok(serde_json::to_string_pretty(&descriptors)?)
}

/// Tracks adapters until Ctrl+C (or SIGTERM on Unix).
///
/// # Errors
///
/// Returns an error if the first enumeration fails, signal handlers cannot be
/// installed, or the notifier task panicked.
///
/// # Coverage Note
///
/// Excluded from coverage because it requires platform APIs and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn watch(config: ValidatedConfig) -> Result<(), RunError> {
    let observer: Arc<dyn AdapterObserver<PassiveHardware>> = Arc::new(LoggingObserver);
    let group = Arc::new(build_group(&config, vec![observer]).map_err(RunError::Enumerate)?);

    tracing::info!("Tracking {} adapter(s)", group.adapters().len());

    let notifier = spawn_notifier(&config, Arc::clone(&group));

    let signal_result = shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");

    notifier.shutdown().await?;
    let released = group.close();
    tracing::debug!("Released {released} adapter(s)");

    signal_result
}

#[cfg(windows)]
fn spawn_notifier(config: &ValidatedConfig, group: Arc<AppGroup>) -> ChangeNotifier {
    if config.poll_only {
        tracing::info!(
            "Polling-only mode enabled (interval: {}s)",
            config.poll_interval.as_secs()
        );
        return ChangeNotifier::spawn_polling(group, config.poll_interval);
    }

    tracing::info!(
        "Hybrid mode enabled (OS notifications + polling every {}s)",
        config.poll_interval.as_secs()
    );
    ChangeNotifier::spawn(PlatformListener::new(), group, Some(config.poll_interval))
}

#[cfg(not(windows))]
fn spawn_notifier(config: &ValidatedConfig, group: Arc<AppGroup>) -> ChangeNotifier {
    if !config.poll_only {
        tracing::warn!(
            "OS change notifications not supported on this platform, using polling only"
        );
    }
    tracing::info!("Polling every {}s", config.poll_interval.as_secs());
    ChangeNotifier::spawn_polling(group, config.poll_interval)
}

/// Completes when Ctrl+C or SIGTERM is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
#[cfg(unix)]
async fn shutdown_signal() -> Result<(), RunError> {
    let mut terminate =
        signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(RunError::Signal)?;

    tokio::select! {
        result = signal::ctrl_c() => result.map_err(RunError::Signal),
        _ = terminate.recv() => Ok(()),
    }
}

/// Completes when Ctrl+C is received.
#[cfg(not(tarpaulin_include))]
#[cfg(not(unix))]
async fn shutdown_signal() -> Result<(), RunError> {
    signal::ctrl_c().await.map_err(RunError::Signal)
}
