//! Background task turning change notifications into refreshes.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_stream::{Stream, StreamExt};

use super::{ApiError, ChangeListener, MonitorError, NetworkEvent};

/// Something that can re-enumerate and reconcile adapters.
///
/// Called on tokio's blocking pool; implementations may do blocking I/O.
pub trait RefreshTarget: Send + Sync + 'static {
    /// Performs one full refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh failed. The notifier logs it and keeps
    /// waiting for the next trigger.
    fn refresh(&self) -> Result<(), MonitorError>;
}

/// What caused a refresh.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Event(NetworkEvent),
    Poll,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => write!(f, "{event}"),
            Self::Poll => write!(f, "poll"),
        }
    }
}

/// Handle to a running change-notification task.
///
/// Every event from the listener, and every poll tick when an interval is
/// set, triggers one call to [`RefreshTarget::refresh`]. Refreshes run one
/// at a time. A failed listener is dropped and the task carries on with
/// polling alone.
///
/// Dropping the handle without [`shutdown`](Self::shutdown) also stops the
/// task, but does not wait for it.
#[derive(Debug)]
pub struct ChangeNotifier {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ChangeNotifier {
    /// Spawns a notifier driven by `listener`, with optional safety-net polling.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<L, T>(listener: L, target: Arc<T>, poll_interval: Option<Duration>) -> Self
    where
        L: ChangeListener + 'static,
        T: RefreshTarget + ?Sized,
    {
        Self::start(Some(listener.into_stream()), target, poll_interval)
    }

    /// Spawns a notifier that only polls.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_polling<T>(target: Arc<T>, poll_interval: Duration) -> Self
    where
        T: RefreshTarget + ?Sized,
    {
        Self::start(
            None::<tokio_stream::Empty<Result<NetworkEvent, ApiError>>>,
            target,
            Some(poll_interval),
        )
    }

    fn start<S, T>(events: Option<S>, target: Arc<T>, poll_interval: Option<Duration>) -> Self
    where
        S: Stream<Item = Result<NetworkEvent, ApiError>> + Send + Unpin + 'static,
        T: RefreshTarget + ?Sized,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run(events, target, poll_interval, stop_rx));
        Self {
            stop: Some(stop_tx),
            task,
        }
    }

    /// Stops the task and waits for it to finish.
    ///
    /// A refresh already in progress completes first. The listener stream is
    /// dropped, which unregisters its OS callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Task`] if the task panicked.
    pub async fn shutdown(mut self) -> Result<(), MonitorError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.task).await?;
        Ok(())
    }
}

async fn run<S, T>(
    mut events: Option<S>,
    target: Arc<T>,
    poll_interval: Option<Duration>,
    mut stop: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<NetworkEvent, ApiError>> + Unpin,
    T: RefreshTarget + ?Sized,
{
    let mut ticker = poll_interval.map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    tracing::debug!(
        listener = events.is_some(),
        poll_interval = ?poll_interval,
        "Change notifier started"
    );

    loop {
        let trigger = tokio::select! {
            biased;

            _ = &mut stop => break,

            item = next_event(&mut events) => match item {
                Some(Ok(event)) => Trigger::Event(event),
                Some(Err(error)) => {
                    degrade(MonitorError::ListenerFailed(error), ticker.is_some());
                    events = None;
                    continue;
                }
                None => {
                    degrade(MonitorError::ListenerFailed(ApiError::Stopped), ticker.is_some());
                    events = None;
                    continue;
                }
            },

            () = next_tick(&mut ticker) => Trigger::Poll,
        };

        tracing::debug!(%trigger, "Refreshing adapters");
        refresh(&target).await;
    }

    tracing::debug!("Change notifier stopped");
}

fn degrade(error: MonitorError, polling: bool) {
    if polling {
        tracing::warn!(error = %error, "Falling back to polling-only mode");
    } else {
        tracing::warn!(
            error = %error,
            "No polling configured, adapter changes will not be detected"
        );
    }
}

async fn next_event<S>(events: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match events {
        Some(stream) => stream.next().await,
        None => future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn refresh<T: RefreshTarget + ?Sized>(target: &Arc<T>) {
    let target = Arc::clone(target);
    match tokio::task::spawn_blocking(move || target.refresh()).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => tracing::error!(error = %error, "Adapter refresh failed"),
        Err(error) => tracing::error!(error = %error, "Adapter refresh task failed"),
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
