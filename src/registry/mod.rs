//! Live registry of tracked adapters.
//!
//! [`AdapterRegistry::reconcile`] diffs a fresh snapshot against the
//! published [`AdapterSet`] and applies the minimal delta:
//!
//! 1. Ids present now but missing from the snapshot are evicted.
//! 2. Ids new in the snapshot get a hardware object from the factory.
//! 3. Everything else is carried over untouched (same `Arc`).
//!
//! The whole diff runs under a single writer lock and the result is swapped
//! in as a new immutable set, so readers calling [`AdapterRegistry::adapters`]
//! only ever see complete states. Hardware close and observer callbacks run
//! after the writer lock is released, under a dispatch lock taken before it
//! is released. Notifications therefore reach observers in publish order.

mod set;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

pub use set::{AdapterSet, ReconcileReport, TrackedAdapter};

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::hardware::{AdapterHardware, HardwareFactory, SettingsStore};
use crate::network::{AdapterDescriptor, AdapterId};

/// Receives add/remove notifications from a registry.
///
/// Called outside the registry's writer lock; implementations may query the
/// registry from inside a callback. They must not call
/// [`AdapterRegistry::reconcile`] or [`AdapterRegistry::clear`] from it.
pub trait AdapterObserver<H>: Send + Sync {
    /// An adapter started being tracked.
    fn adapter_added(&self, adapter: &TrackedAdapter<H>);

    /// An adapter stopped being tracked. Its hardware is already closed.
    fn adapter_removed(&self, adapter: &TrackedAdapter<H>);
}

/// Reconciled collection of adapters and their hardware objects.
pub struct AdapterRegistry<H: AdapterHardware + 'static> {
    factory: Arc<dyn HardwareFactory<Hardware = H>>,
    settings: Arc<dyn SettingsStore>,
    observers: Vec<Arc<dyn AdapterObserver<H>>>,
    writer: Mutex<()>,
    dispatch: Mutex<()>,
    published: RwLock<Arc<AdapterSet<H>>>,
}

impl<H: AdapterHardware + 'static> AdapterRegistry<H> {
    /// Creates an empty registry.
    pub fn new(
        factory: Arc<dyn HardwareFactory<Hardware = H>>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            factory,
            settings,
            observers: Vec::new(),
            writer: Mutex::new(()),
            dispatch: Mutex::new(()),
            published: RwLock::new(Arc::new(AdapterSet::empty())),
        }
    }

    /// Registers an observer for add/remove notifications.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AdapterObserver<H>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Returns the currently published set.
    pub fn adapters(&self) -> Arc<AdapterSet<H>> {
        Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of tracked adapters.
    pub fn len(&self) -> usize {
        self.adapters().len()
    }

    /// Returns `true` if no adapters are tracked.
    pub fn is_empty(&self) -> bool {
        self.adapters().is_empty()
    }

    /// Version of the published set.
    pub fn version(&self) -> u64 {
        self.adapters().version()
    }

    /// Looks up a tracked adapter by id.
    pub fn get(&self, id: &AdapterId) -> Option<Arc<TrackedAdapter<H>>> {
        self.adapters().get(id).cloned()
    }

    /// Applies `snapshot` to the registry.
    ///
    /// `None` means no snapshot could be taken this cycle: nothing is
    /// compared and the current state is kept. Duplicate ids within a
    /// snapshot collapse to their first occurrence.
    pub fn reconcile(&self, snapshot: Option<Vec<AdapterDescriptor>>) -> ReconcileReport<H> {
        let Some(snapshot) = snapshot else {
            tracing::debug!("No snapshot available, keeping current adapters");
            return ReconcileReport::skipped();
        };

        let (report, _dispatch) = {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            let current = self.adapters();

            let mut incoming_ids = HashSet::with_capacity(snapshot.len());
            let incoming: Vec<AdapterDescriptor> = snapshot
                .into_iter()
                .filter(|descriptor| incoming_ids.insert(descriptor.id.clone()))
                .collect();

            let (kept, removed): (Vec<_>, Vec<_>) = current
                .iter()
                .cloned()
                .partition(|adapter| incoming_ids.contains(adapter.id()));

            let known: HashSet<&AdapterId> = current.ids().collect();
            let added: Vec<_> = incoming
                .into_iter()
                .filter(|descriptor| !known.contains(&descriptor.id))
                .map(|descriptor| self.track(descriptor))
                .collect();

            if !added.is_empty() || !removed.is_empty() {
                let mut next = kept;
                next.extend(added.iter().cloned());
                self.publish(AdapterSet::new(current.version() + 1, next));
            }

            let report = ReconcileReport {
                added,
                removed,
                skipped: false,
            };
            (report, self.lock_dispatch())
        };

        if !report.is_empty() {
            tracing::debug!(
                added = report.added.len(),
                removed = report.removed.len(),
                version = self.version(),
                "Reconciled adapters"
            );
        }
        self.dispatch(&report.removed, &report.added);
        report
    }

    /// Evicts and closes every tracked adapter. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let (removed, _dispatch) = {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            let current = self.adapters();
            if current.is_empty() {
                return 0;
            }
            self.publish(AdapterSet::new(current.version() + 1, Vec::new()));
            (current.as_slice().to_vec(), self.lock_dispatch())
        };

        self.dispatch(&removed, &[]);
        removed.len()
    }

    fn track(&self, descriptor: AdapterDescriptor) -> Arc<TrackedAdapter<H>> {
        let hardware = self
            .factory
            .create(&descriptor, Arc::clone(&self.settings));
        Arc::new(TrackedAdapter::new(descriptor, hardware))
    }

    /// Taken while the writer lock is still held, so dispatch order follows
    /// publish order.
    fn lock_dispatch(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, set: AdapterSet<H>) {
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(set);
    }

    /// Closes removed hardware, then notifies removals before additions.
    fn dispatch(&self, removed: &[Arc<TrackedAdapter<H>>], added: &[Arc<TrackedAdapter<H>>]) {
        for adapter in removed {
            adapter.hardware().close();
        }
        for observer in &self.observers {
            for adapter in removed {
                observer.adapter_removed(adapter);
            }
        }
        for observer in &self.observers {
            for adapter in added {
                observer.adapter_added(adapter);
            }
        }
    }
}

impl<H: AdapterHardware + 'static> fmt::Debug for AdapterRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.adapters())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
