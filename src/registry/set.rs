//! Immutable, versioned adapter collections.

use std::fmt;
use std::sync::Arc;

use crate::hardware::AdapterHardware;
use crate::network::{AdapterDescriptor, AdapterId};

/// One adapter paired with the hardware object created for it.
///
/// Never mutated after construction. A changed descriptor under the same id
/// keeps the original object; a new id is a new `TrackedAdapter`.
#[derive(Debug)]
pub struct TrackedAdapter<H> {
    descriptor: AdapterDescriptor,
    hardware: H,
}

impl<H: AdapterHardware> TrackedAdapter<H> {
    pub(crate) const fn new(descriptor: AdapterDescriptor, hardware: H) -> Self {
        Self {
            descriptor,
            hardware,
        }
    }

    /// Identity of this adapter.
    #[must_use]
    pub const fn id(&self) -> &AdapterId {
        &self.descriptor.id
    }

    /// Descriptor as seen when the adapter was first tracked.
    #[must_use]
    pub const fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    /// The live hardware object.
    #[must_use]
    pub const fn hardware(&self) -> &H {
        &self.hardware
    }
}

/// A published state of the registry.
///
/// Ordered by insertion: surviving adapters keep their position, newcomers
/// are appended in snapshot order.
pub struct AdapterSet<H> {
    version: u64,
    adapters: Vec<Arc<TrackedAdapter<H>>>,
}

impl<H: AdapterHardware> AdapterSet<H> {
    pub(crate) const fn empty() -> Self {
        Self {
            version: 0,
            adapters: Vec::new(),
        }
    }

    pub(crate) const fn new(version: u64, adapters: Vec<Arc<TrackedAdapter<H>>>) -> Self {
        Self { version, adapters }
    }

    /// Number of published changes that led to this set.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of tracked adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns `true` if no adapters are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Iterates tracked adapters in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<TrackedAdapter<H>>> {
        self.adapters.iter()
    }

    /// Iterates adapter ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &AdapterId> {
        self.adapters.iter().map(|adapter| adapter.id())
    }

    /// Looks up an adapter by id.
    #[must_use]
    pub fn get(&self, id: &AdapterId) -> Option<&Arc<TrackedAdapter<H>>> {
        self.adapters.iter().find(|adapter| adapter.id() == id)
    }

    /// Returns `true` if `id` is tracked.
    #[must_use]
    pub fn contains(&self, id: &AdapterId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn as_slice(&self) -> &[Arc<TrackedAdapter<H>>] {
        &self.adapters
    }
}

impl<'a, H: AdapterHardware> IntoIterator for &'a AdapterSet<H> {
    type Item = &'a Arc<TrackedAdapter<H>>;
    type IntoIter = std::slice::Iter<'a, Arc<TrackedAdapter<H>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<H: AdapterHardware> fmt::Debug for AdapterSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterSet")
            .field("version", &self.version)
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

/// Outcome of one reconcile pass.
pub struct ReconcileReport<H> {
    /// Adapters constructed in this pass, in snapshot order.
    pub added: Vec<Arc<TrackedAdapter<H>>>,
    /// Adapters evicted in this pass. Their hardware is already closed.
    pub removed: Vec<Arc<TrackedAdapter<H>>>,
    /// `true` when no snapshot was available and nothing was compared.
    pub skipped: bool,
}

impl<H> ReconcileReport<H> {
    pub(crate) const fn skipped() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            skipped: true,
        }
    }

    /// Returns `true` if nothing was added or removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl<H: AdapterHardware> fmt::Debug for ReconcileReport<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |list: &[Arc<TrackedAdapter<H>>]| {
            list.iter().map(|a| a.id().to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("ReconcileReport")
            .field("added", &ids(&self.added))
            .field("removed", &ids(&self.removed))
            .field("skipped", &self.skipped)
            .finish()
    }
}
