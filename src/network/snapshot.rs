//! Eligibility-filtered, ordered adapter snapshots with bounded retry.

use super::classify::{PhysicalPolicy, is_eligible_type};
use super::{AdapterDescriptor, AdapterFetcher, FetchError};

/// Total number of enumeration attempts made for transient failures.
pub const MAX_ATTEMPTS: u32 = 5;

/// Produces the adapter set the registry reconciles against.
///
/// Wraps an [`AdapterFetcher`] and:
/// 1. drops adapters rejected by [`is_eligible_type`],
/// 2. sorts the remainder by name (ties broken by id),
/// 3. in strict mode, keeps only adapters the [`PhysicalPolicy`] accepts.
///
/// # Transient Failures
///
/// When the fetcher fails with an error for which
/// [`FetchError::is_transient`] holds, the call is repeated immediately, up
/// to [`MAX_ATTEMPTS`] attempts in total. If every attempt fails the result
/// is `Ok(None)`, meaning "no snapshot this cycle". Callers must not read it
/// as "all adapters removed".
///
/// # Examples
///
/// ```ignore
/// use nicwatch::network::SnapshotProvider;
/// use nicwatch::network::classify::BindingPolicy;
/// use nicwatch::network::platform::PlatformFetcher;
///
/// let provider = SnapshotProvider::new(PlatformFetcher::new(), BindingPolicy::new());
/// if let Some(adapters) = provider.snapshot(true)? {
///     for adapter in adapters {
///         println!("{}: {}", adapter.name, adapter.description);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct SnapshotProvider<F, P> {
    fetcher: F,
    policy: P,
}

impl<F, P> SnapshotProvider<F, P> {
    /// Creates a new snapshot provider.
    #[must_use]
    pub const fn new(fetcher: F, policy: P) -> Self {
        Self { fetcher, policy }
    }

    /// Returns a reference to the inner fetcher.
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns a reference to the physical-adapter policy.
    pub const fn policy(&self) -> &P {
        &self.policy
    }
}

impl<F: AdapterFetcher, P: PhysicalPolicy> SnapshotProvider<F, P> {
    /// Returns the current eligible adapters, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error unchanged when it is not transient.
    /// Such errors are never retried.
    pub fn snapshot(
        &self,
        strict_physical_only: bool,
    ) -> Result<Option<Vec<AdapterDescriptor>>, FetchError> {
        let Some(adapters) = self.fetch_with_retry()? else {
            return Ok(None);
        };

        let mut eligible: Vec<_> = adapters.into_iter().filter(is_eligible_type).collect();
        eligible.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        if strict_physical_only {
            eligible.retain(|adapter| self.policy.is_physical(adapter));
        }

        Ok(Some(eligible))
    }

    fn fetch_with_retry(&self) -> Result<Option<Vec<AdapterDescriptor>>, FetchError> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.fetcher.fetch() {
                Ok(adapters) => return Ok(Some(adapters)),
                Err(e) if e.is_transient() => {
                    tracing::debug!("Enumeration attempt {attempt}/{MAX_ATTEMPTS} failed: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            "Adapter enumeration failed {MAX_ATTEMPTS} times in a row, keeping previous state"
        );
        Ok(None)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
