//! Tests for the network group facade.

use super::*;
use crate::hardware::{MemorySettings, PassiveFactory, PassiveHardware, Sensor};
use crate::network::classify::{BindingPolicy, PolicyChain};
use crate::network::{AdapterDescriptor, AdapterId, InterfaceType, MAX_ATTEMPTS, OperStatus};
use std::collections::VecDeque;
use std::sync::Mutex;

struct MockFetcher {
    results: Mutex<VecDeque<Result<Vec<AdapterDescriptor>, FetchError>>>,
}

impl MockFetcher {
    fn new(results: Vec<Result<Vec<AdapterDescriptor>, FetchError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
        }
    }

    fn push(&self, result: Result<Vec<AdapterDescriptor>, FetchError>) {
        self.results.lock().unwrap().push_back(result);
    }
}

impl AdapterFetcher for MockFetcher {
    fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

fn ethernet(id: &str, name: &str) -> AdapterDescriptor {
    AdapterDescriptor::new(id, name, InterfaceType::Ethernet).with_ipv4_index(Some(4))
}

fn transient() -> FetchError {
    FetchError::transient("The pipe has been ended")
}

type PassiveGroup<P> = NetworkGroup<Arc<MockFetcher>, P, PassiveHardware>;

fn group<P: PhysicalPolicy>(
    fetcher: &Arc<MockFetcher>,
    policy: P,
    physical_only: bool,
) -> PassiveGroup<P> {
    NetworkGroup::new(
        SnapshotProvider::new(Arc::clone(fetcher), policy),
        Arc::new(PassiveFactory) as Arc<dyn HardwareFactory<Hardware = PassiveHardware>>,
        Arc::new(MemorySettings::new()),
        physical_only,
    )
}

fn ids<H: AdapterHardware>(set: &AdapterSet<H>) -> Vec<String> {
    set.ids().map(ToString::to_string).collect()
}

#[test]
fn construction_performs_initial_refresh() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![
        ethernet("A", "Ethernet"),
        AdapterDescriptor::new("L", "Loopback Pseudo-Interface 1", InterfaceType::Loopback),
    ])]));

    let group = group(&fetcher, PolicyChain::new(), false);

    assert_eq!(ids(&group.adapters()), vec!["A"]);
    assert!(!group.physical_only());
}

#[test]
fn refresh_applies_delta() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![ethernet("A", "Ethernet")])]));
    let group = group(&fetcher, PolicyChain::new(), false);

    fetcher.push(Ok(vec![ethernet("A", "Ethernet"), ethernet("B", "Wi-Fi")]));
    let report = group.refresh().unwrap();
    assert_eq!(report.added.len(), 1);
    assert!(report.removed.is_empty());

    fetcher.push(Ok(vec![ethernet("B", "Wi-Fi")]));
    let report = group.refresh().unwrap();
    assert!(report.added.is_empty());
    assert_eq!(report.removed[0].id().as_str(), "A");
    assert_eq!(ids(&group.adapters()), vec!["B"]);
}

#[test]
fn exhausted_retries_leave_state_untouched() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![ethernet("A", "Ethernet")])]));
    let group = group(&fetcher, PolicyChain::new(), false);
    let version = group.registry().version();

    for _ in 0..MAX_ATTEMPTS {
        fetcher.push(Err(transient()));
    }
    let report = group.refresh().unwrap();

    assert!(report.skipped);
    assert!(report.is_empty());
    assert_eq!(group.registry().version(), version);
    assert_eq!(ids(&group.adapters()), vec!["A"]);
}

#[test]
fn non_transient_error_is_returned_and_state_kept() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![ethernet("A", "Ethernet")])]));
    let group = group(&fetcher, PolicyChain::new(), false);

    fetcher.push(Err(FetchError::PermissionDenied {
        context: "access denied".to_string(),
    }));

    assert!(group.refresh().is_err());
    assert_eq!(ids(&group.adapters()), vec!["A"]);
}

#[test]
fn failed_initial_refresh_starts_empty() {
    let fetcher = Arc::new(MockFetcher::new(vec![Err(FetchError::Platform {
        message: "unsupported".to_string(),
    })]));

    let group = group(&fetcher, PolicyChain::new(), false);

    assert!(group.adapters().is_empty());
}

#[test]
fn try_new_surfaces_initial_error() {
    let fetcher = Arc::new(MockFetcher::new(vec![Err(FetchError::Platform {
        message: "unsupported".to_string(),
    })]));

    let result = NetworkGroup::try_new(
        SnapshotProvider::new(Arc::clone(&fetcher), PolicyChain::new()),
        Arc::new(PassiveFactory) as Arc<dyn HardwareFactory<Hardware = PassiveHardware>>,
        Arc::new(MemorySettings::new()),
        false,
        Vec::new(),
    );

    assert!(matches!(result, Err(FetchError::Platform { .. })));
}

#[test]
fn observers_see_initial_additions() {
    struct Counter(Mutex<usize>);

    impl AdapterObserver<PassiveHardware> for Counter {
        fn adapter_added(&self, _adapter: &crate::registry::TrackedAdapter<PassiveHardware>) {
            *self.0.lock().unwrap() += 1;
        }

        fn adapter_removed(&self, _adapter: &crate::registry::TrackedAdapter<PassiveHardware>) {}
    }

    let counter = Arc::new(Counter(Mutex::new(0)));
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![
        ethernet("A", "Ethernet"),
        ethernet("B", "Wi-Fi"),
    ])]));

    let _group = NetworkGroup::with_observers(
        SnapshotProvider::new(Arc::clone(&fetcher), PolicyChain::new()),
        Arc::new(PassiveFactory) as Arc<dyn HardwareFactory<Hardware = PassiveHardware>>,
        Arc::new(MemorySettings::new()),
        false,
        vec![Arc::clone(&counter) as Arc<dyn AdapterObserver<PassiveHardware>>],
    );

    assert_eq!(*counter.0.lock().unwrap(), 2);
}

#[test]
fn physical_only_excludes_unbound_ethernet() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![
        ethernet("A", "Ethernet"),
        AdapterDescriptor::new(
            "F",
            "Ethernet-WFP Native MAC Layer LightWeight Filter-0000",
            InterfaceType::Ethernet,
        ),
    ])]));

    let group = group(&fetcher, BindingPolicy::new(), true);

    assert_eq!(ids(&group.adapters()), vec!["A"]);
    assert!(group.physical_only());
}

#[test]
fn report_lists_adapters() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![
        ethernet("A", "Ethernet").with_description("Intel(R) Ethernet Connection I219-V"),
        ethernet("B", "Wi-Fi").with_status(OperStatus::Down),
    ])]));
    let group = group(&fetcher, PolicyChain::new(), false);

    let report = group.report();

    assert!(report.starts_with("Network adapters: 2 tracked (all eligible, policy chain)"));
    assert!(report.contains("Intel(R) Ethernet Connection I219-V\n  Id:     A"));
    // No description falls back to the name.
    assert!(report.contains("\nWi-Fi\n  Id:     B"));
    assert!(report.contains("Status: Down"));
}

#[test]
fn report_shows_sensor_values() {
    struct MeteredHardware;

    impl AdapterHardware for MeteredHardware {
        fn sensors(&self) -> Vec<Sensor> {
            vec![
                Sensor::new("Upload Speed", Some(1024.0), "B/s"),
                Sensor::new("Download Speed", None, "B/s"),
            ]
        }

        fn close(&self) {}
    }

    struct MeteredFactory;

    impl HardwareFactory for MeteredFactory {
        type Hardware = MeteredHardware;

        fn create(
            &self,
            _descriptor: &AdapterDescriptor,
            _settings: Arc<dyn SettingsStore>,
        ) -> MeteredHardware {
            MeteredHardware
        }
    }

    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![ethernet("A", "Ethernet")])]));
    let group = NetworkGroup::new(
        SnapshotProvider::new(Arc::clone(&fetcher), PolicyChain::new()),
        Arc::new(MeteredFactory) as Arc<dyn HardwareFactory<Hardware = MeteredHardware>>,
        Arc::new(MemorySettings::new()),
        false,
    );

    let report = group.report();

    assert!(report.contains("  Upload Speed: 1024 B/s"));
    assert!(report.contains("  Download Speed: -"));
}

#[test]
fn close_releases_everything() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![
        ethernet("A", "Ethernet"),
        ethernet("B", "Wi-Fi"),
    ])]));
    let group = group(&fetcher, PolicyChain::new(), false);

    assert_eq!(group.close(), 2);
    assert!(group.adapters().is_empty());
    assert!(group.registry().get(&AdapterId::new("A")).is_none());
}

#[test]
fn refresh_target_maps_fetch_errors() {
    let fetcher = Arc::new(MockFetcher::new(vec![Ok(vec![])]));
    let group = group(&fetcher, PolicyChain::new(), false);
    fetcher.push(Err(FetchError::Platform {
        message: "gone".to_string(),
    }));

    let result = RefreshTarget::refresh(&group);

    assert!(matches!(result, Err(MonitorError::Fetch(_))));
}
