//! Tests for the adapter registry.

use super::*;
use crate::hardware::{MemorySettings, Sensor};
use crate::network::InterfaceType;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{OnceLock, Weak, mpsc};
use std::thread;
use std::time::{Duration, Instant};

/// Hardware that counts how often it was closed.
#[derive(Debug)]
struct CountingHardware {
    id: AdapterId,
    closed: Arc<AtomicUsize>,
}

impl AdapterHardware for CountingHardware {
    fn sensors(&self) -> Vec<Sensor> {
        vec![Sensor::new("Upload Speed", None, "B/s")]
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingFactory {
    created: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl CountingFactory {
    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl HardwareFactory for CountingFactory {
    type Hardware = CountingHardware;

    fn create(
        &self,
        descriptor: &AdapterDescriptor,
        _settings: Arc<dyn SettingsStore>,
    ) -> CountingHardware {
        self.created.fetch_add(1, Ordering::SeqCst);
        CountingHardware {
            id: descriptor.id.clone(),
            closed: Arc::clone(&self.closed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Added(String),
    Removed(String),
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl AdapterObserver<CountingHardware> for RecordingObserver {
    fn adapter_added(&self, adapter: &TrackedAdapter<CountingHardware>) {
        self.events.lock().unwrap().push(Event::Added(adapter.id().to_string()));
    }

    fn adapter_removed(&self, adapter: &TrackedAdapter<CountingHardware>) {
        // Hardware must already be closed by the time observers hear about it.
        assert!(adapter.hardware().closed.load(Ordering::SeqCst) > 0);
        self.events.lock().unwrap().push(Event::Removed(adapter.id().to_string()));
    }
}

struct Fixture {
    factory: Arc<CountingFactory>,
    observer: Arc<RecordingObserver>,
    registry: AdapterRegistry<CountingHardware>,
}

fn fixture() -> Fixture {
    let factory = Arc::new(CountingFactory::default());
    let observer = Arc::new(RecordingObserver::default());
    let registry = AdapterRegistry::new(
        Arc::clone(&factory) as Arc<dyn HardwareFactory<Hardware = CountingHardware>>,
        Arc::new(MemorySettings::new()),
    )
    .with_observer(Arc::clone(&observer) as Arc<dyn AdapterObserver<CountingHardware>>);
    Fixture {
        factory,
        observer,
        registry,
    }
}

fn nic(id: &str) -> AdapterDescriptor {
    AdapterDescriptor::new(id, format!("Ethernet {id}"), InterfaceType::Ethernet)
        .with_ipv4_index(Some(1))
}

fn snapshot(ids: &[&str]) -> Option<Vec<AdapterDescriptor>> {
    Some(ids.iter().map(|id| nic(id)).collect())
}

fn tracked_ids(registry: &AdapterRegistry<CountingHardware>) -> Vec<String> {
    registry.adapters().ids().map(ToString::to_string).collect()
}

fn added(ids: &[&str]) -> Vec<Event> {
    ids.iter().map(|id| Event::Added((*id).to_string())).collect()
}

mod reconcile {
    use super::*;

    #[test]
    fn initial_snapshot_adds_everything() {
        let f = fixture();

        let report = f.registry.reconcile(snapshot(&["A", "B"]));

        assert_eq!(report.added.len(), 2);
        assert!(report.removed.is_empty());
        assert!(!report.skipped);
        assert_eq!(tracked_ids(&f.registry), vec!["A", "B"]);
        assert_eq!(f.registry.version(), 1);
        assert_eq!(f.observer.take(), added(&["A", "B"]));
    }

    #[test]
    fn new_adapter_appears() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A"]));
        f.observer.take();

        let report = f.registry.reconcile(snapshot(&["A", "B"]));

        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].id().as_str(), "B");
        assert!(report.removed.is_empty());
        assert_eq!(f.observer.take(), added(&["B"]));
    }

    #[test]
    fn missing_adapter_is_removed_and_closed() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A", "B"]));
        f.observer.take();

        let report = f.registry.reconcile(snapshot(&["B"]));

        assert!(report.added.is_empty());
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].id().as_str(), "A");
        assert_eq!(f.factory.closed(), 1);
        assert_eq!(tracked_ids(&f.registry), vec!["B"]);
        assert_eq!(f.observer.take(), vec![Event::Removed("A".to_string())]);
    }

    #[test]
    fn tracked_ids_equal_snapshot_ids() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A", "B", "C"]));
        f.registry.reconcile(snapshot(&["C", "D"]));

        let mut ids = tracked_ids(&f.registry);
        ids.sort();

        assert_eq!(ids, vec!["C", "D"]);
    }

    #[test]
    fn removals_are_notified_before_additions() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A"]));
        f.observer.take();

        f.registry.reconcile(snapshot(&["B"]));

        assert_eq!(
            f.observer.take(),
            vec![Event::Removed("A".to_string()), Event::Added("B".to_string())]
        );
    }

    #[test]
    fn id_change_is_remove_plus_add() {
        let f = fixture();
        f.registry.reconcile(Some(vec![AdapterDescriptor::new(
            "old",
            "Ethernet",
            InterfaceType::Ethernet,
        )]));
        f.observer.take();

        f.registry.reconcile(Some(vec![AdapterDescriptor::new(
            "new",
            "Ethernet",
            InterfaceType::Ethernet,
        )]));

        assert_eq!(f.observer.take().len(), 2);
        assert_eq!(f.factory.created(), 2);
    }

    #[test]
    fn duplicate_ids_collapse_to_first() {
        let f = fixture();
        let first = nic("A").with_description("first");
        let second = nic("A").with_description("second");

        let report = f.registry.reconcile(Some(vec![first, second]));

        assert_eq!(report.added.len(), 1);
        assert_eq!(f.registry.len(), 1);
        let tracked = f.registry.get(&AdapterId::new("A")).unwrap();
        assert_eq!(tracked.descriptor().description, "first");
    }

    #[test]
    fn empty_snapshot_removes_everything() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A", "B"]));

        let report = f.registry.reconcile(Some(vec![]));

        assert_eq!(report.removed.len(), 2);
        assert!(f.registry.is_empty());
        assert_eq!(f.factory.closed(), 2);
    }
}

mod stability {
    use super::*;

    #[test]
    fn same_snapshot_is_idempotent() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A", "B"]));
        f.observer.take();
        let version = f.registry.version();

        let report = f.registry.reconcile(snapshot(&["A", "B"]));

        assert!(report.is_empty());
        assert!(f.observer.take().is_empty());
        assert_eq!(f.registry.version(), version);
        assert_eq!(f.factory.created(), 2);
    }

    #[test]
    fn unchanged_adapters_keep_their_hardware() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A", "B"]));
        let before = f.registry.get(&AdapterId::new("A")).unwrap();

        f.registry.reconcile(snapshot(&["A", "C"]));
        let after = f.registry.get(&AdapterId::new("A")).unwrap();

        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.hardware().id.as_str(), "A");
    }

    #[test]
    fn none_leaves_state_untouched() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A"]));
        f.observer.take();
        let before = f.registry.adapters();

        let report = f.registry.reconcile(None);

        assert!(report.skipped);
        assert!(report.is_empty());
        assert!(Arc::ptr_eq(&before, &f.registry.adapters()));
        assert!(f.observer.take().is_empty());
        assert_eq!(f.factory.closed(), 0);
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A"]));
        let held = f.registry.adapters();

        f.registry.reconcile(snapshot(&["B"]));

        assert!(held.contains(&AdapterId::new("A")));
        assert!(!held.contains(&AdapterId::new("B")));
        assert_eq!(held.version() + 1, f.registry.version());
    }
}

mod teardown {
    use super::*;

    #[test]
    fn clear_closes_and_notifies() {
        let f = fixture();
        f.registry.reconcile(snapshot(&["A", "B"]));
        f.observer.take();

        assert_eq!(f.registry.clear(), 2);

        assert!(f.registry.is_empty());
        assert_eq!(f.factory.closed(), 2);
        assert_eq!(
            f.observer.take(),
            vec![Event::Removed("A".to_string()), Event::Removed("B".to_string())]
        );
    }

    #[test]
    fn clear_on_empty_registry_is_noop() {
        let f = fixture();
        assert_eq!(f.registry.clear(), 0);
        assert_eq!(f.registry.version(), 0);
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn concurrent_reconciles_never_duplicate() {
        let f = fixture();
        let registry = Arc::new(f.registry);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for round in 0..50 {
                        let ids: &[&str] = if (i + round) % 2 == 0 {
                            &["A", "B"]
                        } else {
                            &["B", "C"]
                        };
                        registry.reconcile(snapshot(ids));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let set = registry.adapters();
        let mut ids: Vec<_> = set.ids().cloned().collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        // Every constructed adapter is either still tracked or was closed.
        assert_eq!(f.factory.created(), f.factory.closed() + total);
    }

    /// Observer that reads the registry from inside its callback.
    struct ReentrantObserver {
        registry: OnceLock<Weak<AdapterRegistry<CountingHardware>>>,
        seen_len: AtomicUsize,
    }

    impl AdapterObserver<CountingHardware> for ReentrantObserver {
        fn adapter_added(&self, _adapter: &TrackedAdapter<CountingHardware>) {
            if let Some(registry) = self.registry.get().and_then(Weak::upgrade) {
                self.seen_len.store(registry.len(), Ordering::SeqCst);
            }
        }

        fn adapter_removed(&self, _adapter: &TrackedAdapter<CountingHardware>) {}
    }

    #[test]
    fn observers_may_call_back_into_registry() {
        let observer = Arc::new(ReentrantObserver {
            registry: OnceLock::new(),
            seen_len: AtomicUsize::new(0),
        });
        let registry = Arc::new(
            AdapterRegistry::new(
                Arc::new(CountingFactory::default())
                    as Arc<dyn HardwareFactory<Hardware = CountingHardware>>,
                Arc::new(MemorySettings::new()),
            )
            .with_observer(Arc::clone(&observer) as Arc<dyn AdapterObserver<CountingHardware>>),
        );
        observer.registry.set(Arc::downgrade(&registry)).unwrap();

        registry.reconcile(snapshot(&["A", "B"]));

        assert_eq!(observer.seen_len.load(Ordering::SeqCst), 2);
    }

    /// Records events, blocking inside the first removal of `R` until released.
    struct GatedObserver {
        entered: Mutex<mpsc::Sender<()>>,
        gate: Mutex<mpsc::Receiver<()>>,
        events: Mutex<Vec<Event>>,
    }

    impl AdapterObserver<CountingHardware> for GatedObserver {
        fn adapter_added(&self, adapter: &TrackedAdapter<CountingHardware>) {
            self.events.lock().unwrap().push(Event::Added(adapter.id().to_string()));
        }

        fn adapter_removed(&self, adapter: &TrackedAdapter<CountingHardware>) {
            if adapter.id().as_str() == "R" {
                self.entered.lock().unwrap().send(()).unwrap();
                self.gate.lock().unwrap().recv().unwrap();
            }
            self.events.lock().unwrap().push(Event::Removed(adapter.id().to_string()));
        }
    }

    #[test]
    fn overlapping_passes_notify_in_publish_order() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();
        let observer = Arc::new(GatedObserver {
            entered: Mutex::new(entered_tx),
            gate: Mutex::new(gate_rx),
            events: Mutex::new(Vec::new()),
        });
        let factory: Arc<dyn HardwareFactory<Hardware = CountingHardware>> =
            Arc::new(CountingFactory::default());
        let registry = Arc::new(
            AdapterRegistry::new(factory, Arc::new(MemorySettings::new()))
                .with_observer(
                    Arc::clone(&observer) as Arc<dyn AdapterObserver<CountingHardware>>
                ),
        );
        registry.reconcile(snapshot(&["R"]));
        observer.events.lock().unwrap().clear();

        // First pass swaps R for X and stalls while announcing R's removal.
        let first = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.reconcile(snapshot(&["X"])))
        };
        entered_rx.recv().unwrap();

        // Second pass removes X and publishes before the first pass finishes.
        let second = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.reconcile(snapshot(&[])))
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        while !registry.is_empty() {
            assert!(Instant::now() < deadline, "second pass never published");
            thread::yield_now();
        }

        gate_tx.send(()).unwrap();
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                Event::Removed("R".to_string()),
                Event::Added("X".to_string()),
                Event::Removed("X".to_string()),
            ]
        );
        assert!(registry.is_empty());
    }
}
