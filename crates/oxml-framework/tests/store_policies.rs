use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use oxml_framework::{ConcurrentTypeStore, LockedTypeStore, TypeKey, TypeStore};

const THREADS: usize = 16;

struct Contended;
struct Unrelated;

/// Releases `THREADS` callers at once on a cold key and returns the values
/// they observed together with the number of `create` invocations.
fn race<S: TypeStore<Arc<String>>>(store: &S) -> (Vec<Arc<String>>, usize) {
    let barrier = Barrier::new(THREADS);
    let calls = AtomicUsize::new(0);

    let results = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    store
                        .get_or_create(TypeKey::of::<Contended>(), |key| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // widen the race window
                            thread::sleep(Duration::from_millis(5));
                            Ok::<_, ()>(Arc::new(key.name().to_owned()))
                        })
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });

    (results, calls.load(Ordering::SeqCst))
}

fn all_identical(values: &[Arc<String>]) -> bool {
    values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1]))
}

#[test]
fn serialized_policy_creates_exactly_once() {
    let store = LockedTypeStore::<Arc<String>>::default();
    let (values, calls) = race(&store);

    assert_eq!(values.len(), THREADS);
    assert!(all_identical(&values));
    assert_eq!(calls, 1);
    assert!(Arc::ptr_eq(
        &store.get(TypeKey::of::<Contended>()).unwrap(),
        &values[0]
    ));
}

#[test]
fn optimistic_policy_converges_on_one_winner() {
    let store = ConcurrentTypeStore::<Arc<String>>::default();
    let (values, calls) = race(&store);

    assert_eq!(values.len(), THREADS);
    assert!(all_identical(&values));
    assert!((1..=THREADS).contains(&calls));
    assert_eq!(store.len(), 1);
    assert!(Arc::ptr_eq(
        &store.get(TypeKey::of::<Contended>()).unwrap(),
        &values[0]
    ));
}

#[test]
fn failed_creation_is_retried_by_the_next_caller() {
    fn check<S: TypeStore<Arc<String>>>() {
        let store = S::default();
        let key = TypeKey::of::<Unrelated>();
        let attempts = AtomicUsize::new(0);
        let create = |_: TypeKey| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("transient")
            } else {
                Ok(Arc::new("ok".to_owned()))
            }
        };

        assert_eq!(store.get_or_create(key, create), Err("transient"));
        assert!(store.get(key).is_none());
        assert_eq!(store.get_or_create(key, create).unwrap().as_str(), "ok");
        assert_eq!(store.get_or_create(key, create).unwrap().as_str(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    check::<LockedTypeStore<Arc<String>>>();
    check::<ConcurrentTypeStore<Arc<String>>>();
}
