use std::collections::HashSet;

use proptest::prelude::*;
use sewkit::{Handle, IdRegistry, ObjectId, ObjectType};

#[derive(Clone, Debug)]
enum Op {
    Acquire,
    AcquireAt(u8),
    Release(u16),
    ReleaseStale(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Acquire),
        1 => any::<u8>().prop_map(Op::AcquireAt),
        2 => any::<u16>().prop_map(Op::Release),
        1 => any::<u16>().prop_map(Op::ReleaseStale),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn live_ids_are_never_handed_out_twice(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let mut reg = IdRegistry::new();
        let mut live: Vec<Handle> = Vec::new();
        let mut released: Vec<Handle> = Vec::new();
        for op in ops {
            match op {
                Op::Acquire | Op::AcquireAt(_) => {
                    let requested = match op {
                        Op::AcquireAt(id) => Some(id as u32),
                        _ => None,
                    };
                    let h = reg.acquire(requested, ObjectType::Line);
                    prop_assert!(h.id() != 0);
                    prop_assert!(live.iter().all(|l| l.id() != h.id()), "id {} handed out while live", h.id());
                    live.push(h);
                }
                Op::Release(idx) => {
                    if live.is_empty() {
                        continue;
                    }
                    let h = live.swap_remove(idx as usize % live.len());
                    prop_assert!(reg.release(h));
                    released.push(h);
                }
                Op::ReleaseStale(idx) => {
                    if released.is_empty() {
                        continue;
                    }
                    let h = released[idx as usize % released.len()];
                    prop_assert!(!reg.release(h));
                }
            }
            prop_assert_eq!(reg.live_count(), live.len());
            for h in &live {
                prop_assert_eq!(reg.resolve(*h), Some(ObjectType::Line));
            }
            for h in &released {
                prop_assert_eq!(reg.resolve(*h), None);
            }
        }
    }
}

#[test]
fn smallest_free_id_is_reused_first() {
    let mut reg = IdRegistry::new();
    let handles: Vec<Handle> = (0..6).map(|_| reg.acquire(None, ObjectType::KeyPoint)).collect();
    assert_eq!(handles.iter().map(Handle::id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    reg.release(handles[4]);
    reg.release(handles[1]);
    assert_eq!(reg.acquire(None, ObjectType::KeyPoint).id(), 2);
    assert_eq!(reg.acquire(None, ObjectType::KeyPoint).id(), 5);
    assert_eq!(reg.acquire(None, ObjectType::KeyPoint).id(), 7);
}

#[test]
fn process_wide_ids_stay_unique_across_threads() {
    let workers: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let mut held: Vec<ObjectId> = (0..50).map(|_| ObjectId::new(ObjectType::KeyPoint)).collect();
                held.retain(|id| id.get() % 3 != 0);
                held.extend((0..50).map(|_| ObjectId::new(ObjectType::Line)));
                held
            })
        })
        .collect();
    let held: Vec<ObjectId> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();
    let unique: HashSet<u32> = held.iter().map(ObjectId::get).collect();
    assert_eq!(unique.len(), held.len());
    assert!(held.iter().all(|id| sewkit::registry::resolve(id.handle()) == Some(id.kind())));
}
