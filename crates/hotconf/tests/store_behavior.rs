// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end store behaviour: change gating, restores, callback table limits
//! and persistence hooks.

use hotconf::{ConfigStore, Error, Record, DEFAULT_CALLBACK_CAPACITY};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Record)]
struct Settings {
    a: u32,
    b: i32,
    c: bool,
}

const SETTINGS: Settings = Settings {
    a: 10,
    b: -20,
    c: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Record)]
struct Pair {
    first: i32,
    second: f64,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Default, Record)]
struct Wide {
    f00: u8, f01: u8, f02: u8, f03: u8, f04: u8, f05: u8, f06: u8, f07: u8,
    f08: u8, f09: u8, f10: u8, f11: u8, f12: u8, f13: u8, f14: u8, f15: u8,
    f16: u8,
}

type Events = Arc<Mutex<Vec<String>>>;

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

#[test]
fn test_construction_publishes_defaults() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    assert_eq!(store.read_all(), SETTINGS);
    assert_eq!(store.read_field(Settings::A), 10);
    assert_eq!(store.read_field(Settings::B), -20);
    assert!(!store.read_field(Settings::C));
}

#[test]
fn test_field_write_then_read() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let seen = Arc::new(Mutex::new(None));
    {
        let seen = Arc::clone(&seen);
        store
            .on_change(Settings::B, move |b| *seen.lock() = Some(*b))
            .unwrap();
    }

    store.write_field(Settings::B, 777);
    assert_eq!(store.read_field(Settings::B), 777);
    assert_eq!(*seen.lock(), Some(777));
    assert_eq!(store.read_field(Settings::A), 10);
}

#[test]
fn test_whole_write_fires_only_changed_fields() {
    let store = ConfigStore::<Pair>::new(Pair {
        first: 10,
        second: 1.5,
    });
    let events: Events = Arc::default();
    store
        .on_change_with(Pair::FIRST, Arc::clone(&events), |v: &i32, ev: &Events| {
            ev.lock().push(format!("first={v}"));
        })
        .and_then(|s| {
            s.on_change_with(Pair::SECOND, Arc::clone(&events), |v: &f64, ev: &Events| {
                ev.lock().push(format!("second={v}"));
            })
        })
        .unwrap();

    store.write_all(Pair {
        first: 10,
        second: 20.0,
    });
    assert_eq!(*events.lock(), vec!["second=20".to_string()]);
}

#[test]
fn test_equal_write_fires_nothing() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let calls = counter();
    {
        let calls = Arc::clone(&calls);
        store
            .on_change(Settings::A, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    store.write_field(Settings::A, 10);
    store.write_all(SETTINGS);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_signed_zero_is_not_a_change() {
    let store = ConfigStore::<Pair>::new(Pair {
        first: 0,
        second: 0.0,
    });
    let calls = counter();
    {
        let calls = Arc::clone(&calls);
        store
            .on_change(Pair::SECOND, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    store.write_field(Pair::SECOND, -0.0);
    store.write_all(Pair {
        first: 0,
        second: -0.0,
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_restore_is_idempotent() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let mut rng = fastrand::Rng::with_seed(0x5eed);

    for _ in 0..200 {
        match rng.u8(0..3) {
            0 => store.write_field(Settings::A, rng.u32(..)),
            1 => store.write_field(Settings::B, rng.i32(..)),
            _ => store.write_all(Settings {
                a: rng.u32(..),
                b: rng.i32(..),
                c: rng.bool(),
            }),
        }
        if rng.u8(0..10) == 0 {
            store.restore_all();
            assert_eq!(store.read_all(), SETTINGS);
        }
    }

    store.restore_all();
    store.restore_all();
    assert_eq!(store.read_all(), SETTINGS);
}

#[test]
fn test_restore_field_only_touches_that_field() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    store.write_all(Settings {
        a: 1,
        b: 2,
        c: true,
    });
    store.restore_field(Settings::A);
    assert_eq!(
        store.read_all(),
        Settings {
            a: 10,
            b: 2,
            c: true,
        }
    );
}

#[test]
fn test_restore_fires_callbacks_for_reverted_fields() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let calls = counter();
    {
        let calls = Arc::clone(&calls);
        store
            .on_change(Settings::C, move |c| {
                assert!(!*c);
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    store.write_field(Settings::B, 5);
    store.restore_all();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    store
        .on_change(Settings::C, {
            let calls = Arc::clone(&calls);
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();
    store.write_field(Settings::C, true);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    store.restore_field(Settings::C);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_single_subscriber_per_field() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let first = counter();
    let second = counter();
    {
        let first = Arc::clone(&first);
        store
            .on_change(Settings::A, move |_| {
                first.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let second = Arc::clone(&second);
        store
            .on_change(Settings::A, move |_| {
                second.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    store.write_field(Settings::A, 11);
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    assert_eq!(store.callback_count(), 1);
}

#[test]
fn test_unregistered_field_is_silent() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let calls = counter();
    {
        let calls = Arc::clone(&calls);
        store
            .on_change(Settings::B, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    assert!(store.remove_callback(Settings::B));
    assert!(!store.remove_callback(Settings::B));

    store.write_field(Settings::B, 1);
    store.write_all(Settings { b: 2, ..SETTINGS });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.read_field(Settings::B), 2);
}

#[test]
fn test_capacity_limit() {
    let store = ConfigStore::<Wide>::default();
    assert_eq!(store.callback_capacity(), DEFAULT_CALLBACK_CAPACITY);

    #[rustfmt::skip]
    let fields = [
        Wide::F00, Wide::F01, Wide::F02, Wide::F03, Wide::F04, Wide::F05, Wide::F06, Wide::F07,
        Wide::F08, Wide::F09, Wide::F10, Wide::F11, Wide::F12, Wide::F13, Wide::F14, Wide::F15,
    ];
    let calls = counter();
    for field in fields {
        let calls = Arc::clone(&calls);
        store
            .on_change(field, move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let err = store.on_change(Wide::F16, |_| {}).unwrap_err();
    assert_eq!(err, Error::CapacityExceeded { capacity: 16 });
    assert!(!store.has_callback(Wide::F16));

    // Replacing an existing field still works at full capacity
    store.on_change(Wide::F00, |_| {}).unwrap();

    store.write_all(Wide {
        f15: 1,
        f16: 1,
        ..Wide::default()
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.metrics().refused_registrations, 1);
}

#[test]
fn test_custom_capacity() {
    let store = ConfigStore::<Settings, 1>::new(SETTINGS);
    store.on_change(Settings::A, |_| {}).unwrap();
    assert!(matches!(
        store.on_change(Settings::B, |_| {}),
        Err(Error::CapacityExceeded { capacity: 1 })
    ));

    // A removed handler keeps its slot reserved
    assert!(store.remove_callback(Settings::A));
    assert!(store.on_change(Settings::B, |_| {}).is_err());
    store.on_change(Settings::A, |_| {}).unwrap();

    store.clear_callbacks();
    store.on_change(Settings::B, |_| {}).unwrap();
}

#[test]
fn test_reentrant_handler_reads_new_value() {
    let store = Arc::new(ConfigStore::<Settings>::new(SETTINGS));
    let observed = Arc::new(Mutex::new(None));
    {
        let weak = Arc::downgrade(&store);
        let observed = Arc::clone(&observed);
        store
            .on_change(Settings::A, move |a| {
                if let Some(store) = weak.upgrade() {
                    *observed.lock() = Some((*a, store.read_field(Settings::A)));
                }
            })
            .unwrap();
    }

    store.write_field(Settings::A, 42);
    assert_eq!(*observed.lock(), Some((42, 42)));
}

#[test]
fn test_reentrant_handler_registers_callback() {
    let store = Arc::new(ConfigStore::<Settings>::new(SETTINGS));
    {
        let weak = Arc::downgrade(&store);
        store
            .on_change(Settings::C, move |_| {
                if let Some(store) = weak.upgrade() {
                    store.on_change(Settings::B, |_| {}).unwrap();
                }
            })
            .unwrap();
    }

    store.write_field(Settings::C, true);
    assert!(store.has_callback(Settings::B));
}

#[test]
fn test_save_and_load_hooks() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    let disk = Arc::new(Mutex::new(None::<Settings>));

    assert!(!store.save());
    assert!(!store.load());

    {
        let disk = Arc::clone(&disk);
        store.set_save_fn(move |s: &Settings| {
            *disk.lock() = Some(*s);
            true
        });
    }
    {
        let disk = Arc::clone(&disk);
        store.set_load_fn(move |out: &mut Settings| match *disk.lock() {
            Some(saved) => {
                *out = saved;
                true
            }
            None => false,
        });
    }
    assert!(store.has_persistence());

    assert!(!store.load());
    store.write_field(Settings::A, 99);
    assert!(store.save());

    store.restore_all();
    assert_eq!(store.read_field(Settings::A), 10);
    assert!(store.load());
    assert_eq!(store.read_field(Settings::A), 99);

    store.clear_persistence();
    assert!(!store.save());
}

#[test]
fn test_failing_save_hook_reported() {
    let store = ConfigStore::<Settings>::new(SETTINGS);
    store.set_save_fn(|_: &Settings| false);
    assert!(!store.save());
}

#[derive(Debug, Clone, Copy, PartialEq, Record)]
#[repr(C)]
struct Marked {
    marker: std::marker::PhantomData<u8>,
    level: u32,
}

#[test]
fn test_zero_sized_field_does_not_displace_neighbour() {
    let store = ConfigStore::<Marked>::new(Marked {
        marker: std::marker::PhantomData,
        level: 1,
    });
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    store
        .on_change(Marked::LEVEL, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .expect("level")
        .on_change(Marked::MARKER, |_| {})
        .expect("marker");

    assert!(store.has_callback(Marked::LEVEL));
    assert!(store.has_callback(Marked::MARKER));
    assert_eq!(store.callback_count(), 2);

    store.write_field(Marked::LEVEL, 5);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    store.remove_callback(Marked::MARKER);
    store.write_field(Marked::LEVEL, 6);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
