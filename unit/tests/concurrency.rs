/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::sync::Barrier;
use std::thread;

use typed_unit::{Distance, Time, Unit, UnitRegistry, Velocity};

const THREADS: usize = 16;

fn init_logger() {
    let _ = simplelog::TestLogger::init(
        simplelog::LevelFilter::Trace,
        simplelog::Config::default(),
    );
}

#[test]
fn concurrent_derivation_yields_one_instance() {
    init_logger();
    let registry = UnitRegistry::new();
    let feet = registry.unit::<Distance>("foot", "ft", 0.3048).unwrap();
    let minutes = registry.unit::<Time>("minute", "min", 60.0).unwrap();
    let barrier = Barrier::new(THREADS);

    let units: Vec<Unit<Velocity<Distance>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    feet.per(&minutes).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(units.iter().all(|u| u.same_instance(&units[0])));
    assert_eq!(registry.derived_count(), 1);
}

#[test]
fn concurrent_base_initialization_yields_one_instance() {
    init_logger();
    let registry = UnitRegistry::new();
    let barrier = Barrier::new(THREADS);

    let units: Vec<Unit<Distance>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let registry = registry.clone();
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    match i % 2 {
                        0 => registry.base_unit::<Distance>(),
                        _ => registry
                            .unit::<Distance>("kilometer", "km", 1000.0)
                            .unwrap()
                            .base_unit(),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(units.iter().all(|u| u.same_instance(&units[0])));
}

#[test]
fn measures_are_shared_across_threads() {
    let registry = UnitRegistry::new();
    let meters = registry.base_unit::<Distance>();
    let seconds = registry.base_unit::<Time>();
    let distance = meters.of(100.0);

    let speeds: Vec<f64> = thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                let distance = &distance;
                let seconds = &seconds;
                s.spawn(move || {
                    distance
                        .divide(&seconds.of(n as f64))
                        .unwrap()
                        .magnitude()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(speeds, vec![100.0, 50.0, 100.0 / 3.0, 25.0]);
    assert_eq!(registry.derived_count(), 1);
}
