//! Engine lifecycle coverage.
//!
//! The engine is process-wide state, so the whole lifecycle lives in one
//! test; parallel test threads would otherwise observe each other's
//! initialize/teardown calls.

use veriso_accel::engine::{compute_closure, initialize, is_initialized, teardown, AccelError};

#[test]
fn engine_lifecycle() {
    // loads before initialize must fail loudly
    let mut single = [0u8; 1];
    assert_eq!(
        compute_closure(&mut single, 1, true),
        Err(AccelError::NotInitialized),
    );
    assert!(!is_initialized());

    initialize();
    assert!(is_initialized());
    // idempotent
    initialize();
    assert!(is_initialized());

    // closure of a 3-node chain
    let mut chain = vec![
        0, 1, 0, //
        0, 0, 1, //
        0, 0, 0,
    ];
    compute_closure(&mut chain, 3, true).expect("engine is up");
    assert_eq!(
        chain,
        vec![
            0, 1, 1, //
            0, 0, 1, //
            0, 0, 0,
        ],
    );

    // extending the chain with the closing edge reuses the cached closure
    let mut cycle = vec![
        0, 1, 0, //
        0, 0, 1, //
        1, 0, 0,
    ];
    compute_closure(&mut cycle, 3, false).expect("engine is up");
    assert!(cycle.iter().all(|&cell| cell == 1));

    // a stale reuse hint must not corrupt the result: this graph is not a
    // superset of the cached one, so the hint gets ignored
    let mut unrelated = vec![
        0, 0, //
        1, 0,
    ];
    compute_closure(&mut unrelated, 2, false).expect("engine is up");
    assert_eq!(
        unrelated,
        vec![
            0, 0, //
            1, 0,
        ],
    );

    // buffer size must match the declared dimension
    assert_eq!(
        compute_closure(&mut [0u8; 3], 2, true),
        Err(AccelError::BufferSizeMismatch {
            expected: 4,
            found: 3,
        }),
    );

    // concurrent callers serialize on the engine and each get an exact
    // closure, reuse hints included
    std::thread::scope(|scope| {
        for size in [4usize, 6, 8] {
            scope.spawn(move || {
                for round in 0..20 {
                    let mut matrix = vec![0u8; size * size];
                    for i in 0..size - 1 {
                        matrix[i * size + i + 1] = 1;
                    }
                    compute_closure(&mut matrix, size, round % 2 == 0).expect("engine is up");
                    for i in 0..size {
                        for j in 0..size {
                            assert_eq!(
                                matrix[i * size + j],
                                u8::from(i < j),
                                "chain closure of size {size} is the strict order",
                            );
                        }
                    }
                }
            });
        }
    });

    teardown();
    assert!(!is_initialized());
    assert_eq!(
        compute_closure(&mut [0u8; 1], 1, true),
        Err(AccelError::NotInitialized),
    );
    // teardown of a dead engine is a no-op
    teardown();

    // the engine comes back up after teardown
    initialize();
    let mut pair = vec![
        0, 1, //
        0, 0,
    ];
    compute_closure(&mut pair, 2, true).expect("engine is back up");
    assert_eq!(
        pair,
        vec![
            0, 1, //
            0, 0,
        ],
    );
    teardown();
}
