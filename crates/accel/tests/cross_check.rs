//! The matrix oracle must be indistinguishable from the direct-search
//! oracle: same reachability answers, identical cycle reports, identical
//! audit verdicts.
//!
//! Every test initializes the engine (idempotent) and none tears it down,
//! so the tests can run in parallel threads.

use rand::distr::{Distribution, Uniform};
use veriso_accel::{engine, MatrixOracle};
use veriso_core::audit::{AuditOptions, AuditOutcome, Auditor, Isolation};
use veriso_core::{DfsOracle, ReachabilityOracle};
use veriso_testgen::generate_single_history;

fn assert_oracles_agree(node_count: usize, edges: &[(usize, usize)], label: &str) {
    let mut dfs = DfsOracle::default();
    let mut matrix = MatrixOracle::default();
    dfs.load(node_count, edges, true).expect("dfs load");
    matrix.load(node_count, edges, true).expect("matrix load");

    for from in 0..node_count {
        for to in 0..node_count {
            assert_eq!(
                dfs.reachable(from, to),
                matrix.reachable(from, to),
                "backends disagree on {from} -> {to} for '{label}'",
            );
        }
    }
    assert_eq!(
        dfs.find_cycle(),
        matrix.find_cycle(),
        "backends report different cycles for '{label}'",
    );
}

#[test]
fn agree_on_fixed_graphs() {
    engine::initialize();

    assert_oracles_agree(0, &[], "empty");
    assert_oracles_agree(4, &[], "edgeless");
    assert_oracles_agree(4, &[(0, 1), (1, 2), (2, 3)], "chain");
    assert_oracles_agree(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], "ring");
    assert_oracles_agree(3, &[(1, 1)], "self-loop");
    assert_oracles_agree(6, &[(0, 1), (2, 3), (4, 5)], "disconnected pairs");
    assert_oracles_agree(
        5,
        &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4), (4, 1)],
        "diamond with back edge",
    );

    let complete: Vec<(usize, usize)> = (0..5)
        .flat_map(|u| (0..5).filter(move |&v| v != u).map(move |v| (u, v)))
        .collect();
    assert_oracles_agree(5, &complete, "complete digraph");
}

/// Roughly two outgoing edges per node.
fn random_edges(rng: &mut rand::rngs::ThreadRng, node_count: usize) -> Vec<(usize, usize)> {
    let threshold = Uniform::new(0usize, node_count).unwrap();
    let mut edges = Vec::new();
    for from in 0..node_count {
        for to in 0..node_count {
            if threshold.sample(rng) < 2 {
                edges.push((from, to));
            }
        }
    }
    edges
}

#[test]
fn agree_on_random_graphs() {
    engine::initialize();
    let mut rng = rand::rng();

    for trial in 0..50 {
        let node_count = Uniform::new(2usize, 40).unwrap().sample(&mut rng);
        let edges = random_edges(&mut rng, node_count);
        assert_oracles_agree(node_count, &edges, &format!("random trial {trial}"));
    }
}

#[test]
fn agree_on_large_random_graphs() {
    engine::initialize();
    let mut rng = rand::rng();

    // a few hundred nodes spans several bit-packed row words
    for trial in 0..5 {
        let node_count = Uniform::new(150usize, 300).unwrap().sample(&mut rng);
        let edges = random_edges(&mut rng, node_count);
        assert_oracles_agree(node_count, &edges, &format!("large random trial {trial}"));
    }
}

#[test]
fn agree_on_extending_loads() {
    engine::initialize();
    let mut rng = rand::rng();

    for trial in 0..20 {
        let node_count = Uniform::new(4usize, 30).unwrap().sample(&mut rng);
        let index_range = Uniform::new(0usize, node_count).unwrap();

        let mut edges: Vec<(usize, usize)> = (0..node_count)
            .map(|from| (from, index_range.sample(&mut rng)))
            .collect();

        let mut matrix = MatrixOracle::default();
        matrix.load(node_count, &edges, true).expect("matrix load");

        // grow the graph edge by edge, always with the reuse hint
        for _ in 0..5 {
            edges.push((index_range.sample(&mut rng), index_range.sample(&mut rng)));
            matrix
                .load(node_count, &edges, false)
                .expect("matrix reload");

            let mut dfs = DfsOracle::default();
            dfs.load(node_count, &edges, true).expect("dfs load");
            for from in 0..node_count {
                for to in 0..node_count {
                    assert_eq!(
                        dfs.reachable(from, to),
                        matrix.reachable(from, to),
                        "extending load diverged on {from} -> {to} in trial {trial}",
                    );
                }
            }
            assert_eq!(dfs.find_cycle(), matrix.find_cycle());
        }
    }
}

#[test]
fn audits_agree_on_generated_histories() {
    engine::initialize();

    for _ in 0..10 {
        let history = generate_single_history(3, 5, 4, 5);
        for isolation in [Isolation::Serializable, Isolation::SnapshotIsolation] {
            let options = AuditOptions::new(isolation);
            let mut direct = Auditor::new(history.clone(), options).expect("well formed");
            let mut accelerated = Auditor::new(history.clone(), options).expect("well formed");

            let direct_verdict = direct.audit(&mut DfsOracle::default()).expect("audit runs");
            let accelerated_verdict = accelerated
                .audit(&mut MatrixOracle::default())
                .expect("audit runs");
            assert_eq!(
                direct_verdict, accelerated_verdict,
                "backends disagree under {isolation:?}",
            );
        }
    }
}

#[test]
fn audits_agree_on_known_violations() {
    engine::initialize();

    // stale read closing a cycle over two sessions
    let sessions: Vec<veriso_core::history::Session<&'static str, u64>> = vec![
        vec![
            veriso_core::history::Transaction::new(vec![veriso_core::history::Event::write(
                "x", 1,
            )]),
            veriso_core::history::Transaction::new(vec![veriso_core::history::Event::write(
                "x", 2,
            )]),
        ],
        vec![
            veriso_core::history::Transaction::new(vec![veriso_core::history::Event::read(
                "x", 2,
            )]),
            veriso_core::history::Transaction::new(vec![veriso_core::history::Event::read(
                "x", 1,
            )]),
        ],
    ];
    let history = veriso_core::history::History::new(sessions);

    for isolation in [Isolation::Serializable, Isolation::SnapshotIsolation] {
        let options = AuditOptions::new(isolation);
        let mut direct = Auditor::new(history.clone(), options).expect("well formed");
        let mut accelerated = Auditor::new(history.clone(), options).expect("well formed");

        let direct_verdict = direct.audit(&mut DfsOracle::default()).expect("audit runs");
        let accelerated_verdict = accelerated
            .audit(&mut MatrixOracle::default())
            .expect("audit runs");

        assert!(matches!(direct_verdict, AuditOutcome::Violation(_)));
        assert_eq!(direct_verdict, accelerated_verdict);
    }
}
