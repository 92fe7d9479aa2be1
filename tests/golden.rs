//! Golden tests for the miner.
//!
//! These tests pin down determinism and the observable contract of the
//! session facade on small hand-built datasets.

mod common;

use std::sync::Arc;

use bbrc_miner::{
    canonical_hash_hex, CompoundId, CompoundStore, Direction, MineError, Miner, MinerError,
    MiningPolicy, MiningResult, MiningSession, PatternRole, VertexLabel,
};

use common::{mol, store_of};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Ethanol-like C-C-O (active) and a C(-O)-N fragment (inactive).
fn two_compound_miner() -> Miner {
    let mut miner = Miner::new();
    miner.add_compound(1, &mol(&[6, 6, 8], &[(0, 1, 1), (1, 2, 1)])).unwrap();
    miner.add_compound(2, &mol(&[6, 8, 7], &[(0, 1, 1), (0, 2, 1)])).unwrap();
    miner.add_activity(1, 1.0).unwrap();
    miner.add_activity(2, 0.0).unwrap();
    miner
}

/// A small acid/amide series with mixed activities.
fn series_session() -> Arc<MiningSession<bbrc_miner::InMemoryCompoundStore>> {
    let store = store_of(&[
        (mol(&[6, 6, 8, 8], &[(0, 1, 1), (1, 2, 2), (1, 3, 1)]), Some(1.0)),
        (mol(&[6, 6, 8, 8], &[(0, 1, 1), (1, 2, 2), (1, 3, 1)]), Some(1.0)),
        (mol(&[6, 6, 8, 7], &[(0, 1, 1), (1, 2, 2), (1, 3, 1)]), Some(0.0)),
        (mol(&[6, 6, 7], &[(0, 1, 1), (1, 2, 1)]), Some(0.0)),
        (mol(&[6, 8], &[(0, 1, 1)]), Some(1.0)),
    ]);
    Arc::new(MiningSession::new(Arc::new(store)))
}

fn mine_every_root(miner: &mut Miner) -> Vec<MiningResult> {
    let mut results = Vec::new();
    for root in 0..miner.count_root_nodes() {
        results.extend(miner.mine_root(root).unwrap());
    }
    results
}

// ─────────────────────────────────────────────────────────────────────────────
// SCENARIO TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_two_compound_scenario() {
    let mut miner = two_compound_miner();
    miner.set_chisq_sig(0.0).unwrap();
    miner.set_refine_singles(true);
    miner.set_console_out(false);

    assert_eq!(miner.count_compounds(), 2);
    assert_eq!(miner.count_root_nodes(), 3);

    let results = mine_every_root(&mut miner);
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| (1..=2).contains(&r.support)));

    // C-O is the only edge shared by both compounds.
    let common: Vec<_> = results.iter().filter(|r| r.support == 2).collect();
    assert_eq!(common.len(), 1);
    assert_eq!(common[0].code.edge_count(), 1);
    assert_eq!(common[0].compounds, vec![CompoundId(1), CompoundId(2)]);
    assert_eq!(common[0].code.root(), VertexLabel(6));

    // Every one-edge pattern of either compound is reported.
    let one_edge = results.iter().filter(|r| r.code.edge_count() == 1).count();
    assert_eq!(one_edge, 3);
}

#[test]
fn test_results_carry_their_root() {
    let mut miner = two_compound_miner();
    miner.set_chisq_sig(0.0).unwrap();
    miner.set_refine_singles(true);

    for root in 0..miner.count_root_nodes() {
        for result in miner.mine_root(root).unwrap() {
            assert_eq!(result.root, root);
        }
    }
}

#[test]
fn test_index_out_of_range_leaves_store() {
    let mut miner = two_compound_miner();
    let count = miner.count_root_nodes();

    let err = miner.mine_root(count).unwrap_err();
    assert!(matches!(
        err,
        MinerError::Mine(MineError::IndexOutOfRange { index, count: c }) if index == count && c == count
    ));
    assert_eq!(miner.count_compounds(), 2);
    assert_eq!(miner.count_root_nodes(), count);
}

// ─────────────────────────────────────────────────────────────────────────────
// DETERMINISM TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_same_root_same_results_100_runs() {
    let session = series_session();
    let policy = MiningPolicy::default();

    let first = session.mine_root(0, &policy).unwrap();
    let first_hash = canonical_hash_hex(&first).unwrap();

    for run in 1..100 {
        let again = session.mine_root(0, &policy).unwrap();
        assert_eq!(
            canonical_hash_hex(&again).unwrap(),
            first_hash,
            "Results must be deterministic (run {} differs from run 0)",
            run
        );
    }
}

#[test]
fn test_policy_change_changes_params_hash() {
    let policy1 = MiningPolicy::default();
    let mut policy2 = MiningPolicy::default();
    policy2.set_min_frequency(2).unwrap();

    assert_ne!(policy1.params_hash().unwrap(), policy2.params_hash().unwrap());
    assert_eq!(
        policy1.params_hash().unwrap(),
        MiningPolicy::default().params_hash().unwrap()
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// SIGNIFICANCE TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unlabelled_compounds_count_toward_support_only() {
    let store = store_of(&[
        (mol(&[6, 8], &[(0, 1, 1)]), Some(1.0)),
        (mol(&[6, 8], &[(0, 1, 1)]), Some(0.0)),
        (mol(&[6, 8], &[(0, 1, 1)]), None),
        (mol(&[7, 8], &[(0, 1, 1)]), Some(0.0)),
    ]);
    let session = MiningSession::new(Arc::new(store));
    let mut policy = MiningPolicy::default();
    policy.set_significance_level(0.0).unwrap();

    let results = session.mine_root(0, &policy).unwrap();
    let co = results.iter().find(|r| r.code.edge_count() == 1).unwrap();
    assert_eq!(co.support, 3);
    let assessment = co.assessment.as_ref().unwrap();
    assert_eq!(assessment.labelled, 2);
    assert_eq!((assessment.active, assessment.inactive), (1, 1));
}

#[test]
fn test_significant_pattern_direction() {
    let session = series_session();
    let mut policy = MiningPolicy::default();
    policy.set_significance_level(0.0).unwrap();

    let results = session.mine_root(0, &policy).unwrap();
    // The C-O single bond occurs in the three actives only.
    let co = results
        .iter()
        .find(|r| r.code.edge_count() == 1 && r.support == 3 && r.compounds.contains(&CompoundId(5)))
        .unwrap();
    assert_eq!(co.compounds, vec![CompoundId(1), CompoundId(2), CompoundId(5)]);
    let assessment = co.assessment.as_ref().unwrap();
    assert_eq!(assessment.direction, Direction::Activating);
    assert!(assessment.statistic > 0.0);
    assert!(assessment.p_value < 1.0);
}

#[test]
fn test_strict_level_reports_less() {
    let session = series_session();
    let mut loose = MiningPolicy::default();
    loose.set_significance_level(0.0).unwrap();
    let strict = MiningPolicy::default();

    let all_loose: usize = (0..session.count_root_nodes())
        .map(|r| session.mine_root(r, &loose).unwrap().len())
        .sum();
    let all_strict: Vec<MiningResult> = (0..session.count_root_nodes())
        .flat_map(|r| session.mine_root(r, &strict).unwrap())
        .collect();

    assert!(all_strict.len() <= all_loose);
    assert!(all_strict.iter().all(|r| r.is_significant()));
}

// ─────────────────────────────────────────────────────────────────────────────
// BOUNDARY FILTER TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_backbone_emits_boundary_only() {
    let session = series_session();
    let mut policy = MiningPolicy::default();
    policy.set_significance_level(0.0).unwrap();

    for root in 0..session.count_root_nodes() {
        for result in session.mine_root(root, &policy).unwrap() {
            assert!(result.boundary);
            assert_ne!(result.role, PatternRole::Interior);
            assert_eq!(result.role == PatternRole::Closed, result.closed);
        }
    }
}

#[test]
fn test_closed_patterns_have_no_equal_support_superpattern() {
    let session = series_session();
    let mut policy = MiningPolicy::unconstrained();
    policy.set_refine_singles(true);

    let results: Vec<MiningResult> = (0..session.count_root_nodes())
        .flat_map(|r| session.mine_root(r, &policy).unwrap())
        .collect();

    for closed in results.iter().filter(|r| r.closed) {
        let graph = closed.code.to_graph();
        for other in &results {
            if other.code.edge_count() == closed.code.edge_count() + 1
                && bbrc_miner::matcher::is_subgraph(&graph, &other.code.to_graph())
            {
                assert!(
                    other.support < closed.support,
                    "{} is closed but {} keeps its support",
                    closed.code,
                    other.code
                );
            }
        }
    }
}

#[test]
fn test_backbone_off_reports_interior() {
    // C-N-O sits between the entry C-N and the closed C-N-O-S, all with
    // the same two supporting compounds.
    let store = store_of(&[
        (mol(&[6, 7, 8, 16], &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]), Some(1.0)),
        (mol(&[6, 7, 8, 16], &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]), Some(1.0)),
        (mol(&[9, 9], &[(0, 1, 1)]), Some(0.0)),
    ]);
    let session = MiningSession::new(Arc::new(store));
    let mut policy = MiningPolicy::default();
    policy.set_significance_level(0.0).unwrap();
    let with_backbone: usize = (0..session.count_root_nodes())
        .map(|r| session.mine_root(r, &policy).unwrap().len())
        .sum();

    policy.set_backbone(false);
    let without: Vec<MiningResult> = (0..session.count_root_nodes())
        .flat_map(|r| session.mine_root(r, &policy).unwrap())
        .collect();

    assert!(without.len() > with_backbone);
    let interior: Vec<_> = without.iter().filter(|r| r.role == PatternRole::Interior).collect();
    assert!(!interior.is_empty());
    assert!(interior.iter().all(|r| !r.boundary && r.support == 2));
}

// ─────────────────────────────────────────────────────────────────────────────
// REFINE SINGLES TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_refine_singles_off_never_extends_singletons() {
    let session = series_session();
    let policy = MiningPolicy::unconstrained();
    assert!(!policy.refine_singles);

    for root in 0..session.count_root_nodes() {
        for result in session.mine_root(root, &policy).unwrap() {
            if result.code.edge_count() < 2 {
                continue;
            }
            let parent = result.code.parent().unwrap();
            let parent_support = session.store().support_of(&parent.to_graph()).len();
            assert!(
                parent_support > 1,
                "{} was reached through a support-1 parent",
                result.code
            );
        }
    }
}

#[test]
fn test_refine_singles_on_reaches_unique_fragments() {
    // N-O-S occurs once and its parent N-O too.
    let store = store_of(&[
        (mol(&[7, 8, 16], &[(0, 1, 1), (1, 2, 1)]), Some(1.0)),
        (mol(&[6, 8], &[(0, 1, 1)]), Some(0.0)),
    ]);
    let session = MiningSession::new(Arc::new(store));
    let mut policy = MiningPolicy::unconstrained();
    let off: usize = (0..session.count_root_nodes())
        .map(|r| session.mine_root(r, &policy).unwrap().len())
        .sum();

    policy.set_refine_singles(true);
    let on: usize = (0..session.count_root_nodes())
        .map(|r| session.mine_root(r, &policy).unwrap().len())
        .sum();

    assert_eq!(off, 3);
    assert_eq!(on, 4);
}
