//! Risk table properties: full participant coverage, row-order invariance,
//! exact threshold labelling and the single-participant degenerate case.

use std::collections::{HashMap, HashSet};

use callnet_analytics::graph::EdgeMerge;
use callnet_analytics::metrics::PageRankConfig;
use callnet_analytics::score::{RiskConfig, RiskLabel, RiskTable, analyze_risk, quantile};
use callnet_core::{CallTable, parse_calls};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Row = (u8, u8, bool);

fn table(rows: &[Row]) -> CallTable {
    let mut csv = String::from("Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp\n");
    for (caller, receiver, outgoing) in rows {
        let kind = if *outgoing { "Outgoing" } else { "Incoming" };
        csv.push_str(&format!("N{caller},N{receiver},{kind},60,Delhi,2024-01-05 19:30:00\n"));
    }
    parse_calls(csv.as_bytes()).expect("valid csv")
}

fn risk(rows: &[Row]) -> RiskTable {
    analyze_risk(
        &table(rows),
        EdgeMerge::LastWrite,
        &PageRankConfig::default(),
        &RiskConfig::default(),
    )
    .expect("risk table")
}

fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((0u8..10, 0u8..10, any::<bool>()), 1..40)
}

// ---------------------------------------------------------------------------
// Known cases
// ---------------------------------------------------------------------------

#[test]
fn single_participant_scores_zero_without_failing() {
    let t = risk(&[(1, 1, true)]);
    assert_eq!(t.len(), 1);
    let row = &t.rows[0];
    assert_eq!(row.node, "N1");
    assert!(row.out_degree.abs() < f64::EPSILON);
    assert!(row.betweenness.abs() < f64::EPSILON);
    assert!(row.pagerank.abs() < f64::EPSILON);
    assert!(row.risk_score.abs() < f64::EPSILON);
    // The 95th percentile of [0.0] is 0.0, and 0.0 >= 0.0.
    assert_eq!(row.risk_label, RiskLabel::HighRisk);
}

#[test]
fn broker_outranks_leaves() {
    // N0 calls N1 and N2; N3 calls N0: N0 relays and fans out.
    let t = risk(&[(0, 1, true), (0, 2, true), (3, 0, true)]);
    assert_eq!(t.rows[0].node, "N0");
    assert!(t.rows[0].out_degree > 0.99);
    assert!(t.rows[0].betweenness > 0.99);
    assert_eq!(t.rows[0].risk_label, RiskLabel::HighRisk);
    assert_eq!(t.high_risk().count(), 1);
}

#[test]
fn rows_sorted_descending() {
    let t = risk(&[(0, 1, true), (1, 2, true), (2, 3, false), (4, 0, true)]);
    for pair in t.rows.windows(2) {
        assert!(pair[0].risk_score >= pair[1].risk_score);
    }
}

#[test]
fn empty_table_gives_empty_risk_table() {
    let t = analyze_risk(
        &table(&[]),
        EdgeMerge::LastWrite,
        &PageRankConfig::default(),
        &RiskConfig::default(),
    )
    .expect("risk table");
    assert!(t.is_empty());
    assert!(t.threshold.is_none());
}

#[test]
fn reversed_rows_keep_scores_and_labels() {
    let rows: Vec<Row> = [(11, 6), (0, 6), (10, 5), (1, 4), (0, 11), (3, 1), (6, 11)]
        .into_iter()
        .map(|(c, r)| (c, r, true))
        .collect();
    let mut reversed = rows.clone();
    reversed.reverse();

    let a = risk(&rows);
    let b = risk(&reversed);
    assert_eq!(a, b);
}

fn labels(t: &RiskTable) -> HashMap<&str, (u64, RiskLabel)> {
    t.rows
        .iter()
        .map(|r| (r.node.as_str(), (r.risk_score.to_bits(), r.risk_label)))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn every_participant_scored_once(rows in arb_rows()) {
        let t = risk(&rows);
        let expected: HashSet<String> = rows
            .iter()
            .flat_map(|(c, r, _)| [format!("N{c}"), format!("N{r}")])
            .collect();
        let seen: HashSet<String> = t.rows.iter().map(|r| r.node.clone()).collect();
        prop_assert_eq!(t.len(), expected.len());
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn score_is_invariant_to_row_order(
        (rows, shuffled) in arb_rows().prop_flat_map(|rows| {
            let copy = rows.clone();
            (Just(rows), Just(copy).prop_shuffle())
        })
    ) {
        let a = risk(&rows);
        let b = risk(&shuffled);
        let by_node: HashMap<&str, f64> =
            b.rows.iter().map(|r| (r.node.as_str(), r.risk_score)).collect();
        prop_assert_eq!(a.len(), b.len());
        for row in &a.rows {
            let other = by_node[row.node.as_str()];
            prop_assert!(
                (row.risk_score - other).abs() < 1e-6,
                "{}: {} vs {}", row.node, row.risk_score, other
            );
        }
    }

    #[test]
    fn labels_are_invariant_to_row_order(
        (rows, shuffled) in prop::collection::vec((0u8..12, 0u8..12, any::<bool>()), 1..20)
            .prop_flat_map(|rows| {
                let copy = rows.clone();
                (Just(rows), Just(copy).prop_shuffle())
            })
    ) {
        let a = risk(&rows);
        let b = risk(&shuffled);
        prop_assert_eq!(labels(&a), labels(&b));
        prop_assert_eq!(a.threshold.map(f64::to_bits), b.threshold.map(f64::to_bits));
    }

    #[test]
    fn label_matches_threshold_exactly(rows in arb_rows()) {
        let t = risk(&rows);
        let scores: Vec<f64> = t.rows.iter().map(|r| r.risk_score).collect();
        let threshold = quantile(&scores, 0.95).expect("non-empty");
        prop_assert_eq!(t.threshold, Some(threshold));
        for row in &t.rows {
            let expected = if row.risk_score >= threshold {
                RiskLabel::HighRisk
            } else {
                RiskLabel::Normal
            };
            prop_assert_eq!(row.risk_label, expected);
        }
        prop_assert!(t.high_risk().count() >= 1);
    }

    #[test]
    fn normalized_columns_stay_in_unit_range(rows in arb_rows()) {
        let t = risk(&rows);
        for row in &t.rows {
            for v in [row.out_degree, row.betweenness, row.pagerank, row.risk_score] {
                prop_assert!((0.0..=1.0 + 1e-12).contains(&v), "{} out of range", v);
            }
        }
    }
}
