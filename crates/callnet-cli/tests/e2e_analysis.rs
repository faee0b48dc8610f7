//! End-to-end runs of every analysis subcommand against small CSV fixtures.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const HEADER: &str = "Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp,Call_Text";

/// Two triangles in Mumbai joined through `B1`, which also reaches out to
/// a pair in Pune.
const NETWORK: &[&str] = &[
    "A1,A2,Outgoing,60,Mumbai,2024-05-01 09:00:00,\"thanks, see you at lunch\"",
    "A2,A3,Outgoing,45,Mumbai,2024-05-01 09:10:00,\"great work today\"",
    "A3,A1,Outgoing,30,Mumbai,2024-05-01 09:20:00,\"the package arrives tomorrow\"",
    "C1,C2,Outgoing,50,Mumbai,2024-05-01 20:00:00,\"where is the money\"",
    "C2,C3,Outgoing,40,Mumbai,2024-05-01 20:05:00,\"call me back\"",
    "C3,C1,Outgoing,35,Mumbai,2024-05-01 20:10:00,\"nice to hear from you\"",
    "A1,B1,Outgoing,120,Mumbai,2024-05-01 23:30:00,\"I will kill you, last warning\"",
    "B1,C1,Outgoing,90,Mumbai,2024-05-01 23:45:00,\"this is a threat, pay now\"",
    "B1,P1,Outgoing,20,Pune,2024-05-02 02:00:00,\"bad news\"",
    "P2,P1,Incoming,25,Pune,2024-05-02 14:00:00,\"happy birthday\"",
];

fn callnet_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("callnet").expect("binary exists");
    cmd.current_dir(dir)
        .env("CALLNET_LOG", "error")
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("FORMAT");
    cmd
}

fn write_csv(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut body = String::from(header);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(&path, body).expect("write fixture");
    path
}

fn network(dir: &TempDir) -> PathBuf {
    write_csv(dir.path(), "calls.csv", HEADER, NETWORK)
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = callnet_cmd(dir)
        .args(args)
        .args(["--format", "json"])
        .output()
        .expect("run callnet");
    assert!(
        output.status.success(),
        "callnet {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json stdout")
}

fn node_names(rows: &Value) -> Vec<String> {
    rows.as_array()
        .expect("array")
        .iter()
        .map(|r| r["node"].as_str().expect("node").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// summary / graph
// ---------------------------------------------------------------------------

#[test]
fn summary_reports_counts() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(dir.path(), &["summary", csv.to_str().expect("utf8")]);
    assert_eq!(json["rows"], 10);
    assert_eq!(json["locations"], 2);
    assert_eq!(json["has_call_text"], true);
    assert_eq!(json["graph"]["node_count"], 9);
    assert_eq!(json["graph"]["edge_count"], 10);
    assert_eq!(json["time_slots"]["Morning"], 3);
    assert_eq!(json["time_slots"]["Evening"], 5);
    assert_eq!(json["time_slots"]["Late Night"], 1);
    assert_eq!(json["time_slots"]["Afternoon"], 1);
}

#[test]
fn summary_is_stable_across_runs() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);
    let path = csv.to_str().expect("utf8");

    let first = run_json(dir.path(), &["summary", path]);
    let second = run_json(dir.path(), &["summary", path]);
    assert_eq!(first["fingerprint"], second["fingerprint"]);
    assert_eq!(first["graph_hash"], second["graph_hash"]);
}

#[test]
fn graph_edge_list_flips_incoming_calls() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(dir.path(), &["graph", csv.to_str().expect("utf8")]);
    let edges = json["edges"].as_array().expect("edges");
    assert_eq!(edges.len(), 10);
    assert!(
        edges
            .iter()
            .any(|e| e["from"] == "P1" && e["to"] == "P2" && e["duration"] == 25.0)
    );
    assert!(!edges.iter().any(|e| e["from"] == "P2"));
}

#[test]
fn graph_dot_output() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    callnet_cmd(dir.path())
        .args(["graph", csv.to_str().expect("utf8"), "--dot", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"))
        .stdout(predicate::str::contains("\"B1\""));
}

// ---------------------------------------------------------------------------
// centrality
// ---------------------------------------------------------------------------

#[test]
fn centrality_ranks_by_requested_column() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(
        dir.path(),
        &[
            "centrality",
            csv.to_str().expect("utf8"),
            "--sort",
            "betweenness",
            "--top",
            "3",
        ],
    );
    assert_eq!(json["sort"], "betweenness");
    assert_eq!(json["participants"], 9);
    let rows = json["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["node"], "B1");
    let scores: Vec<f64> = rows
        .iter()
        .map(|r| r["betweenness"].as_f64().expect("f64"))
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn centrality_falls_back_to_pagerank_when_eigenvector_fails() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(
        dir.path(),
        "cycle.csv",
        HEADER,
        &[
            "A,B,Outgoing,10,X,2024-01-01 10:00:00,hi",
            "B,C,Outgoing,10,X,2024-01-01 10:00:00,hi",
            "C,D,Outgoing,10,X,2024-01-01 10:00:00,hi",
            "D,A,Outgoing,10,X,2024-01-01 10:00:00,hi",
            "A,C,Outgoing,10,X,2024-01-01 10:00:00,hi",
        ],
    );
    fs::write(
        dir.path().join("callnet.toml"),
        "[eigenvector]\nmax_iter = 1\ntolerance = 1e-12\n",
    )
    .expect("write config");

    let json = run_json(
        dir.path(),
        &["centrality", csv.to_str().expect("utf8"), "--sort", "eigenvector"],
    );
    assert_eq!(json["sort"], "pagerank");
    assert_eq!(json["fallback_from"], "eigenvector");
    assert!(json["eigenvector_error"].is_string());
    for row in json["rows"].as_array().expect("rows") {
        assert!(row["eigenvector"].is_null());
    }
}

// ---------------------------------------------------------------------------
// risk
// ---------------------------------------------------------------------------

#[test]
fn risk_table_is_sorted_and_labelled() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(dir.path(), &["risk", csv.to_str().expect("utf8")]);
    let rows = json["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 9);
    assert_eq!(json["participants"], 9);

    let scores: Vec<f64> = rows
        .iter()
        .map(|r| r["risk_score"].as_f64().expect("f64"))
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    let threshold = json["threshold"].as_f64().expect("threshold");
    for row in rows {
        let high = row["risk_label"] == "High-Risk";
        assert_eq!(high, row["risk_score"].as_f64().expect("f64") >= threshold);
    }
    assert!(json["high_risk"].as_u64().expect("count") >= 1);
}

#[test]
fn risk_export_writes_csv() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);
    let export = dir.path().join("high_risk.csv");

    let json = run_json(
        dir.path(),
        &[
            "risk",
            csv.to_str().expect("utf8"),
            "--high-risk-only",
            "--export",
            export.to_str().expect("utf8"),
        ],
    );
    let shown = node_names(&json["rows"]);
    assert!(!shown.is_empty());

    let written = fs::read_to_string(&export).expect("export written");
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("Node,Out_Degree,Betweenness,PageRank,Risk_Score,Risk_Label")
    );
    let body: Vec<&str> = lines.collect();
    assert_eq!(body.len(), shown.len());
    assert!(body.iter().all(|l| l.ends_with(",High-Risk")));
}

// ---------------------------------------------------------------------------
// communities
// ---------------------------------------------------------------------------

#[test]
fn communities_per_location() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(dir.path(), &["communities", csv.to_str().expect("utf8")]);
    assert_eq!(json["by"], "location");
    let strata = json["strata"].as_array().expect("strata");
    let locations: Vec<&str> = strata
        .iter()
        .map(|s| s["key"]["location"].as_str().expect("location"))
        .collect();
    assert_eq!(locations, vec!["Mumbai", "Pune"]);
    assert!(strata[0]["community_count"].as_u64().expect("count") >= 2);
}

#[test]
fn communities_select_extracts_members() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);
    let path = csv.to_str().expect("utf8");

    let full = run_json(dir.path(), &["communities", path, "--stratum", "Mumbai"]);
    let members = full["members"].as_array().expect("members");
    let a1 = members
        .iter()
        .find(|m| m["node"] == "A1")
        .expect("A1 present");
    let id = a1["community"].as_u64().expect("id").to_string();

    let picked = run_json(
        dir.path(),
        &["communities", path, "--stratum", "Mumbai", "--select", &id],
    );
    let names = node_names(&picked["members"]);
    assert!(names.contains(&"A1".to_string()));
    assert!(names.contains(&"A2".to_string()));
    assert!(!names.contains(&"C2".to_string()));
    assert!(picked.get("warning").is_none());
}

#[test]
fn communities_unknown_selection_is_a_warning() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(
        dir.path(),
        &[
            "communities",
            csv.to_str().expect("utf8"),
            "--stratum",
            "Mumbai",
            "--select",
            "99",
        ],
    );
    assert_eq!(json["members"].as_array().expect("members").len(), 0);
    assert_eq!(json["warning"]["code"], "E4001");
}

#[test]
fn communities_time_location_keys() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(
        dir.path(),
        &["communities", csv.to_str().expect("utf8"), "--by", "time-location"],
    );
    let strata = json["strata"].as_array().expect("strata");
    assert!(
        strata
            .iter()
            .any(|s| s["key"]["time_slot"] == "Morning" && s["key"]["location"] == "Mumbai")
    );
}

// ---------------------------------------------------------------------------
// sentiment
// ---------------------------------------------------------------------------

#[test]
fn sentiment_ranks_threats_first() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    let json = run_json(
        dir.path(),
        &["sentiment", csv.to_str().expect("utf8"), "--top", "3"],
    );
    assert_eq!(json["calls"], 10);
    let danger = json["danger"].as_array().expect("danger");
    assert!(danger.len() <= 3);
    assert_eq!(danger[0]["caller_id"], "B1");
    assert_eq!(danger[0]["call_text"], "bad news");
    assert_eq!(danger[1]["caller_id"], "A1");
    let polarities: Vec<f64> = danger
        .iter()
        .map(|d| d["polarity"].as_f64().expect("f64"))
        .collect();
    assert!(polarities.windows(2).all(|w| w[0] <= w[1]));

    let counts = &json["counts"];
    let total = counts["positive"].as_u64().expect("n")
        + counts["neutral"].as_u64().expect("n")
        + counts["negative"].as_u64().expect("n");
    assert_eq!(total, 10);
}

#[test]
fn sentiment_text_output() {
    let dir = TempDir::new().expect("tempdir");
    let csv = network(&dir);

    callnet_cmd(dir.path())
        .args(["sentiment", csv.to_str().expect("utf8"), "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("positive "))
        .stdout(predicate::str::contains("I will kill you"));
}

// ---------------------------------------------------------------------------
// completions
// ---------------------------------------------------------------------------

#[test]
fn completions_mention_binary() {
    let dir = TempDir::new().expect("tempdir");
    callnet_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("callnet"));
}
