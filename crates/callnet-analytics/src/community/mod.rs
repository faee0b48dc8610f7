//! Stratified community detection.
//!
//! # Overview
//!
//! Calls are grouped into strata, either by `Location` or by
//! `(time slot, Location)`. Each stratum's rows form their own unit-weight
//! call graph, which is projected to undirected and partitioned with
//! [`louvain::louvain`]. Community ids are local to a stratum.
//!
//! Strata whose graph has at most one participant are omitted: a single
//! node has no community structure.
//!
//! ```text
//! CallTable
//!   ↓  group rows by StratumKey (first-appearance order)
//! Vec<(StratumKey, rows)>
//!   ↓  CallGraph::from_records → undirected() → louvain()
//! Vec<StratumPartition>
//!   ↓  summarize()
//! Vec<StratumSummary>  (most communities first)
//! ```

pub mod louvain;
pub mod partition;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use callnet_core::{CallRecord, CallTable, TimeSlot};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::graph::{CallGraph, EdgeMerge, GraphError, GraphOptions};

pub use louvain::{CommunityConfig, louvain};
pub use partition::{Assignment, Partition, modularity};

// ---------------------------------------------------------------------------
// Strata
// ---------------------------------------------------------------------------

/// Which columns split the table into strata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stratification {
    #[default]
    Location,
    TimeLocation,
}

impl FromStr for Stratification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "location" => Ok(Self::Location),
            "time-location" => Ok(Self::TimeLocation),
            _ => Err(format!("unknown stratification `{s}`")),
        }
    }
}

/// The value a stratum is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StratumKey {
    Location(String),
    TimeLocation(TimeSlot, String),
}

impl StratumKey {
    #[must_use]
    pub fn of(record: &CallRecord, by: Stratification) -> Self {
        match by {
            Stratification::Location => Self::Location(record.location.clone()),
            Stratification::TimeLocation => {
                Self::TimeLocation(record.time_slot(), record.location.clone())
            }
        }
    }

    /// Parse the [`Display`](fmt::Display) form back into a key.
    ///
    /// Time-location keys are written `<slot>:<location>`.
    #[must_use]
    pub fn parse(by: Stratification, raw: &str) -> Option<Self> {
        match by {
            Stratification::Location => Some(Self::Location(raw.trim().to_string())),
            Stratification::TimeLocation => {
                let (slot, location) = raw.split_once(':')?;
                let slot = slot.parse::<TimeSlot>().ok()?;
                Some(Self::TimeLocation(slot, location.trim().to_string()))
            }
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Location(loc) | Self::TimeLocation(_, loc) => loc,
        }
    }
}

impl fmt::Display for StratumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location(loc) => f.write_str(loc),
            Self::TimeLocation(slot, loc) => write!(f, "{slot}:{loc}"),
        }
    }
}

impl Serialize for StratumKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Location(loc) => {
                let mut s = serializer.serialize_struct("StratumKey", 1)?;
                s.serialize_field("location", loc)?;
                s.end()
            }
            Self::TimeLocation(slot, loc) => {
                let mut s = serializer.serialize_struct("StratumKey", 2)?;
                s.serialize_field("time_slot", slot)?;
                s.serialize_field("location", loc)?;
                s.end()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Louvain result for one stratum.
#[derive(Debug, Clone, Serialize)]
pub struct StratumPartition {
    pub key: StratumKey,
    pub partition: Partition,
    pub modularity: f64,
}

/// One line of the community summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratumSummary {
    pub key: StratumKey,
    pub community_count: usize,
    pub node_count: usize,
    pub modularity: f64,
}

/// Partition every stratum of `table` independently.
///
/// Strata appear in first-appearance order of their key in the table.
///
/// # Errors
///
/// Returns [`GraphError`] if a record has an empty endpoint.
#[instrument(skip(table, config), fields(rows = table.len()))]
pub fn detect_communities(
    table: &CallTable,
    by: Stratification,
    merge: EdgeMerge,
    config: &CommunityConfig,
) -> Result<Vec<StratumPartition>, GraphError> {
    let mut strata: Vec<(StratumKey, Vec<&CallRecord>)> = Vec::new();
    let mut position: HashMap<StratumKey, usize> = HashMap::new();
    for record in table {
        let key = StratumKey::of(record, by);
        match position.get(&key) {
            Some(&i) => strata[i].1.push(record),
            None => {
                position.insert(key.clone(), strata.len());
                strata.push((key, vec![record]));
            }
        }
    }

    let mut out = Vec::with_capacity(strata.len());
    for (key, rows) in strata {
        let cg = CallGraph::from_records(rows.iter().copied(), &GraphOptions::unit(merge))?;
        if cg.node_count() <= 1 {
            debug!(stratum = %key, "skipping stratum with a single participant");
            continue;
        }
        let ug = cg.undirected();
        let partition = louvain(&ug, config);
        let q = modularity(&ug, &partition, config.resolution);
        debug!(
            stratum = %key,
            nodes = partition.node_count(),
            communities = partition.community_count(),
            "stratum partitioned"
        );
        out.push(StratumPartition {
            key,
            partition,
            modularity: q,
        });
    }

    Ok(out)
}

/// Community counts per stratum, most communities first.
///
/// Strata with equal counts keep their detection order.
#[must_use]
pub fn summarize(partitions: &[StratumPartition]) -> Vec<StratumSummary> {
    let mut rows: Vec<StratumSummary> = partitions
        .iter()
        .map(|p| StratumSummary {
            key: p.key.clone(),
            community_count: p.partition.community_count(),
            node_count: p.partition.node_count(),
            modularity: p.modularity,
        })
        .collect();
    rows.sort_by(|a, b| b.community_count.cmp(&a.community_count));
    rows
}

/// Find the partition for `key`, if that stratum was partitioned.
#[must_use]
pub fn find_stratum<'a>(
    partitions: &'a [StratumPartition],
    key: &StratumKey,
) -> Option<&'a StratumPartition> {
    partitions.iter().find(|p| &p.key == key)
}

/// Nodes whose community is one of `ids`, in node order.
///
/// An empty result means none of the requested ids exist in this
/// partition; callers report that as an empty selection.
#[must_use]
pub fn extract_community_nodes<'a>(partition: &'a Partition, ids: &[u32]) -> Vec<&'a str> {
    partition
        .iter()
        .filter(|a| ids.contains(&a.community))
        .map(|a| a.node.as_str())
        .collect()
}
