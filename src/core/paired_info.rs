use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::core::data_structures::{EdgeId, Histogram, PairInfo, Point};

/// Read-only view of paired-end evidence between graph edges
///
/// Implementations must be fully populated before the first query; nothing in
/// this crate mutates an index it is given.
///
/// Evidence must be stored symmetrically: an observation `(e1, e2, d)` is
/// also visible as `(e2, e1, -d)`, so `edge_info` on either edge returns it.
/// Neighbor lookups and directional aggregates read only `edge_info`.
pub trait PairedInfoIndex {
    /// Every observation recorded on `edge`, with `first == edge`
    fn edge_info(&self, edge: EdgeId) -> Vec<PairInfo>;

    /// Full histogram for the ordered pair `(first, second)`
    fn edge_pair_info(&self, first: EdgeId, second: EdgeId) -> Histogram;
}

impl<T: PairedInfoIndex + ?Sized> PairedInfoIndex for &T {
    fn edge_info(&self, edge: EdgeId) -> Vec<PairInfo> {
        (**self).edge_info(edge)
    }

    fn edge_pair_info(&self, first: EdgeId, second: EdgeId) -> Histogram {
        (**self).edge_pair_info(first, second)
    }
}

/// In-memory paired info index keyed by ordered edge pair.
///
/// Observations are kept symmetric: recording `(e1, e2, d)` also records
/// `(e2, e1, -d)`, except for a self-pair at zero distance which is its own
/// mirror.
#[derive(Debug, Clone, Default)]
pub struct PairedIndex {
    storage: AHashMap<EdgeId, AHashMap<EdgeId, Histogram>>,
    size: usize,
}

/// On-disk form of an index: the one-sided records it was built from
#[derive(Debug, Serialize, Deserialize)]
struct PairedIndexRecords {
    records: Vec<PairInfo>,
}

impl PairedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pair_infos<I>(pair_infos: I) -> Self
    where
        I: IntoIterator<Item = PairInfo>,
    {
        let mut index = Self::new();
        for info in pair_infos {
            index.add_pair_info(info.first, info.second, info.point);
        }
        index
    }

    /// Record an observation and its mirror
    pub fn add_pair_info(&mut self, first: EdgeId, second: EdgeId, point: Point) {
        self.push_point(first, second, point);
        if first != second || point.d != 0.0 {
            self.push_point(second, first, Point::new(-point.d, point.weight, point.var));
        }
    }

    fn push_point(&mut self, first: EdgeId, second: EdgeId, point: Point) {
        self.storage
            .entry(first)
            .or_default()
            .entry(second)
            .or_default()
            .push(point);
        self.size += 1;
    }

    /// Number of stored points, mirrors included
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// All stored points ordered by `(first, second)`, histogram order within a pair
    pub fn pair_infos(&self) -> Vec<PairInfo> {
        let mut firsts: Vec<EdgeId> = self.storage.keys().copied().collect();
        firsts.sort_unstable();

        let mut result = Vec::with_capacity(self.size);
        for first in firsts {
            result.extend(self.edge_info(first));
        }
        result
    }

    /// One record per observation: the mirror of a stored point is dropped.
    fn one_sided_records(&self) -> Vec<PairInfo> {
        let mut records = Vec::with_capacity(self.size / 2 + 1);
        for info in self.pair_infos() {
            let keep = if info.first == info.second {
                info.point.d >= 0.0
            } else {
                info.first < info.second
            };
            if keep {
                records.push(info);
            }
        }
        records
    }

    /// Write the index to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload = PairedIndexRecords {
            records: self.one_sided_records(),
        };
        let json = serde_json::to_string_pretty(&payload)
            .context("Failed to serialize paired info index")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write paired info index to {}", path.display()))?;

        info!(
            "💾 Saved {} paired info records to {}",
            payload.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Rebuild an index previously written by [`PairedIndex::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read paired info index from {}", path.display()))?;
        let payload: PairedIndexRecords = serde_json::from_str(&json)
            .with_context(|| format!("Malformed paired info index in {}", path.display()))?;

        let index = Self::from_pair_infos(payload.records);
        info!(
            "📂 Loaded paired info index from {} ({} points)",
            path.display(),
            index.len()
        );
        Ok(index)
    }
}

impl PairedInfoIndex for PairedIndex {
    fn edge_info(&self, edge: EdgeId) -> Vec<PairInfo> {
        let Some(partners) = self.storage.get(&edge) else {
            debug!("No paired info recorded for {}", edge);
            return Vec::new();
        };

        let mut seconds: Vec<EdgeId> = partners.keys().copied().collect();
        seconds.sort_unstable();

        seconds
            .into_iter()
            .flat_map(|second| {
                partners[&second]
                    .iter()
                    .map(move |&point| PairInfo::new(edge, second, point))
            })
            .collect()
    }

    fn edge_pair_info(&self, first: EdgeId, second: EdgeId) -> Histogram {
        self.storage
            .get(&first)
            .and_then(|partners| partners.get(&second))
            .cloned()
            .unwrap_or_default()
    }
}
