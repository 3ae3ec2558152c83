use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Lightweight handle into graph storage owned elsewhere.
///
/// Edges are only ever used as map keys and for length lookups; this crate
/// never allocates or frees graph storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub usize);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One paired-read observation between two edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Signed offset between the starting positions of the two edges
    pub d: f64,
    /// Evidence weight (never negative)
    pub weight: f64,
    /// Observation-local uncertainty radius
    pub var: f64,
}

impl Point {
    pub fn new(d: f64, weight: f64, var: f64) -> Self {
        Self { d, weight, var }
    }

    /// Distance rounded half away from zero
    pub fn rounded_d(&self) -> i64 {
        self.d.round() as i64
    }

    /// Distance truncated toward zero
    pub fn truncated_d(&self) -> i64 {
        self.d.trunc() as i64
    }

    /// Total order by distance, then weight, then variance.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.d
            .total_cmp(&other.d)
            .then_with(|| self.weight.total_cmp(&other.weight))
            .then_with(|| self.var.total_cmp(&other.var))
    }
}

/// Unordered multiset of observations for one ordered edge pair
pub type Histogram = Vec<Point>;

/// An observation tied to the ordered edge pair it was recorded for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairInfo {
    pub first: EdgeId,
    pub second: EdgeId,
    pub point: Point,
}

impl PairInfo {
    pub fn new(first: EdgeId, second: EdgeId, point: Point) -> Self {
        Self {
            first,
            second,
            point,
        }
    }

    pub fn d(&self) -> f64 {
        self.point.d
    }

    pub fn weight(&self) -> f64 {
        self.point.weight
    }

    pub fn rounded_d(&self) -> i64 {
        self.point.rounded_d()
    }

    /// The same observation seen from the second edge
    pub fn mirrored(&self) -> Self {
        Self {
            first: self.second,
            second: self.first,
            point: Point::new(-self.point.d, self.point.weight, self.point.var),
        }
    }
}

/// Which side of an edge an observation points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Partner lies downstream (strictly positive distance)
    Forward,
    /// Partner lies upstream (strictly negative distance)
    Backward,
}

impl Direction {
    /// Zero distances belong to neither direction.
    pub fn matches(self, d: f64) -> bool {
        match self {
            Direction::Forward => d > 0.0,
            Direction::Backward => d < 0.0,
        }
    }
}

/// Which of a library's two indices an aggregate reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceSource {
    /// Uncorrected observations as mapped from reads
    Raw,
    /// Observations after upstream distance clustering
    Clustered,
}

/// Edge length capability of the assembly graph
pub trait EdgeLengths {
    fn length(&self, edge: EdgeId) -> usize;
}

/// Arena of edge lengths addressed by `EdgeId`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeLengthArena {
    lengths: Vec<usize>,
}

impl EdgeLengthArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lengths(lengths: Vec<usize>) -> Self {
        Self { lengths }
    }

    /// Register an edge and return its handle
    pub fn add_edge(&mut self, length: usize) -> EdgeId {
        self.lengths.push(length);
        EdgeId(self.lengths.len() - 1)
    }

    pub fn get(&self, edge: EdgeId) -> Option<usize> {
        self.lengths.get(edge.0).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.lengths.len()).map(EdgeId)
    }
}

impl EdgeLengths for EdgeLengthArena {
    /// Panics on a handle that was not issued by this arena.
    fn length(&self, edge: EdgeId) -> usize {
        self.lengths[edge.0]
    }
}

impl<T: EdgeLengths + ?Sized> EdgeLengths for &T {
    fn length(&self, edge: EdgeId) -> usize {
        (**self).length(edge)
    }
}
