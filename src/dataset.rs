//! Clustered point datasets.
//!
//! A [`Dataset`] is built once from its input and treated as read-only. Each
//! dataset carries a process-unique generation used as a memoization key by
//! the fit and index caches.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::DataPoint;

static DATASET_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    /// Create a point identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    /// Create a cluster identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vote count and consensus percentage attached to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteMetrics {
    /// Total number of votes cast.
    pub votes: u32,
    /// Share of the majority position, in percent (0..=100).
    pub consensus: f64,
}

impl VoteMetrics {
    /// Create metrics from an explicit vote count and consensus percentage.
    pub fn new(votes: u32, consensus: f64) -> Self {
        Self { votes, consensus }
    }

    /// Derive metrics from agree/disagree tallies.
    ///
    /// Consensus is the majority share in percent. A point nobody voted on
    /// has no majority and reports 50%.
    pub fn from_tallies(agrees: u32, disagrees: u32) -> Self {
        let votes = agrees.saturating_add(disagrees);
        if votes == 0 {
            return Self::new(0, 50.0);
        }
        let majority = agrees.max(disagrees) as f64;
        Self::new(votes, 100.0 * majority / votes as f64)
    }
}

/// A single point of a clustered dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    /// Point identifier.
    pub id: PointId,
    /// Position in data space.
    pub position: DataPoint,
    /// Identifier of the owning cluster.
    pub cluster_id: ClusterId,
    /// Optional vote metadata.
    pub votes: Option<VoteMetrics>,
}

impl MapPoint {
    /// Create a point without vote metadata.
    pub fn new(id: impl Into<String>, x: f64, y: f64, cluster_id: ClusterId) -> Self {
        Self {
            id: PointId::new(id),
            position: DataPoint::new(x, y),
            cluster_id,
            votes: None,
        }
    }

    /// Attach vote metadata.
    pub fn with_votes(mut self, votes: VoteMetrics) -> Self {
        self.votes = Some(votes);
        self
    }
}

/// A labelled group of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster identifier.
    pub id: ClusterId,
    /// Display label.
    pub label: String,
    /// Member points, in input order.
    pub points: Vec<MapPoint>,
}

impl Cluster {
    /// Create an empty cluster.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: ClusterId::new(id),
            label: label.into(),
            points: Vec::new(),
        }
    }

    /// Add a point at the given coordinates owned by this cluster.
    pub fn with_point(mut self, id: impl Into<String>, x: f64, y: f64) -> Self {
        let point = MapPoint::new(id, x, y, self.id.clone());
        self.points.push(point);
        self
    }

    /// Add a prepared point.
    pub fn with_map_point(mut self, point: MapPoint) -> Self {
        self.points.push(point);
        self
    }

    /// Mean position of the member points.
    pub fn centroid(&self) -> Option<DataPoint> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.position.x, sy + p.position.y));
        Some(DataPoint::new(sx / n, sy / n))
    }
}

/// Errors raised while building a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Two points share an identifier.
    #[error("duplicate point id: {0}")]
    DuplicatePoint(PointId),

    /// Two clusters share an identifier.
    #[error("duplicate cluster id: {0}")]
    DuplicateCluster(ClusterId),

    /// A point names a different cluster than the one containing it.
    #[error("point {point} is listed under cluster {owner} but claims cluster {claimed}")]
    ClusterMismatch {
        /// Offending point.
        point: PointId,
        /// Cluster that contains the point.
        owner: ClusterId,
        /// Cluster named by the point.
        claimed: ClusterId,
    },

    /// A point has a NaN or infinite coordinate.
    #[error("point {0} has a non-finite coordinate")]
    NonFiniteCoordinate(PointId),

    /// A consensus value lies outside 0..=100.
    #[error("point {point} has consensus {value} outside 0..=100")]
    InvalidConsensus {
        /// Offending point.
        point: PointId,
        /// Reported consensus.
        value: f64,
    },

    /// The input is not valid dataset JSON.
    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable clustered dataset with a deterministic enumeration order.
#[derive(Debug, Clone)]
pub struct Dataset {
    clusters: Vec<Cluster>,
    order: Vec<(usize, usize)>,
    point_index: HashMap<PointId, (usize, usize)>,
    generation: u64,
    has_votes: bool,
}

impl Dataset {
    /// Build a dataset, validating identifiers and coordinates.
    pub fn new(clusters: Vec<Cluster>) -> Result<Self, DatasetError> {
        let mut cluster_ids = HashSet::new();
        let mut point_index = HashMap::new();
        let mut has_votes = false;

        for (ci, cluster) in clusters.iter().enumerate() {
            if !cluster_ids.insert(cluster.id.clone()) {
                return Err(DatasetError::DuplicateCluster(cluster.id.clone()));
            }
            for (pi, point) in cluster.points.iter().enumerate() {
                if point.cluster_id != cluster.id {
                    return Err(DatasetError::ClusterMismatch {
                        point: point.id.clone(),
                        owner: cluster.id.clone(),
                        claimed: point.cluster_id.clone(),
                    });
                }
                if !point.position.is_finite() {
                    return Err(DatasetError::NonFiniteCoordinate(point.id.clone()));
                }
                if let Some(votes) = point.votes {
                    if !(0.0..=100.0).contains(&votes.consensus) {
                        return Err(DatasetError::InvalidConsensus {
                            point: point.id.clone(),
                            value: votes.consensus,
                        });
                    }
                    has_votes = true;
                }
                if point_index.insert(point.id.clone(), (ci, pi)).is_some() {
                    return Err(DatasetError::DuplicatePoint(point.id.clone()));
                }
            }
        }

        let mut order: Vec<(usize, usize)> = point_index.values().copied().collect();
        order.sort_by(|&(ca, pa), &(cb, pb)| {
            let a = &clusters[ca];
            let b = &clusters[cb];
            a.id.cmp(&b.id).then_with(|| a.points[pa].id.cmp(&b.points[pb].id))
        });

        Ok(Self {
            clusters,
            order,
            point_index,
            generation: DATASET_GENERATION.fetch_add(1, Ordering::Relaxed),
            has_votes,
        })
    }

    /// An empty dataset.
    pub fn empty() -> Self {
        Self {
            clusters: Vec::new(),
            order: Vec::new(),
            point_index: HashMap::new(),
            generation: DATASET_GENERATION.fetch_add(1, Ordering::Relaxed),
            has_votes: false,
        }
    }

    /// Parse and validate a dataset from its JSON representation.
    pub fn from_json_str(text: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Parse and validate a dataset from a JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDataset) -> Result<Self, DatasetError> {
        let clusters = raw
            .clusters
            .into_iter()
            .map(RawCluster::into_cluster)
            .collect();
        Self::new(clusters)
    }

    /// Clusters in input order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Look up a cluster by identifier.
    pub fn cluster(&self, id: &ClusterId) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| &cluster.id == id)
    }

    /// Look up a point by identifier.
    pub fn point(&self, id: &PointId) -> Option<&MapPoint> {
        let &(ci, pi) = self.point_index.get(id)?;
        Some(&self.clusters[ci].points[pi])
    }

    /// All points in ascending (cluster id, point id) order.
    pub fn points(&self) -> impl Iterator<Item = &MapPoint> + '_ {
        self.order
            .iter()
            .map(move |&(ci, pi)| &self.clusters[ci].points[pi])
    }

    /// Number of points across all clusters.
    pub fn total_points(&self) -> usize {
        self.order.len()
    }

    /// Whether any point carries vote metadata.
    pub fn has_votes(&self) -> bool {
        self.has_votes
    }

    /// Unique version of this dataset instance.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Share of all points that belong to a cluster, rounded to whole percent.
    pub fn cluster_share(&self, id: &ClusterId) -> Option<u32> {
        let cluster = self.cluster(id)?;
        let total = self.total_points();
        if total == 0 {
            return Some(0);
        }
        Some((100.0 * cluster.points.len() as f64 / total as f64).round() as u32)
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    clusters: Vec<RawCluster>,
}

#[derive(Debug, Deserialize)]
struct RawCluster {
    cluster_id: ClusterId,
    #[serde(default, rename = "cluster")]
    label: String,
    #[serde(default, rename = "arguments")]
    points: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    arg_id: PointId,
    x: f64,
    y: f64,
    #[serde(default)]
    cluster_id: Option<ClusterId>,
    #[serde(default)]
    votes: Option<u32>,
    #[serde(default)]
    consensus: Option<f64>,
    #[serde(default)]
    agrees: Option<u32>,
    #[serde(default)]
    disagrees: Option<u32>,
}

impl RawCluster {
    fn into_cluster(self) -> Cluster {
        let id = self.cluster_id;
        let points = self
            .points
            .into_iter()
            .map(|raw| raw.into_point(&id))
            .collect();
        Cluster {
            id,
            label: self.label,
            points,
        }
    }
}

impl RawPoint {
    fn into_point(self, owner: &ClusterId) -> MapPoint {
        let votes = match (self.votes, self.consensus, self.agrees, self.disagrees) {
            (Some(votes), Some(consensus), _, _) => Some(VoteMetrics::new(votes, consensus)),
            (_, _, Some(agrees), disagrees) => {
                Some(VoteMetrics::from_tallies(agrees, disagrees.unwrap_or(0)))
            }
            (_, _, None, Some(disagrees)) => Some(VoteMetrics::from_tallies(0, disagrees)),
            (Some(votes), None, None, None) => Some(VoteMetrics::new(votes, 100.0)),
            (None, Some(consensus), None, None) => Some(VoteMetrics::new(0, consensus)),
            (None, None, None, None) => None,
        };
        MapPoint {
            id: self.arg_id,
            position: DataPoint::new(self.x, self.y),
            cluster_id: self.cluster_id.unwrap_or_else(|| owner.clone()),
            votes,
        }
    }
}
