//! Vote and consensus filtering.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dataset::{MapPoint, PointId};

/// Lowest accepted consensus threshold, in percent.
pub const MIN_CONSENSUS_FLOOR: u8 = 50;
/// Highest accepted consensus threshold, in percent.
pub const MIN_CONSENSUS_CEILING: u8 = 100;

/// Thresholds a point's vote metadata must meet to stay visible.
///
/// Points without vote metadata always pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterState {
    min_votes: u32,
    min_consensus: u8,
}

impl FilterState {
    /// Create a filter, clamping both thresholds into range.
    pub fn new(min_votes: i64, min_consensus: i64) -> Self {
        let mut state = Self::default();
        state.set_min_votes(min_votes);
        state.set_min_consensus(min_consensus);
        state
    }

    /// Minimum vote count.
    pub fn min_votes(&self) -> u32 {
        self.min_votes
    }

    /// Minimum consensus percentage.
    pub fn min_consensus(&self) -> u8 {
        self.min_consensus
    }

    /// Set the vote threshold. Negative requests clamp to 0 and requests
    /// beyond `u32::MAX` clamp to it.
    pub fn set_min_votes(&mut self, requested: i64) -> u32 {
        let clamped = requested.clamp(0, u32::MAX as i64) as u32;
        if clamped as i64 != requested {
            debug!(requested, clamped, "min votes clamped");
        }
        self.min_votes = clamped;
        clamped
    }

    /// Set the consensus threshold, clamped into `50..=100`.
    pub fn set_min_consensus(&mut self, requested: i64) -> u8 {
        let clamped = requested.clamp(
            MIN_CONSENSUS_FLOOR as i64,
            MIN_CONSENSUS_CEILING as i64,
        ) as u8;
        if clamped as i64 != requested {
            debug!(requested, clamped, "min consensus clamped");
        }
        self.min_consensus = clamped;
        clamped
    }

    /// Whether a point passes the thresholds.
    pub fn passes(&self, point: &MapPoint) -> bool {
        match point.votes {
            None => true,
            Some(votes) => {
                votes.votes >= self.min_votes && votes.consensus >= self.min_consensus as f64
            }
        }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            min_votes: 0,
            min_consensus: MIN_CONSENSUS_FLOOR,
        }
    }
}

/// Outcome of a filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Identifiers of the passing points.
    pub passing: BTreeSet<PointId>,
    /// Number of points evaluated.
    pub total_count: usize,
    /// Number of passing points.
    pub passing_count: usize,
}

impl FilterReport {
    /// Whether a point passed.
    pub fn contains(&self, id: &PointId) -> bool {
        self.passing.contains(id)
    }
}

/// Evaluate points against raw thresholds (clamped first).
pub fn evaluate<'a, I>(points: I, min_votes: i64, min_consensus: i64) -> FilterReport
where
    I: IntoIterator<Item = &'a MapPoint>,
{
    evaluate_with(points, &FilterState::new(min_votes, min_consensus))
}

/// Evaluate points against a prepared filter state.
pub fn evaluate_with<'a, I>(points: I, state: &FilterState) -> FilterReport
where
    I: IntoIterator<Item = &'a MapPoint>,
{
    let mut report = FilterReport::default();
    for point in points {
        report.total_count += 1;
        if state.passes(point) {
            report.passing.insert(point.id.clone());
        }
    }
    report.passing_count = report.passing.len();
    report
}
