//! Non-maximum suppression for candidate locations.

use crate::image::Point;

/// Points kept by [`nms_distance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NmsOutcome {
    pub points: Vec<Point>,
    /// At least one further point would have been accepted past `limit`.
    pub truncated: bool,
}

/// Greedy distance-based suppression.
///
/// Candidates are visited sorted by x then y; a candidate is kept when its
/// Euclidean distance to every kept point is strictly greater than
/// `distance`. At most `limit` points are kept. The result is sorted by x.
pub(crate) fn nms_distance(candidates: &mut [Point], distance: f64, limit: usize) -> NmsOutcome {
    candidates.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut outcome = NmsOutcome::default();
    'outer: for candidate in candidates.iter().copied() {
        for kept in outcome.points.iter() {
            if candidate.distance(kept) <= distance {
                continue 'outer;
            }
        }
        if outcome.points.len() == limit {
            outcome.truncated = true;
            break;
        }
        outcome.points.push(candidate);
    }

    outcome
}
