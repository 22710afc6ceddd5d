//! Brute-force descriptor matching with a nearest/second-nearest ratio test.

use crate::feature::Feature;
use crate::util::math::squared_distance;

/// A template feature paired with its nearest target feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureMatch {
    /// Index into the template features.
    pub query: usize,
    /// Index into the target features.
    pub train: usize,
    /// Euclidean descriptor distance.
    pub distance: f32,
}

/// Matches every query descriptor against all train descriptors.
///
/// A match is kept when `nearest < ratio * second_nearest`. With fewer than
/// two train features there is no second neighbour and every nearest match
/// is kept.
pub fn ratio_test_matches(query: &[Feature], train: &[Feature], ratio: f64) -> Vec<FeatureMatch> {
    if train.is_empty() {
        return Vec::new();
    }
    let ratio = ratio as f32;
    let check_ratio = train.len() >= 2;

    query
        .iter()
        .enumerate()
        .filter_map(|(query_idx, q)| {
            let mut best = f32::INFINITY;
            let mut second = f32::INFINITY;
            let mut best_idx = 0;
            for (train_idx, t) in train.iter().enumerate() {
                let d = squared_distance(&q.descriptor, &t.descriptor);
                if d < best {
                    second = best;
                    best = d;
                    best_idx = train_idx;
                } else if d < second {
                    second = d;
                }
            }
            let best = best.sqrt();
            let second = second.sqrt();
            (!check_ratio || best < ratio * second).then_some(FeatureMatch {
                query: query_idx,
                train: best_idx,
                distance: best,
            })
        })
        .collect()
}
