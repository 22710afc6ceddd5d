//! Deterministic k-means over 2D points.

use crate::image::Point;

/// Iteration cap for Lloyd's algorithm.
pub(crate) const MAX_ITERATIONS: usize = 100;

/// One cluster of a [`Clustering`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    pub centroid: Point,
    pub members: usize,
}

/// Output of [`kmeans`].
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    /// Cluster index per input point.
    pub labels: Vec<usize>,
}

impl Clustering {
    /// The cluster with most members; the lowest index wins ties.
    pub fn dominant(&self) -> Option<&Cluster> {
        let mut best: Option<&Cluster> = None;
        for cluster in &self.clusters {
            if best.map_or(true, |b| cluster.members > b.members) {
                best = Some(cluster);
            }
        }
        best
    }
}

/// Number of clusters actually used for `points` when `k` are requested.
///
/// Falls back to a single cluster when there are fewer points than
/// clusters.
pub fn effective_k(points: usize, k: usize) -> usize {
    if points < k {
        1
    } else {
        k.max(1)
    }
}

/// Clusters `points` into `effective_k(points.len(), k)` groups.
///
/// Seeds are chosen by farthest-point traversal starting from the first
/// point, then refined with Lloyd iterations until assignments stop
/// changing. Returns an empty clustering for empty input.
pub fn kmeans(points: &[Point], k: usize) -> Clustering {
    if points.is_empty() {
        return Clustering {
            clusters: Vec::new(),
            labels: Vec::new(),
        };
    }
    let k = effective_k(points.len(), k);
    let mut centers = seed_farthest(points, k);
    let mut labels = vec![usize::MAX; points.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (label, point) in labels.iter_mut().zip(points) {
            let nearest = nearest_center(&centers, point);
            if *label != nearest {
                *label = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        let mut sums = vec![(0.0f64, 0.0f64, 0usize); centers.len()];
        for (&label, point) in labels.iter().zip(points) {
            let entry = &mut sums[label];
            entry.0 += point.x;
            entry.1 += point.y;
            entry.2 += 1;
        }
        for (center, (sx, sy, n)) in centers.iter_mut().zip(sums) {
            if n > 0 {
                *center = Point::new(sx / n as f64, sy / n as f64);
            }
        }
    }

    let mut members = vec![0usize; centers.len()];
    for &label in &labels {
        members[label] += 1;
    }
    let clusters = centers
        .into_iter()
        .zip(members)
        .map(|(centroid, members)| Cluster { centroid, members })
        .collect();
    Clustering { clusters, labels }
}

fn seed_farthest(points: &[Point], k: usize) -> Vec<Point> {
    let mut centers = vec![points[0]];
    let mut min_dist: Vec<f64> = points.iter().map(|p| sq_dist(p, &points[0])).collect();
    while centers.len() < k {
        let mut far_idx = 0;
        let mut far_dist = -1.0;
        for (idx, &d) in min_dist.iter().enumerate() {
            if d > far_dist {
                far_dist = d;
                far_idx = idx;
            }
        }
        let next = points[far_idx];
        centers.push(next);
        for (d, p) in min_dist.iter_mut().zip(points) {
            *d = d.min(sq_dist(p, &next));
        }
    }
    centers
}

fn nearest_center(centers: &[Point], point: &Point) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, center) in centers.iter().enumerate() {
        let d = sq_dist(center, point);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    best
}

#[inline]
fn sq_dist(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}
