//! Feature engine behaviour on synthetic blob scenes.

use findit::feature::{detect_keypoints, effective_k, kmeans, HessianConfig};
use findit::{Engine, EngineOptions, ExecuteOptions, FeatureEngine, Point, RasterBuffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

const BACKGROUND: u8 = 128;

fn fill_rect(data: &mut [u8], width: usize, x0: usize, y0: usize, side: usize, value: u8) {
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            data[y * width + x] = value;
        }
    }
}

/// 80x80 patch with four squares of distinct size and polarity.
fn blob_patch() -> RasterBuffer {
    let mut data = vec![BACKGROUND; 80 * 80];
    fill_rect(&mut data, 80, 24, 26, 9, 0);
    fill_rect(&mut data, 80, 44, 24, 13, 255);
    fill_rect(&mut data, 80, 27, 46, 7, 0);
    fill_rect(&mut data, 80, 45, 44, 11, 255);
    RasterBuffer::new(data, 80, 80).unwrap()
}

fn embed(patch: &RasterBuffer, width: usize, height: usize, x0: usize, y0: usize) -> RasterBuffer {
    let mut data = vec![BACKGROUND; width * height];
    for y in 0..patch.height() {
        let dst = (y0 + y) * width + x0;
        data[dst..dst + patch.width()]
            .copy_from_slice(&patch.data()[y * patch.width()..(y + 1) * patch.width()]);
    }
    RasterBuffer::new(data, width, height).unwrap()
}

/// Quarter turn clockwise.
fn rotate90(image: &RasterBuffer) -> RasterBuffer {
    let (w, h) = (image.width(), image.height());
    let mut data = Vec::with_capacity(w * h);
    for y in 0..w {
        for x in 0..h {
            data.push(image.data()[(h - 1 - x) * w + y]);
        }
    }
    RasterBuffer::new(data, h, w).unwrap()
}

fn single_octave_engine() -> FeatureEngine {
    FeatureEngine::from_options(&EngineOptions {
        engine_feature_octaves: Some(1),
        ..EngineOptions::default()
    })
    .unwrap()
}

#[test]
fn embedded_patch_is_located() {
    let patch = blob_patch();
    let target = embed(&patch, 220, 180, 64, 48);
    let engine = single_octave_engine();

    let resp = engine
        .execute(Some(patch.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    assert!(resp.is_ok(), "{:?}", resp.get_content());
    let brief = resp.get_brief();
    assert!(brief["feature_point_num"].as_u64().unwrap() >= 1);
    let pair = brief["target_point"].as_array().unwrap();
    let (x, y) = (pair[0].as_f64().unwrap(), pair[1].as_f64().unwrap());
    // the squares cover x 88..121, y 72..105 in the target
    assert!((78.0..=131.0).contains(&x), "x = {x}");
    assert!((62.0..=115.0).contains(&y), "y = {y}");
}

#[test]
fn rotated_patch_is_located() {
    let patch = blob_patch();
    let target = embed(&rotate90(&patch), 220, 180, 64, 48);
    let engine = single_octave_engine();

    let resp = engine
        .execute(Some(patch.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    assert!(resp.is_ok(), "{:?}", resp.get_content());
    let brief = resp.get_brief();
    assert!(brief["feature_point_num"].as_u64().unwrap() >= 2);
    // the squares cover x 86..119, y 72..105 once rotated into the target
    let pair = brief["target_point"].as_array().unwrap();
    let (x, y) = (pair[0].as_f64().unwrap(), pair[1].as_f64().unwrap());
    assert!((76.0..=130.0).contains(&x), "x = {x}");
    assert!((62.0..=116.0).contains(&y), "y = {y}");
}

#[test]
fn keypoints_shift_with_the_image() {
    let patch = blob_patch();
    let target = embed(&patch, 220, 180, 64, 48);
    let cfg = HessianConfig {
        octaves: 1,
        ..HessianConfig::default()
    };
    let in_patch = detect_keypoints(patch.view(), &cfg);
    let in_target = detect_keypoints(target.view(), &cfg);
    assert!(!in_patch.is_empty());
    for kp in &in_patch {
        let shifted = Point::new(kp.x + 64.0, kp.y + 48.0);
        assert!(
            in_target
                .iter()
                .any(|t| Point::new(t.x, t.y).distance(&shifted) < 1e-9),
            "keypoint at ({}, {}) has no shifted counterpart",
            kp.x,
            kp.y
        );
    }
}

#[test]
fn featureless_template_is_not_found() {
    let template = RasterBuffer::filled(40, 40, BACKGROUND).unwrap();
    let mut rng = StdRng::seed_from_u64(21);
    let data = (0..160 * 120).map(|_| rng.random_range(0..=255)).collect();
    let target = RasterBuffer::new(data, 160, 120).unwrap();

    let engine = FeatureEngine::from_options(&EngineOptions::default()).unwrap();
    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    assert!(!resp.is_ok());
    assert_eq!(resp.get_brief()["target_point"], json!([-1.0, -1.0]));
    assert_eq!(resp.get("template_keypoint_num"), Some(&json!(0)));
}

#[test]
fn fewer_points_than_clusters_use_one_cluster() {
    let points = [Point::new(10.0, 10.0), Point::new(30.0, 10.0)];
    assert_eq!(effective_k(points.len(), 3), 1);
    let clustering = kmeans(&points, 3);
    assert_eq!(clustering.clusters.len(), 1);
    let dominant = clustering.dominant().unwrap();
    assert_eq!(dominant.centroid, Point::new(20.0, 10.0));
    assert_eq!(dominant.members, 2);
}
