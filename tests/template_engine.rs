//! End-to-end behaviour of the multi-scale template engine on synthetic
//! noise images.

use findit::{
    CorrMethod, Engine, EngineOptions, ExecuteOptions, FindItError, RasterBuffer, ScaleRange,
    TemplateEngine, TemplateEngineConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

fn noise(width: usize, height: usize, seed: u64) -> RasterBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height).map(|_| rng.random_range(0..=255)).collect();
    RasterBuffer::new(data, width, height).unwrap()
}

fn crop(image: &RasterBuffer, x0: usize, y0: usize, width: usize, height: usize) -> RasterBuffer {
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = (y0 + y) * image.width();
        out.extend_from_slice(&image.data()[row + x0..row + x0 + width]);
    }
    RasterBuffer::new(out, width, height).unwrap()
}

fn paste(image: &mut Vec<u8>, image_width: usize, patch: &RasterBuffer, x0: usize, y0: usize) {
    for y in 0..patch.height() {
        let dst = (y0 + y) * image_width + x0;
        let src = y * patch.width();
        image[dst..dst + patch.width()].copy_from_slice(&patch.data()[src..src + patch.width()]);
    }
}

fn point(value: &Value) -> (f64, f64) {
    let pair = value.as_array().unwrap();
    (pair[0].as_f64().unwrap(), pair[1].as_f64().unwrap())
}

fn single_scale(method: CorrMethod) -> TemplateEngine {
    TemplateEngine::new(TemplateEngineConfig {
        method,
        scale: ScaleRange::single(1.0),
        ..TemplateEngineConfig::default()
    })
    .unwrap()
}

#[test]
fn exact_subregion_is_found_at_its_centre() {
    let target = noise(160, 120, 1);
    let template = crop(&target, 50, 40, 24, 20);
    let engine = TemplateEngine::new(TemplateEngineConfig::default()).unwrap();

    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    assert!(resp.is_ok());
    let brief = resp.get_brief();
    let (x, y) = point(&brief["target_point"]);
    assert!((x - 62.0).abs() <= 1.0, "x = {x}");
    assert!((y - 50.0).abs() <= 1.0, "y = {y}");
    assert!(brief["target_sim"].as_f64().unwrap() > 0.98);
    assert_eq!(resp.get("raw").unwrap()["scale"].as_f64(), Some(1.0));
}

#[test]
fn sweep_stops_at_first_oversized_scale() {
    let target = noise(100, 100, 2);
    let template = crop(&target, 10, 10, 40, 40);
    let engine = TemplateEngine::new(TemplateEngineConfig::default()).unwrap();

    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    let scales = resp.get("scales").unwrap().as_array().unwrap();
    // 1.0 ..= 2.4 fit; 2.6 would need 104 px
    assert_eq!(scales.len(), 8);
    let last = scales.last().unwrap();
    assert_eq!(last["width"].as_u64(), Some(96));
}

#[test]
fn two_distant_pastes_give_two_candidates() {
    let template = noise(16, 16, 3);
    let mut data = noise(140, 100, 4).into_data();
    paste(&mut data, 140, &template, 20, 20);
    paste(&mut data, 140, &template, 80, 50);
    let target = RasterBuffer::new(data, 140, 100).unwrap();

    let engine = single_scale(CorrMethod::CcoeffNormed);
    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    let raw = resp.get("raw").unwrap();
    let all: Vec<_> = raw["all"].as_array().unwrap().iter().map(point).collect();
    assert_eq!(all.len(), 2, "{all:?}");
    for (want_x, want_y) in [(28.0, 28.0), (88.0, 58.0)] {
        assert!(
            all.iter()
                .any(|&(x, y)| (x - want_x).abs() <= 2.0 && (y - want_y).abs() <= 2.0),
            "missing ({want_x}, {want_y}) in {all:?}"
        );
    }
    assert_eq!(raw["truncated"], Value::Bool(false));
}

#[test]
fn close_matches_collapse_to_one_candidate() {
    // columns repeat with period 3, so placements 3 px apart both match exactly
    let mut rng = StdRng::seed_from_u64(5);
    let columns: Vec<Vec<u8>> = (0..3)
        .map(|_| (0..16).map(|_| rng.random_range(0..=255)).collect())
        .collect();
    let strip_width = 19;
    let strip: Vec<u8> = (0..16)
        .flat_map(|y| (0..strip_width).map(|x| columns[x % 3][y]).collect::<Vec<_>>())
        .collect();
    let strip = RasterBuffer::new(strip, strip_width, 16).unwrap();
    let template = crop(&strip, 0, 0, 16, 16);

    let mut data = noise(120, 80, 6).into_data();
    paste(&mut data, 120, &strip, 30, 30);
    let target = RasterBuffer::new(data, 120, 80).unwrap();

    let engine = single_scale(CorrMethod::CcoeffNormed);
    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    let all = resp.get("raw").unwrap()["all"].as_array().unwrap().clone();
    assert_eq!(all.len(), 1, "{all:?}");
}

#[test]
fn candidate_limit_truncates() {
    let template = noise(8, 8, 7);
    let mut data = noise(120, 40, 8).into_data();
    for i in 0..5 {
        paste(&mut data, 120, &template, 4 + i * 22, 16);
    }
    let target = RasterBuffer::new(data, 120, 40).unwrap();

    let engine = TemplateEngine::new(TemplateEngineConfig {
        method: CorrMethod::CcoeffNormed,
        scale: ScaleRange::single(1.0),
        multi_target_limit: 3,
        ..TemplateEngineConfig::default()
    })
    .unwrap();
    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    let raw = resp.get("raw").unwrap();
    assert_eq!(raw["all"].as_array().unwrap().len(), 3);
    assert_eq!(raw["truncated"], Value::Bool(true));
    assert!(!resp.get_brief().contains_key("raw"));
}

#[test]
fn compressed_search_reports_original_coordinates() {
    let small = noise(100, 80, 9);
    let template = crop(&small, 40, 30, 20, 16);
    let mut big = Vec::with_capacity(200 * 160);
    for y in 0..160 {
        for x in 0..200 {
            big.push(small.data()[(y / 2) * 100 + x / 2]);
        }
    }
    let target = RasterBuffer::new(big, 200, 160).unwrap();

    let engine = TemplateEngine::new(TemplateEngineConfig {
        scale: ScaleRange::single(1.0),
        compress_rate: 0.5,
        ..TemplateEngineConfig::default()
    })
    .unwrap();
    let resp = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    let (x, y) = point(&resp.get_brief()["target_point"]);
    assert!((x - 100.0).abs() <= 1.0, "x = {x}");
    assert!((y - 76.0).abs() <= 1.0, "y = {y}");
}

#[test]
fn masked_pixels_are_ignored() {
    let target = noise(90, 70, 10);
    let mut template = crop(&target, 30, 25, 20, 20).into_data();
    let mut mask = vec![255u8; 20 * 20];
    for y in 6..14 {
        for x in 6..14 {
            template[y * 20 + x] = 255 - template[y * 20 + x];
            mask[y * 20 + x] = 0;
        }
    }
    let template = RasterBuffer::new(template, 20, 20).unwrap();
    let mask = RasterBuffer::new(mask, 20, 20).unwrap();

    let engine = single_scale(CorrMethod::CcoeffNormed);
    let resp = engine
        .execute(
            Some(template.view()),
            target.view(),
            &ExecuteOptions::with_mask(mask.view()),
        )
        .unwrap();
    let brief = resp.get_brief();
    let (x, y) = point(&brief["target_point"]);
    assert!((x - 40.0).abs() <= 1.0 && (y - 35.0).abs() <= 1.0, "({x}, {y})");
    assert!(brief["target_sim"].as_f64().unwrap() > 0.99);
}

#[test]
fn mask_of_another_shape_is_resized_to_the_template() {
    let target = noise(90, 70, 14);
    let mut template = crop(&target, 30, 25, 20, 20).into_data();
    // a 5x2 mask stretches each pixel over a 4x10 block of the template
    let mut mask = vec![255u8; 5 * 2];
    mask[5 + 2] = 0;
    for y in 10..20 {
        for x in 8..12 {
            template[y * 20 + x] = 255 - template[y * 20 + x];
        }
    }
    let template = RasterBuffer::new(template, 20, 20).unwrap();
    let mask = RasterBuffer::new(mask, 5, 2).unwrap();
    let engine = single_scale(CorrMethod::CcoeffNormed);

    let masked = engine
        .execute(
            Some(template.view()),
            target.view(),
            &ExecuteOptions::with_mask(mask.view()),
        )
        .unwrap();
    let brief = masked.get_brief();
    let (x, y) = point(&brief["target_point"]);
    assert!((x - 40.0).abs() <= 1.0 && (y - 35.0).abs() <= 1.0, "({x}, {y})");
    assert!(brief["target_sim"].as_f64().unwrap() > 0.99);

    let unmasked = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap();
    assert!(unmasked.get_brief()["target_sim"].as_f64().unwrap() < 0.99);
}

#[test]
fn oversized_template_has_no_candidate_scale() {
    let target = noise(40, 40, 11);
    let template = noise(50, 50, 12);
    let engine = TemplateEngine::new(TemplateEngineConfig::default()).unwrap();
    let err = engine
        .execute(Some(template.view()), target.view(), &ExecuteOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        FindItError::NoCandidateScale {
            template_width: 50,
            template_height: 50,
            target_width: 40,
            target_height: 40,
        }
    );
}

#[test]
fn squared_difference_methods_are_rejected() {
    for name in ["cv2.TM_SQDIFF", "cv2.TM_SQDIFF_NORMED"] {
        let opts = EngineOptions {
            engine_template_cv_method_name: Some(name.to_string()),
            ..EngineOptions::default()
        };
        let err = TemplateEngine::from_options(&opts).unwrap_err();
        assert_eq!(
            err,
            FindItError::UnsupportedMethod {
                name: name.to_string()
            }
        );
    }
}
