use criterion::{criterion_group, criterion_main, Criterion};
use findit::engine::sim::mean_ssim;
use findit::feature::{detect_and_describe, HessianConfig};
use findit::kernel::compute_surface;
use findit::template::SurfacePlan;
use findit::{
    CorrMethod, Engine, ExecuteOptions, RasterBuffer, ScaleRange, TemplateEngine,
    TemplateEngineConfig,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> RasterBuffer {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    RasterBuffer::new(data, width, height).unwrap()
}

fn extract_patch(
    image: &RasterBuffer,
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
) -> RasterBuffer {
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = (y0 + y) * image.width();
        out.extend_from_slice(&image.data()[row + x0..row + x0 + width]);
    }
    RasterBuffer::new(out, width, height).unwrap()
}

fn bench_surface(c: &mut Criterion) {
    let image = make_image(320, 240);
    let template = extract_patch(&image, 100, 80, 48, 48);

    for method in [CorrMethod::CcorrNormed, CorrMethod::CcoeffNormed] {
        let plan = SurfacePlan::from_view(template.view(), method).unwrap();
        c.bench_function(&format!("surface_{}", method.name()), |b| {
            b.iter(|| black_box(compute_surface(image.view(), &plan, false).unwrap()));
        });
    }

    #[cfg(feature = "rayon")]
    {
        let plan = SurfacePlan::from_view(template.view(), CorrMethod::CcoeffNormed).unwrap();
        c.bench_function("surface_ccoeff_normed_rayon", |b| {
            b.iter(|| black_box(compute_surface(image.view(), &plan, true).unwrap()));
        });
    }
}

fn bench_template_engine(c: &mut Criterion) {
    let image = make_image(320, 240);
    let template = extract_patch(&image, 100, 80, 32, 32);
    let extras = ExecuteOptions::default();

    let single = TemplateEngine::new(TemplateEngineConfig {
        scale: ScaleRange::single(1.0),
        ..TemplateEngineConfig::default()
    })
    .unwrap();
    c.bench_function("template_engine_single_scale", |b| {
        b.iter(|| {
            black_box(
                single
                    .execute(Some(template.view()), image.view(), &extras)
                    .unwrap(),
            )
        });
    });

    let sweep = TemplateEngine::new(TemplateEngineConfig {
        scale: ScaleRange::new(1.0, 2.0, 4),
        compress_rate: 0.5,
        ..TemplateEngineConfig::default()
    })
    .unwrap();
    c.bench_function("template_engine_sweep_compressed", |b| {
        b.iter(|| {
            black_box(
                sweep
                    .execute(Some(template.view()), image.view(), &extras)
                    .unwrap(),
            )
        });
    });
}

fn bench_features(c: &mut Criterion) {
    let image = make_image(320, 240);
    let cfg = HessianConfig::default();
    c.bench_function("detect_and_describe_320x240", |b| {
        b.iter(|| black_box(detect_and_describe(image.view(), &cfg)));
    });

    let other = make_image(320, 240);
    c.bench_function("mean_ssim_320x240", |b| {
        b.iter(|| black_box(mean_ssim(image.view(), other.view(), 7).unwrap()));
    });
}

criterion_group!(benches, bench_surface, bench_template_engine, bench_features);
criterion_main!(benches);
