use findit::{
    EngineResponse, ErrorCategory, FindItError, ImageView, Point, RasterBuffer, ScaleRange,
    TemplateStore, Verbosity,
};
use serde_json::json;

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        FindItError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        FindItError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        FindItError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, FindItError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn strided_view_reads_rows() {
    let data: Vec<u8> = (0u8..12).collect();
    let view = ImageView::new(&data, 3, 3, 4).unwrap();
    assert_eq!(view.row(1).unwrap(), &[4u8, 5, 6]);
    assert_eq!(view.get(2, 2).copied(), Some(10));
    assert!(view.get(3, 0).is_none());
}

#[test]
fn raster_buffer_rejects_shape_mismatch() {
    assert!(RasterBuffer::new(vec![0; 5], 2, 2).is_err());
    assert!(RasterBuffer::new(vec![0; 3], 2, 2).is_err());
    let raster = RasterBuffer::new(vec![7; 6], 3, 2).unwrap();
    assert_eq!(raster.view().width(), 3);
    assert_eq!(raster.view().height(), 2);
}

#[test]
fn scale_range_lists_inclusive_factors() {
    let factors = ScaleRange::default().factors();
    assert_eq!(factors.len(), 11);
    let expected = [1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.2, 2.4, 2.6, 2.8, 3.0];
    for (got, want) in factors.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
    assert_eq!(ScaleRange::single(0.5).factors(), vec![0.5]);
    assert!(ScaleRange::new(2.0, 1.0, 3).validate().is_err());
    assert!(ScaleRange::new(0.0, 1.0, 3).validate().is_err());
}

#[test]
fn scale_range_serializes_as_triple() {
    let value = serde_json::to_value(ScaleRange::new(1.0, 2.0, 4)).unwrap();
    assert_eq!(value, json!([1.0, 2.0, 4]));
    let parsed: ScaleRange = serde_json::from_value(json!([0.5, 1.5, 2])).unwrap();
    assert_eq!(parsed, ScaleRange::new(0.5, 1.5, 2));
}

#[test]
fn response_partitions_brief_and_content() {
    let mut resp = EngineResponse::new();
    resp.append("conf", json!({ "k": 1 }), false);
    resp.append("target_point", Point::new(3.0, 4.0), true);
    resp.append("ok", true, true);

    let brief: Vec<_> = resp.get_brief().keys().cloned().collect();
    let content: Vec<_> = resp.get_content().keys().cloned().collect();
    assert_eq!(brief, vec!["target_point", "ok"]);
    assert_eq!(content, vec!["conf", "target_point", "ok"]);
    assert_eq!(resp.view(Verbosity::Full), resp.get_content());
    assert_eq!(resp.get_brief()["target_point"], json!([3.0, 4.0]));
}

#[test]
fn duplicate_template_name_keeps_first_entry() {
    let mut store = TemplateStore::new();
    store
        .save_raster("icon", RasterBuffer::filled(2, 2, 10).unwrap())
        .unwrap();
    let err = store
        .save_raster("icon", RasterBuffer::filled(3, 3, 20).unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        FindItError::DuplicateName {
            name: "icon".into()
        }
    );
    assert_eq!(err.category(), ErrorCategory::Configuration);

    let loaded: Vec<_> = store.load().collect::<Result<_, _>>().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].image.width(), 2);
    assert_eq!(loaded[0].image.data()[0], 10);
}
