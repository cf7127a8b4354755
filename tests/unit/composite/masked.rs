use super::*;

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RasterImage {
    let px: Vec<u8> = rgba
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect();
    RasterImage::from_rgba8(width, height, px).unwrap()
}

fn patterned(width: u32, height: u32) -> RasterImage {
    let mut px = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            px.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 100, 255]);
        }
    }
    RasterImage::from_rgba8(width, height, px).unwrap()
}

#[test]
fn zero_coverage_returns_original_exactly() {
    let original = patterned(8, 8);
    let edited = solid(8, 8, [0, 0, 255, 255]);
    let mask = solid(8, 8, [255, 0, 0, 0]); // colored but fully transparent

    let out = composite_images(&original, &edited, &mask).unwrap();
    assert_eq!(out.as_rgba8(), original.as_rgba8());
}

#[test]
fn full_coverage_returns_edited_exactly() {
    let original = patterned(8, 8);
    let edited = solid(8, 8, [0, 0, 255, 255]);
    let mask = solid(8, 8, [1, 2, 3, 255]);

    let out = composite_images(&original, &edited, &mask).unwrap();
    assert_eq!(out.as_rgba8(), edited.as_rgba8());
}

#[test]
fn full_coverage_with_mismatched_edited_resamples_to_original() {
    let original = patterned(8, 8);
    let edited = solid(4, 4, [0, 0, 255, 255]);
    let mask = solid(16, 16, [0, 0, 0, 255]);

    let out = composite_images(&original, &edited, &mask).unwrap();
    assert_eq!(out.dimensions(), (8, 8));
    assert_eq!(out.pixel(0, 0), [0, 0, 255, 255]);
    assert_eq!(out.pixel(7, 7), [0, 0, 255, 255]);
}

#[test]
fn partial_coverage_blends_proportionally() {
    let original = solid(4, 4, [0, 0, 0, 255]);
    let edited = solid(4, 4, [255, 255, 255, 255]);
    let mask = solid(4, 4, [0, 0, 0, 128]);

    let out = composite_images(&original, &edited, &mask).unwrap();
    assert_eq!(out.pixel(1, 1), [128, 128, 128, 255]);
}

#[test]
fn mask_color_is_ignored_only_alpha_matters() {
    let original = patterned(8, 8);
    let edited = solid(8, 8, [0, 0, 255, 255]);
    let red_mask = solid(8, 8, [255, 0, 0, 200]);
    let green_mask = solid(8, 8, [0, 255, 0, 200]);

    let a = composite_images(&original, &edited, &red_mask).unwrap();
    let b = composite_images(&original, &edited, &green_mask).unwrap();
    assert_eq!(a.as_rgba8(), b.as_rgba8());
}

#[test]
fn half_painted_mask_splits_the_output() {
    let original = solid(8, 8, [255, 0, 0, 255]);
    let edited = solid(8, 8, [0, 0, 255, 255]);

    // Left half painted, right half untouched.
    let mut px = Vec::new();
    for _y in 0..8 {
        for x in 0..8 {
            let a = if x < 4 { 255 } else { 0 };
            px.extend_from_slice(&[255, 255, 255, a]);
        }
    }
    let mask = RasterImage::from_rgba8(8, 8, px).unwrap();

    let out = composite_images(&original, &edited, &mask).unwrap();
    assert_eq!(out.pixel(0, 4), [0, 0, 255, 255]);
    assert_eq!(out.pixel(7, 4), [255, 0, 0, 255]);
}

#[test]
fn over_in_place_unions_premultiplied_coverage() {
    // Opaque source replaces, transparent source is a no-op.
    let mut dst = vec![0, 0, 0, 0, 10, 20, 30, 255];
    let src = vec![100, 50, 25, 255, 0, 0, 0, 0];
    over_in_place(&mut dst, &src);
    assert_eq!(&dst[..4], &[100, 50, 25, 255]);
    assert_eq!(&dst[4..], &[10, 20, 30, 255]);

    // Partial source alpha over an opaque destination stays opaque.
    let mut dst = vec![0, 0, 0, 255];
    over_in_place(&mut dst, &[64, 64, 64, 128]);
    assert_eq!(dst[3], 255);
    assert!(dst[0] >= 63 && dst[0] <= 65);
}

#[test]
fn encoded_entry_point_reports_which_input_failed() {
    let good = patterned(4, 4).encode_png().unwrap();

    let err = composite(b"junk", &good, &good).unwrap_err();
    assert!(err.to_string().contains("original image"));

    let err = composite(&good, b"junk", &good).unwrap_err();
    assert!(err.to_string().contains("edited image"));

    let err = composite(&good, &good, b"junk").unwrap_err();
    assert!(err.to_string().contains("mask image"));
}

#[test]
fn encoded_entry_point_matches_image_entry_point() {
    let original = patterned(8, 8);
    let edited = solid(8, 8, [0, 0, 255, 255]);
    let mask = solid(8, 8, [0, 0, 0, 128]);

    let via_bytes = composite(
        &original.encode_png().unwrap(),
        &edited.encode_png().unwrap(),
        &mask.encode_png().unwrap(),
    )
    .unwrap();
    let via_images = composite_images(&original, &edited, &mask).unwrap();
    assert_eq!(via_bytes.as_rgba8(), via_images.as_rgba8());
}
