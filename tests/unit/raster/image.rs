use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_dimensions_and_pixels() {
    let bytes = png_bytes(3, 2, [10, 20, 30, 255]);
    let img = RasterImage::decode(&bytes).unwrap();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.pixel(2, 1), [10, 20, 30, 255]);
    assert_eq!(img.as_rgba8().len(), 3 * 2 * 4);
}

#[test]
fn decode_garbage_is_a_decode_error() {
    let err = RasterImage::decode(b"not an image").unwrap_err();
    assert!(matches!(err, MaskeditError::Decode(_)));
}

#[test]
fn from_rgba8_validates_length_and_dims() {
    assert!(RasterImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
    assert!(RasterImage::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(RasterImage::from_rgba8(0, 2, vec![]).is_err());
}

#[test]
fn encode_png_roundtrips_dimensions() {
    let img = RasterImage::from_rgba8(4, 3, vec![128; 4 * 3 * 4]).unwrap();
    let png = img.encode_png().unwrap();
    let back = RasterImage::decode(&png).unwrap();
    assert_eq!(back.dimensions(), (4, 3));
    assert_eq!(back.pixel(0, 0), [128, 128, 128, 128]);
}

#[test]
fn resample_matching_dimensions_is_cheap_identity() {
    let img = RasterImage::from_rgba8(4, 4, vec![7; 64]).unwrap();
    let same = img.resample(4, 4).unwrap();
    assert_eq!(same.as_rgba8(), img.as_rgba8());
}

#[test]
fn resample_changes_dimensions_and_keeps_solid_color() {
    let img = RasterImage::from_rgba8(2, 2, vec![200; 16]).unwrap();
    let up = img.resample(8, 6).unwrap();
    assert_eq!(up.dimensions(), (8, 6));
    // Bilinear resampling of a solid color stays that color.
    assert_eq!(up.pixel(4, 3), [200, 200, 200, 200]);
    assert!(img.resample(0, 6).is_err());
}

#[test]
fn unpremultiply_inverts_partial_alpha() {
    // 50% alpha, premultiplied channel value 64 -> straight ~128.
    let mut px = vec![64, 64, 64, 128];
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px[3], 128);
    assert!((px[0] as i16 - 128).abs() <= 1);

    // Zero alpha stays untouched.
    let mut zero = vec![0, 0, 0, 0];
    unpremultiply_rgba8_in_place(&mut zero);
    assert_eq!(zero, vec![0, 0, 0, 0]);
}
