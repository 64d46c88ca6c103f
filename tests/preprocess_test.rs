//! 预处理流水线的可测性质：尺寸上界、纵横比保持、像素核的边界行为。

mod common;

use barcode_studio::scanner::preprocess::{
    bounded_dimensions, contrast_stretch, downscale_stepped, preprocess, unsharp_mask,
};
use barcode_studio::scanner::{RawImage, ScanConfig};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use proptest::prelude::*;
use std::io::Cursor;

fn gradient_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let gray = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) % 256) as u8]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("PNG encode should succeed");
    cursor.into_inner()
}

#[test]
fn resize_bound_is_enforced() {
    let config = ScanConfig::default();
    let prepared =
        preprocess(&gradient_png_bytes(3000, 2000), &config).expect("preprocess should succeed");

    let (w, h) = (prepared.enhanced.width(), prepared.enhanced.height());
    assert!(w.max(h) <= 1280, "输出单边超出上限：{}x{}", w, h);
    assert_eq!((w, h), (1280, 853));
}

#[test]
fn small_images_keep_their_dimensions() {
    let config = ScanConfig::default();
    let prepared =
        preprocess(&gradient_png_bytes(1280, 720), &config).expect("preprocess should succeed");
    assert_eq!(
        (prepared.enhanced.width(), prepared.enhanced.height()),
        (1280, 720)
    );

    let tiny = preprocess(&gradient_png_bytes(64, 48), &config).expect("preprocess should succeed");
    assert_eq!((tiny.enhanced.width(), tiny.enhanced.height()), (64, 48));
}

#[test]
fn aspect_ratio_is_preserved_within_rounding() {
    let config = ScanConfig::default();
    let cases = [(3000u32, 2000u32), (2000, 3000), (5333, 911), (1281, 1281)];

    for (orig_w, orig_h) in cases {
        let prepared =
            preprocess(&gradient_png_bytes(orig_w, orig_h), &config).expect("preprocess should succeed");
        let (w, h) = (prepared.enhanced.width(), prepared.enhanced.height());

        let expected_h = (orig_h as f64 * w as f64 / orig_w as f64).round() as i64;
        assert!(
            (expected_h - h as i64).abs() <= 1,
            "{}x{} -> {}x{} 纵横比漂移超过 1px",
            orig_w,
            orig_h,
            w,
            h
        );
    }
}

#[test]
fn preview_is_always_returned() {
    let config = ScanConfig::default();
    let prepared =
        preprocess(&common::blank_png_bytes(320, 240), &config).expect("preprocess should succeed");
    assert!(prepared.preview_data_uri.starts_with("data:image/jpeg;base64,"));
}

#[test]
fn stepped_downscale_halves_until_within_double_target() {
    // 8000x500 -> 目标 1280x80：两轴都 > 2 倍目标时才继续减半
    let img = RawImage::from_rgba(8000, 500, vec![200; 8000 * 500 * 4]).expect("build should succeed");
    let out =
        downscale_stepped(&img, 1280, 80, FilterType::CatmullRom).expect("downscale should succeed");
    assert_eq!((out.width(), out.height()), (1280, 80));
}

proptest! {
    #[test]
    fn contrast_output_stays_in_byte_range(
        r in 0u8..=255,
        g in 0u8..=255,
        b in 0u8..=255,
        factor in 0.5f32..3.0,
    ) {
        let img = RawImage::from_rgba(1, 1, vec![r, g, b, 255]).expect("build should succeed");
        let out = contrast_stretch(&img, factor);
        let pixel = out.pixel(0, 0);

        let expected = |v: u8| -> u8 {
            (v as f32 * factor + 128.0 * (1.0 - factor)).clamp(0.0, 255.0) as u8
        };
        prop_assert_eq!(pixel[0], expected(r));
        prop_assert_eq!(pixel[1], expected(g));
        prop_assert_eq!(pixel[2], expected(b));
        prop_assert_eq!(pixel[3], 255);
    }

    #[test]
    fn sharpen_border_is_byte_identical(pixels in proptest::collection::vec(0u8..=255, 64)) {
        // 8x8 灰度噪声图：锐化后一像素边框与输入完全一致
        let mut rgba = Vec::with_capacity(64 * 4);
        for v in &pixels {
            rgba.extend_from_slice(&[*v, *v, *v, 255]);
        }
        let img = RawImage::from_rgba(8, 8, rgba).expect("build should succeed");
        let out = unsharp_mask(&img, 0.3);

        for x in 0..8 {
            prop_assert_eq!(out.pixel(x, 0), img.pixel(x, 0));
            prop_assert_eq!(out.pixel(x, 7), img.pixel(x, 7));
        }
        for y in 0..8 {
            prop_assert_eq!(out.pixel(0, y), img.pixel(0, y));
            prop_assert_eq!(out.pixel(7, y), img.pixel(7, y));
        }
    }

    #[test]
    fn sharpen_output_stays_in_byte_range(
        pixels in proptest::collection::vec(0u8..=255, 36),
        strength in 0.0f32..2.0,
    ) {
        let mut rgba = Vec::with_capacity(36 * 4);
        for v in &pixels {
            rgba.extend_from_slice(&[*v, *v, *v, 255]);
        }
        let img = RawImage::from_rgba(6, 6, rgba).expect("build should succeed");
        let out = unsharp_mask(&img, strength);

        for y in 0..6 {
            for x in 0..6 {
                let p = out.pixel(x, y);
                prop_assert_eq!(p[3], 255);
            }
        }
    }

    #[test]
    fn bounded_dimensions_never_exceed_limit(w in 1u32..6000, h in 1u32..6000) {
        match bounded_dimensions(w, h, 1280) {
            None => {
                prop_assert!(w <= 1280 && h <= 1280);
            }
            Some((tw, th)) => {
                prop_assert!(tw <= 1280 && th <= 1280);
                prop_assert!(tw >= 1 && th >= 1);
            }
        }
    }
}
