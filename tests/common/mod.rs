//! 集成测试共享夹具：在内存中合成可解码的条码图像。
#![allow(dead_code)]

use barcode_studio::scanner::RawImage;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// 生成一张二维码灰度图（带静区）。
pub fn qr_gray_image(text: &str) -> GrayImage {
    let code = QrCode::new(text.as_bytes()).expect("QR encode should succeed");
    code.render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(240, 240)
        .build()
}

/// 生成二维码 PNG 字节。
pub fn qr_png_bytes(text: &str) -> Vec<u8> {
    gray_to_png_bytes(&qr_gray_image(text))
}

/// 生成二维码 RGBA 像素缓冲（取景帧夹具）。
pub fn qr_raw_image(text: &str) -> RawImage {
    let gray = qr_gray_image(text);
    RawImage::from_dynamic(&DynamicImage::ImageLuma8(gray)).expect("build should succeed")
}

/// 灰度图编码为 PNG 字节。
pub fn gray_to_png_bytes(image: &GrayImage) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image.clone())
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("PNG encode should succeed");
    cursor.into_inner()
}

/// 纯白 PNG 字节（不含任何条码）。
pub fn blank_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let gray = GrayImage::from_pixel(width, height, Luma([255u8]));
    gray_to_png_bytes(&gray)
}

/// 纯白 RGBA 像素缓冲。
pub fn blank_raw_image(width: u32, height: u32) -> RawImage {
    RawImage::from_rgba(width, height, vec![255; (width * height * 4) as usize])
        .expect("build should succeed")
}

/// 渲染内容为 "123456789" 的 Code 128 灰度图。
///
/// 符号序列为预先算好的固定值：
/// StartC(105) 12 34 56 78 CodeB(100) '9'(25) 校验(79) Stop(106)，
/// 校验 = (105 + 1*12 + 2*34 + 3*56 + 4*78 + 5*100 + 6*25) mod 103 = 79。
pub fn code128_123456789_gray(module_width: u32, height: u32) -> GrayImage {
    // 每个符号 11 模块（bar/space 宽度交替，以 bar 开始）；Stop 为 13 模块。
    const SYMBOLS: &[&[u32]] = &[
        &[2, 1, 1, 2, 3, 2],    // StartC (105)
        &[1, 1, 2, 2, 3, 2],    // 12
        &[1, 3, 1, 1, 2, 3],    // 34
        &[3, 3, 1, 1, 2, 1],    // 56
        &[2, 4, 1, 1, 1, 2],    // 78
        &[1, 1, 4, 1, 3, 1],    // CodeB (100)
        &[3, 2, 1, 1, 2, 2],    // '9' (25)
        &[1, 3, 4, 1, 1, 1],    // 校验 (79)
        &[2, 3, 3, 1, 1, 1, 2], // Stop (106)
    ];
    const QUIET_MODULES: u32 = 12;

    let total_modules: u32 =
        SYMBOLS.iter().map(|s| s.iter().sum::<u32>()).sum::<u32>() + QUIET_MODULES * 2;
    let width = total_modules * module_width;

    let mut image = GrayImage::from_pixel(width, height, Luma([255u8]));
    let mut x = QUIET_MODULES * module_width;

    for symbol in SYMBOLS {
        let mut is_bar = true;
        for &run in symbol.iter() {
            let run_px = run * module_width;
            if is_bar {
                for dx in 0..run_px {
                    for y in 0..height {
                        image.put_pixel(x + dx, y, Luma([0u8]));
                    }
                }
            }
            x += run_px;
            is_bar = !is_bar;
        }
    }

    image
}

/// Code 128 "123456789" PNG 字节。
pub fn code128_png_bytes() -> Vec<u8> {
    gray_to_png_bytes(&code128_123456789_gray(3, 80))
}

/// 旋转 90° 的 Code 128 "123456789" PNG 字节。
pub fn code128_rotated_png_bytes() -> Vec<u8> {
    let gray = code128_123456789_gray(3, 80);
    let rotated = image::imageops::rotate90(&gray);
    gray_to_png_bytes(&rotated)
}
