//! # 预处理流水线模块
//!
//! ## 设计思路
//!
//! 将任意尺寸的源图片规整为便于条码识别的有界增强图：
//! 先校验与解码，再逐级降采样到上限尺寸，最后做对比度拉伸与反锐化。
//! 一次性大比例缩放会抹掉区分条宽所需的高频边缘，这里按 mipmap 思路
//! 反复减半（阈值固定为目标的 2 倍），再做一次精确重采样。
//!
//! ## 实现思路
//!
//! 1. 文件签名校验（magic bytes）后完整解码
//! 2. 超界时按 `min(maxW/w, maxH/h)` 等比缩放，四舍五入到像素
//! 3. 对比度：每个 RGB 通道 `v * f + 128 * (1 - f)` 后钳制到 [0,255]
//! 4. 锐化：内部像素取四邻均值做反锐化掩模，一像素边框原样保留
//! 5. 产出预览 JPEG Data URL（仅供展示，算法不回读）

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::config::ScanConfig;
use super::raster::{PreparedScanImage, RawImage};
use super::ScanError;

/// 将原始字节解码为 RGBA 像素缓冲。
///
/// 先用文件签名快速拒绝非图片输入，再交给 `image` 完整解码。
pub fn decode_source_bytes(bytes: &[u8], config: &ScanConfig) -> Result<RawImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::Load("图片内容为空".to_string()));
    }

    if bytes.len() as u64 > config.max_file_size {
        return Err(ScanError::Resource(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            bytes.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| ScanError::Load("无法识别图片类型".to_string()))?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ScanError::Load(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ScanError::Load(format!("图片解码失败：{}", e)))?;

    RawImage::from_dynamic(&decoded)
}

/// 计算有界等比缩放目标；源图未超界时返回 `None`。
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let ratio = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    let target_w = ((width as f64 * ratio).round() as u32).max(1);
    let target_h = ((height as f64 * ratio).round() as u32).max(1);
    Some((target_w, target_h))
}

/// 高质量精确重采样（CatmullRom，双三次等效）。
pub fn resize_exact(image: &RawImage, target_w: u32, target_h: u32) -> Result<RawImage, ScanError> {
    resize_with_filter(image, target_w, target_h, FilterType::CatmullRom)
}

/// 按指定滤镜执行一次精确重采样。
pub fn resize_with_filter(
    image: &RawImage,
    target_w: u32,
    target_h: u32,
    filter: FilterType,
) -> Result<RawImage, ScanError> {
    if target_w == 0 || target_h == 0 {
        return Err(ScanError::InvalidFormat(format!(
            "重采样目标尺寸必须为正：{}x{}",
            target_w, target_h
        )));
    }

    if target_w == image.width() && target_h == image.height() {
        return Ok(image.clone());
    }

    let src_image = fr::images::Image::from_vec_u8(
        image.width(),
        image.height(),
        image.to_tight_rgba(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ScanError::Resource(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_w, target_h, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ScanError::Resource(format!("fast_image_resize 执行失败：{}", e)))?;

    RawImage::from_rgba(target_w, target_h, dst_image.into_vec())
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

/// 逐级降采样：两个轴都超过目标 2 倍时反复减半，最后一步精确到目标尺寸。
///
/// 阈值固定为 2 倍：这是与单步大比例缩放拉开质量差距的关键参数。
pub fn downscale_stepped(
    image: &RawImage,
    target_w: u32,
    target_h: u32,
    filter: FilterType,
) -> Result<RawImage, ScanError> {
    let mut current = image.clone();
    let mut steps = 0u32;

    while current.width() > target_w * 2 && current.height() > target_h * 2 {
        let half_w = (current.width() / 2).max(1);
        let half_h = (current.height() / 2).max(1);
        current = resize_with_filter(&current, half_w, half_h, filter)?;
        steps += 1;
    }

    if current.width() != target_w || current.height() != target_h {
        current = resize_with_filter(&current, target_w, target_h, filter)?;
    }

    log::debug!(
        "🧩 逐级降采样：{}x{} -> {}x{}（减半 {} 次）",
        image.width(),
        image.height(),
        target_w,
        target_h,
        steps
    );

    Ok(current)
}

/// 对比度拉伸：围绕 128 中灰的线性扩展，Alpha 不变。
pub fn contrast_stretch(image: &RawImage, factor: f32) -> RawImage {
    let offset = 128.0 * (1.0 - factor);
    let width = image.width() as usize;
    let height = image.height() as usize;
    let stride = image.stride();
    let src = image.bytes();

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &src[y * stride..];
        for x in 0..width {
            let base = x * 4;
            for c in 0..3 {
                let v = row[base + c] as f32 * factor + offset;
                out.push(v.clamp(0.0, 255.0) as u8);
            }
            out.push(row[base + 3]);
        }
    }

    RawImage::from_rgba(image.width(), image.height(), out)
        .expect("contrast output preserves dimensions")
}

/// 反锐化掩模：四邻均值近似模糊，仅处理内部像素，一像素边框原样复制。
pub fn unsharp_mask(image: &RawImage, strength: f32) -> RawImage {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let tight = image.to_tight_rgba();
    let mut out = tight.clone();

    if width > 2 && height > 2 {
        let row_bytes = width * 4;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * row_bytes + x * 4;
                for c in 0..3 {
                    let center = tight[idx + c] as f32;
                    let top = tight[idx - row_bytes + c] as f32;
                    let bottom = tight[idx + row_bytes + c] as f32;
                    let left = tight[idx - 4 + c] as f32;
                    let right = tight[idx + 4 + c] as f32;

                    let blurred = (top + bottom + left + right) / 4.0;
                    let sharpened = center + strength * (center - blurred);
                    out[idx + c] = sharpened.clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    RawImage::from_rgba(image.width(), image.height(), out)
        .expect("sharpen output preserves dimensions")
}

/// 将像素缓冲编码为 JPEG Data URL（丢弃 Alpha）。
pub fn preview_data_uri(image: &RawImage, quality: u8) -> Result<String, ScanError> {
    let tight = image.to_tight_rgba();
    let mut rgb = Vec::with_capacity(tight.len() / 4 * 3);
    for pixel in tight.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder
        .encode(
            &rgb,
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ScanError::Resource(format!("预览 JPEG 编码失败：{}", e)))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(&encoded)
    ))
}

/// 仅做有界降采样，不做增强（实时取景的工作帧使用）。
pub fn shrink_to_bound(
    image: &RawImage,
    max_dimension: u32,
    filter: FilterType,
) -> Result<RawImage, ScanError> {
    match bounded_dimensions(image.width(), image.height(), max_dimension) {
        Some((w, h)) => downscale_stepped(image, w, h, filter),
        None => Ok(image.clone()),
    }
}

/// 完整预处理：解码 → 有界降采样 → 对比度 → 锐化 → 预览编码。
pub fn preprocess(bytes: &[u8], config: &ScanConfig) -> Result<PreparedScanImage, ScanError> {
    let decoded = decode_source_bytes(bytes, config)?;

    let resized = match bounded_dimensions(decoded.width(), decoded.height(), config.max_dimension)
    {
        Some((w, h)) => downscale_stepped(&decoded, w, h, config.resize_filter)?,
        None => decoded,
    };

    let contrasted = contrast_stretch(&resized, config.contrast_factor);
    let enhanced = unsharp_mask(&contrasted, config.sharpen_strength);
    let preview = preview_data_uri(&enhanced, config.preview_jpeg_quality)?;

    Ok(PreparedScanImage {
        enhanced,
        preview_data_uri: preview,
    })
}
