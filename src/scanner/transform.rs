//! # 几何变换工具
//!
//! ## 设计思路
//!
//! 为重试解码提供旋转/缩放后的图像副本。旋转角度限定在四个直角，
//! 输出画布恰好等于旋转后的包围盒，不引入额外留白。
//!
//! ## 实现思路
//!
//! - 缩放先于旋转，目标边长向下取整但钳制 >= 1px，缩放永不产出零尺寸。
//! - 缩放复用预处理模块的高质量重采样（fast_image_resize）。
//! - 旋转用 `image::imageops` 的直角旋转，90°/270° 自动交换宽高。

use image::DynamicImage;
use image::imageops;

use super::preprocess;
use super::raster::RawImage;
use super::ScanError;

/// 直角旋转枚举。级联只在这四个取值上扫描。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    /// 从角度解析；仅接受 {0, 90, 180, 270}。
    pub fn from_degrees(degrees: u32) -> Result<Self, ScanError> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Cw90),
            180 => Ok(Self::Cw180),
            270 => Ok(Self::Cw270),
            other => Err(ScanError::InvalidFormat(format!(
                "不支持的旋转角度：{}（可选：0 / 90 / 180 / 270）",
                other
            ))),
        }
    }
}

/// 生成旋转/缩放后的图像副本。
///
/// `scale` 可为分数（0.5、0.75、1.25 等），先应用缩放再绕中心旋转。
pub fn transform(image: &RawImage, scale: f32, rotation: Rotation) -> Result<RawImage, ScanError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ScanError::InvalidFormat(format!(
            "缩放系数必须为正有限值：{}",
            scale
        )));
    }

    let scaled = if (scale - 1.0).abs() < f32::EPSILON {
        image.clone()
    } else {
        let target_w = ((image.width() as f32 * scale).round() as u32).max(1);
        let target_h = ((image.height() as f32 * scale).round() as u32).max(1);
        preprocess::resize_exact(image, target_w, target_h)?
    };

    if rotation == Rotation::None {
        return Ok(scaled);
    }

    let buffer = scaled.to_rgba_image()?;
    let rotated = match rotation {
        Rotation::None => unreachable!(),
        Rotation::Cw90 => imageops::rotate90(&buffer),
        Rotation::Cw180 => imageops::rotate180(&buffer),
        Rotation::Cw270 => imageops::rotate270(&buffer),
    };

    RawImage::from_dynamic(&DynamicImage::ImageRgba8(rotated))
}
