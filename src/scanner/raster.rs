//! # 像素数据与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入字节”和“流水线中间结果”解耦：
//! - `RawImage` 表示一块已解码的 RGBA 像素缓冲（宽/高/行距不可变）
//! - `PreparedScanImage` 表示预处理阶段输出（增强图 + 预览 Data URL）
//! - `ScanRequest` 表示外部来源语义
//!
//! 流水线各阶段不做原地修改：每个会改动像素的阶段都返回新的 `RawImage`，
//! 输入图保持可复用。

use image::{DynamicImage, ImageBuffer, Rgba};

use super::symbology::SymbologyTag;
use super::ScanError;

/// 扫描输入来源。
pub enum ScanRequest {
    /// 原始图片字节（任意宿主可解码格式）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(String),
}

/// 一块 RGBA 像素缓冲。
///
/// 宽高恒为正整数；`stride` 为每行字节数（`>= width * 4`），创建后不可变。
/// 相机后端可能带行尾填充，统一在这里处理，下游算法无需关心。
#[derive(Debug, Clone)]
pub struct RawImage {
    width: u32,
    height: u32,
    stride: usize,
    bytes: Vec<u8>,
}

impl RawImage {
    /// 从紧密排列（无行尾填充）的 RGBA 字节构建。
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, ScanError> {
        Self::from_rgba_with_stride(width, height, width as usize * 4, bytes)
    }

    /// 从带行距的 RGBA 字节构建（相机帧常见形态）。
    pub fn from_rgba_with_stride(
        width: u32,
        height: u32,
        stride: usize,
        bytes: Vec<u8>,
    ) -> Result<Self, ScanError> {
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidFormat(format!(
                "图像尺寸必须为正：{}x{}",
                width, height
            )));
        }
        if stride < width as usize * 4 {
            return Err(ScanError::InvalidFormat(format!(
                "行距过小：stride={} width={}",
                stride, width
            )));
        }
        let expected = stride
            .checked_mul(height as usize)
            .ok_or_else(|| ScanError::Resource("图像尺寸导致内存溢出风险".to_string()))?;
        if bytes.len() < expected {
            return Err(ScanError::InvalidFormat(format!(
                "像素数据长度异常：{}（预期 >= {}）",
                bytes.len(),
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            bytes,
        })
    }

    /// 从 `image` 解码结果构建（统一转 RGBA8）。
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, ScanError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 每行字节数。
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 读取单个像素（RGBA）。调用方保证坐标在界内。
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = y as usize * self.stride + x as usize * 4;
        [
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ]
    }

    /// 去除行尾填充，输出紧密排列的 RGBA 字节。
    pub fn to_tight_rgba(&self) -> Vec<u8> {
        let row_bytes = self.width as usize * 4;
        if self.stride == row_bytes {
            return self.bytes.clone();
        }

        let mut out = Vec::with_capacity(row_bytes * self.height as usize);
        for y in 0..self.height as usize {
            let start = y * self.stride;
            out.extend_from_slice(&self.bytes[start..start + row_bytes]);
        }
        out
    }

    /// 转换为 `image` 的 RGBA 缓冲（用于重采样与编码）。
    pub fn to_rgba_image(&self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>, ScanError> {
        ImageBuffer::from_raw(self.width, self.height, self.to_tight_rgba())
            .ok_or_else(|| ScanError::Resource("RGBA 缓冲构建失败".to_string()))
    }

    /// 按 BT.601 加权转换为灰度字节（解码后端的统一输入形态）。
    pub fn to_luma8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height as usize {
            let row = &self.bytes[y * self.stride..];
            for x in 0..self.width as usize {
                let r = row[x * 4] as u32;
                let g = row[x * 4 + 1] as u32;
                let b = row[x * 4 + 2] as u32;
                out.push(((r * 299 + g * 587 + b * 114) / 1000) as u8);
            }
        }
        out
    }
}

/// 预处理阶段输出：增强后的图像与预览 Data URL。
///
/// `preview_data_uri` 仅用于界面展示与失败归因，算法本身不依赖其往返精度。
pub struct PreparedScanImage {
    pub enhanced: RawImage,
    pub preview_data_uri: String,
}

/// 一次成功识别的结果。
///
/// `text` 恒为非空：空文本按未命中处理，不会出现在这里。
/// `snapshot` 为识别命中瞬间的像素快照，仅供展示与审计。
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub text: String,
    pub symbology: SymbologyTag,
    pub snapshot: Option<RawImage>,
}
