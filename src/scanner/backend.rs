//! # 解码后端模块
//!
//! ## 设计思路
//!
//! 把“对一张图尝试一次解码”抽象为统一能力：`RawImage -> Option<ScanResult>`。
//! 级联按固定优先级迭代后端列表，后端数量与具体实现对上层透明——
//! 某个平台缺少快速通道实现时，只是列表里少一项。
//!
//! 三个具体后端：
//! - `MultiFormatBackend`：软件多码制解码（rxing），最慢但容错最好
//! - `FastPathBackend`：快速通道检测（bardecoder），延迟低、码制覆盖窄
//! - `LegacyBackend`：兜底解码（rqrr），每次调用在一次性作用域内执行
//!
//! ## 实现思路
//!
//! 后端内部的库异常一律折叠为“未命中”（`None`），绝不向级联抛出；
//! 空文本结果同样按未命中处理。

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    MultiFormatReader, RGBLuminanceSource, Reader, common::HybridBinarizer,
};

use super::raster::{RawImage, ScanResult};
use super::symbology::SymbologyTag;

/// 产品支持的码制集合（软件解码器提示用）。
static SUPPORTED_FORMATS: Lazy<HashSet<BarcodeFormat>> = Lazy::new(|| {
    HashSet::from([
        BarcodeFormat::QR_CODE,
        BarcodeFormat::CODE_128,
        BarcodeFormat::CODE_39,
        BarcodeFormat::EAN_13,
        BarcodeFormat::EAN_8,
        BarcodeFormat::UPC_A,
        BarcodeFormat::UPC_E,
        BarcodeFormat::DATA_MATRIX,
        BarcodeFormat::ITF,
        BarcodeFormat::CODABAR,
    ])
});

/// 解码后端统一能力。
///
/// 实现必须是“构建一次、调用多次”的纯函数式变换：不持有图像状态，
/// 未命中返回 `None`，内部错误不得外泄。
pub trait DecodeBackend: Send + Sync {
    /// 后端名称（日志与诊断用）。
    fn name(&self) -> &'static str;

    /// 对给定图像尝试一次解码。
    fn attempt_decode(&self, image: &RawImage) -> Option<ScanResult>;
}

/// 软件多码制解码后端（rxing `MultiFormatReader`）。
///
/// 提示集固定为产品支持的十种码制并开启 TryHarder，
/// 噪声与旋转容忍度最好，作为级联的第一优先级。
pub struct MultiFormatBackend {
    reader: Mutex<MultiFormatReader>,
    hints: DecodingHintDictionary,
}

impl MultiFormatBackend {
    pub fn new() -> Self {
        let mut hints = DecodingHintDictionary::new();
        hints.insert(
            DecodeHintType::POSSIBLE_FORMATS,
            DecodeHintValue::PossibleFormats(SUPPORTED_FORMATS.clone()),
        );
        hints.insert(
            DecodeHintType::TRY_HARDER,
            DecodeHintValue::TryHarder(true),
        );

        Self {
            reader: Mutex::new(MultiFormatReader::default()),
            hints,
        }
    }

    /// RGBA 像素打包为 0xAARRGGBB，交给亮度源。
    fn packed_pixels(image: &RawImage) -> Vec<u32> {
        let tight = image.to_tight_rgba();
        tight
            .chunks_exact(4)
            .map(|p| {
                0xFF00_0000u32 | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | (p[2] as u32)
            })
            .collect()
    }
}

impl Default for MultiFormatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeBackend for MultiFormatBackend {
    fn name(&self) -> &'static str {
        "multi-format"
    }

    fn attempt_decode(&self, image: &RawImage) -> Option<ScanResult> {
        let pixels = Self::packed_pixels(image);
        let source = RGBLuminanceSource::new_with_width_height_pixels(
            image.width() as usize,
            image.height() as usize,
            &pixels,
        );
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));

        let mut reader = self.reader.lock().ok()?;
        match reader.decode_with_hints(&mut bitmap, &self.hints) {
            Ok(result) => {
                let text = result.getText().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(ScanResult {
                    text,
                    symbology: SymbologyTag::from_rxing(result.getBarcodeFormat()),
                    snapshot: None,
                })
            }
            Err(_) => None,
        }
    }
}

/// 快速通道检测后端（bardecoder）。
///
/// 延迟低、对取景帧友好，但码制覆盖窄（二维码）。实时取景逐帧检测
/// 优先使用它；静态图级联里作为第二阶段单次尝试。
pub struct FastPathBackend;

impl FastPathBackend {
    /// 可用性探测入口：运行环境不支持快速通道时返回 `None`，
    /// 级联与取景器会自动跳过/降级该阶段。
    pub fn try_new() -> Option<Self> {
        Some(Self)
    }
}

impl DecodeBackend for FastPathBackend {
    fn name(&self) -> &'static str {
        "fast-path"
    }

    fn attempt_decode(&self, image: &RawImage) -> Option<ScanResult> {
        let buffer = image024::ImageBuffer::<image024::Rgba<u8>, Vec<u8>>::from_raw(
            image.width(),
            image.height(),
            image.to_tight_rgba(),
        )?;
        let dynamic = image024::DynamicImage::ImageRgba8(buffer);

        let decoder = bardecoder::default_decoder();
        for result in decoder.decode(&dynamic) {
            if let Ok(text) = result {
                if !text.is_empty() {
                    return Some(ScanResult {
                        text,
                        symbology: SymbologyTag::QrCode,
                        snapshot: None,
                    });
                }
            }
        }
        None
    }
}

static LEGACY_SCOPE_SEQ: AtomicU64 = AtomicU64::new(1);
static LEGACY_SCOPES_ACTIVE: AtomicU64 = AtomicU64::new(0);

/// 兜底解码的一次性作用域。
///
/// 每次调用领取一个独占作用域（递增编号），无论命中与否都在返回前释放。
struct LegacyScope {
    id: u64,
}

impl LegacyScope {
    fn acquire() -> Self {
        let id = LEGACY_SCOPE_SEQ.fetch_add(1, Ordering::Relaxed);
        LEGACY_SCOPES_ACTIVE.fetch_add(1, Ordering::SeqCst);
        log::debug!("🧹 创建兜底解码作用域 #{}", id);
        Self { id }
    }

    /// 当前未释放的作用域数量（验证释放路径用）。
    fn active_count() -> u64 {
        LEGACY_SCOPES_ACTIVE.load(Ordering::SeqCst)
    }
}

impl Drop for LegacyScope {
    fn drop(&mut self) {
        LEGACY_SCOPES_ACTIVE.fetch_sub(1, Ordering::SeqCst);
        log::debug!("🧹 释放兜底解码作用域 #{}", self.id);
    }
}

/// 兜底解码后端（rqrr）。
///
/// 级联的最后一级：其余策略全部扫空后单次尝试。
pub struct LegacyBackend;

impl LegacyBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LegacyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeBackend for LegacyBackend {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn attempt_decode(&self, image: &RawImage) -> Option<ScanResult> {
        let _scope = LegacyScope::acquire();

        let width = image.width() as usize;
        let height = image.height() as usize;
        let luma = image.to_luma8();

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) if !content.is_empty() => {
                    return Some(ScanResult {
                        text: content,
                        symbology: SymbologyTag::QrCode,
                        snapshot: None,
                    });
                }
                Ok(_) => continue,
                Err(_) => continue,
            }
        }
        None
    }
}
