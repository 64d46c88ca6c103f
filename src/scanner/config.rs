//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ScanConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中扫描档位（thorough / quick）作为高层语义，映射到底层参数扫描组合。
//!
//! 对比度系数与锐化强度这两个增强参数历史上是写死的经验值，这里保留其
//! 默认取值但作为配置暴露，便于按素材特征调整。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的参考配置。
//! - `ScanSweepProfile` 负责档位字符串解析与反向输出。
//! - `apply_sweep_profile` 将档位转换为具体的旋转/缩放扫描集。
//! - `infer_sweep_profile` 用于从当前配置反推档位（给调用方展示状态）。

use image::imageops::FilterType;

use super::transform::Rotation;
use super::ScanError;

/// 图像识别配置。
///
/// 字段覆盖了加载、预处理、参数扫描与实时取景四个阶段。
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 预处理输出宽/高单边最大值（像素）。
    pub max_dimension: u32,
    /// 对比度拉伸系数（围绕 128 中灰的线性扩展）。
    pub contrast_factor: f32,
    /// 反锐化掩模强度。
    pub sharpen_strength: f32,
    /// 预览 JPEG 编码质量（0~100）。
    pub preview_jpeg_quality: u8,
    /// 降采样滤镜策略（逐级减半与最终精确重采样共用）。
    pub resize_filter: FilterType,
    /// 参数扫描的旋转集（外层循环，按序尝试）。
    pub rotation_sweep: Vec<Rotation>,
    /// 参数扫描的缩放集（内层循环，按序尝试）。
    pub scale_sweep: Vec<f32>,
    /// 实时取景的工作分辨率单边上限（像素）。
    pub live_working_dimension: u32,
    /// 实时取景两次检测之间的间隔（毫秒）。
    pub live_frame_interval_ms: u64,
    /// 相机首选采集分辨率（获取失败时回退到设备默认）。
    pub live_target_resolution: (u32, u32),
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_dimension: 1280,
            contrast_factor: 1.3,
            sharpen_strength: 0.3,
            preview_jpeg_quality: 92,
            resize_filter: FilterType::CatmullRom,
            rotation_sweep: vec![
                Rotation::None,
                Rotation::Cw90,
                Rotation::Cw270,
                Rotation::Cw180,
            ],
            scale_sweep: vec![1.0, 0.75, 1.25],
            live_working_dimension: 640,
            live_frame_interval_ms: 100,
            live_target_resolution: (1920, 1080),
        }
    }
}

/// 扫描档位（面向产品/用户语义）。
///
/// - `Thorough`：旋转 × 缩放全网格，召回优先
/// - `Quick`：仅缩放扫描，速度优先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSweepProfile {
    Thorough,
    Quick,
}

impl ScanSweepProfile {
    /// 从外部字符串解析档位。
    pub(crate) fn from_str(profile: &str) -> Result<Self, ScanError> {
        match profile.trim().to_lowercase().as_str() {
            "thorough" => Ok(Self::Thorough),
            "quick" => Ok(Self::Quick),
            other => Err(ScanError::InvalidFormat(format!(
                "未知扫描档位：{}（可选：thorough / quick）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供调用方展示与持久化。
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Thorough => "thorough",
            Self::Quick => "quick",
        }
    }
}

impl ScanConfig {
    /// 基于当前扫描集反推档位。
    ///
    /// 用于“当前生效档位”查询场景。
    pub(crate) fn infer_sweep_profile(&self) -> ScanSweepProfile {
        if self.rotation_sweep.len() <= 1 {
            return ScanSweepProfile::Quick;
        }
        ScanSweepProfile::Thorough
    }

    /// 应用指定扫描档位到实际参数。
    ///
    /// 保持“档位语义稳定”，调用方按档位切换而无需了解底层扫描集。
    pub(crate) fn apply_sweep_profile(&mut self, profile: ScanSweepProfile) {
        match profile {
            ScanSweepProfile::Thorough => {
                self.rotation_sweep = vec![
                    Rotation::None,
                    Rotation::Cw90,
                    Rotation::Cw270,
                    Rotation::Cw180,
                ];
                self.scale_sweep = vec![1.0, 0.75, 1.25];
            }
            ScanSweepProfile::Quick => {
                self.rotation_sweep = vec![Rotation::None];
                self.scale_sweep = vec![1.0, 0.5, 0.75, 1.25, 1.5];
            }
        }
    }
}
