//! # 解码策略级联（核心编排）
//!
//! ## 设计思路
//!
//! `ScanPipeline` 只负责流程编排与配置管理。给定一张预处理后的图像，
//! 按固定优先级在 (后端 × 变换参数) 组合上顺序尝试，第一次命中即返回；
//! 全部扫空才判定失败。优先级编排是速度与召回之间的既定折衷：
//!
//! 1. 软件多码制解码：旋转（外层）× 缩放（内层）全网格扫描
//! 2. 快速通道检测：对未旋转增强图单次尝试（该阶段可能缺席）
//! 3. 兜底解码：一次性作用域内单次尝试
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ScanConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 尝试严格串行：上一次 (后端, 参数) 定论之前不开始下一次。
//! - 后端内部失败一律视为该组合未命中，绝不中断剩余搜索；
//!   只有资源类失败（缓冲无法分配）作为硬错误向上传播。
//! - 预览 Data URL 无论成败都返回，便于调用方归因。
//! - 记录 `load/preprocess/cascade/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::backend::{DecodeBackend, FastPathBackend, LegacyBackend, MultiFormatBackend};
use super::config::ScanConfig;
use super::preprocess;
use super::raster::{RawImage, ScanRequest, ScanResult};
use super::transform::{self, Rotation};
use super::ScanError;

/// 某个级联阶段的参数扫描方式。
pub enum SweepKind {
    /// 旋转 × 缩放全网格（旋转为外层循环）。
    Grid,
    /// 仅对未旋转增强图单次尝试。
    Single,
}

/// 级联中的一个阶段：后端 + 扫描方式。
pub struct CascadeStage {
    pub backend: Box<dyn DecodeBackend>,
    pub sweep: SweepKind,
}

/// 一次识别请求的最终结论。
pub struct ScanOutcome {
    /// 命中结果；全部策略扫空时为 `None`。
    pub result: Option<ScanResult>,
    /// 被分析图像的预览 Data URL（成败皆有）。
    pub preview_data_uri: String,
}

/// 识别流水线。
///
/// 封装配置状态与按优先级排列的后端阶段列表。
pub struct ScanPipeline {
    pub(super) config: Arc<RwLock<ScanConfig>>,
    stages: Vec<CascadeStage>,
}

impl ScanPipeline {
    /// 根据初始配置创建流水线，装配默认后端阶梯。
    pub fn new(config: ScanConfig) -> Self {
        let mut stages = vec![CascadeStage {
            backend: Box::new(MultiFormatBackend::new()) as Box<dyn DecodeBackend>,
            sweep: SweepKind::Grid,
        }];

        match FastPathBackend::try_new() {
            Some(fast) => stages.push(CascadeStage {
                backend: Box::new(fast),
                sweep: SweepKind::Single,
            }),
            None => log::info!("⚡ 当前环境无快速通道检测，级联将跳过该阶段"),
        }

        stages.push(CascadeStage {
            backend: Box::new(LegacyBackend::new()),
            sweep: SweepKind::Single,
        });

        Self::with_stages(config, stages)
    }

    /// 使用自定义阶段列表创建流水线。
    ///
    /// 主要用于测试或按场景注入不同后端组合。
    pub fn with_stages(config: ScanConfig, stages: Vec<CascadeStage>) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            stages,
        }
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(super) fn config_snapshot(&self) -> Result<ScanConfig, ScanError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ScanError::Resource("配置读取锁已中毒".to_string()))
    }

    /// 识别主入口：从任意来源加载并执行完整级联。
    pub fn scan_request(&self, request: ScanRequest) -> Result<ScanOutcome, ScanError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let bytes = self.load_request(request, &config)?;
        let load_elapsed = load_start.elapsed();

        let preprocess_start = Instant::now();
        let prepared = preprocess::preprocess(&bytes, &config)?;
        let preprocess_elapsed = preprocess_start.elapsed();

        let cascade_start = Instant::now();
        let result = self.run_cascade(&prepared.enhanced, &config)?;
        let cascade_elapsed = cascade_start.elapsed();

        let total_elapsed = total_start.elapsed();
        log::info!(
            "✅ 识别流程完成 - 命中: {} load={}ms preprocess={}ms cascade={}ms total={}ms",
            result.is_some(),
            load_elapsed.as_millis(),
            preprocess_elapsed.as_millis(),
            cascade_elapsed.as_millis(),
            total_elapsed.as_millis()
        );

        Ok(ScanOutcome {
            result,
            preview_data_uri: prepared.preview_data_uri,
        })
    }

    /// 对预处理后的图像执行级联搜索。
    fn run_cascade(
        &self,
        enhanced: &RawImage,
        config: &ScanConfig,
    ) -> Result<Option<ScanResult>, ScanError> {
        for stage in &self.stages {
            let stage_start = Instant::now();
            let hit = match stage.sweep {
                SweepKind::Grid => self.sweep_grid(stage.backend.as_ref(), enhanced, config)?,
                SweepKind::Single => {
                    Self::attempt(stage.backend.as_ref(), enhanced, Rotation::None, 1.0)
                }
            };

            if let Some(result) = hit {
                log::info!(
                    "🎯 后端 {} 命中（{}ms）- 码制: {}",
                    stage.backend.name(),
                    stage_start.elapsed().as_millis(),
                    result.symbology
                );
                return Ok(Some(result));
            }

            log::debug!(
                "后端 {} 扫空（{}ms）",
                stage.backend.name(),
                stage_start.elapsed().as_millis()
            );
        }

        Ok(None)
    }

    /// 旋转 × 缩放网格扫描：旋转为外层循环，同一旋转下先试遍所有缩放。
    fn sweep_grid(
        &self,
        backend: &dyn DecodeBackend,
        enhanced: &RawImage,
        config: &ScanConfig,
    ) -> Result<Option<ScanResult>, ScanError> {
        for &rotation in &config.rotation_sweep {
            for &scale in &config.scale_sweep {
                let candidate = if rotation == Rotation::None && (scale - 1.0).abs() < f32::EPSILON
                {
                    enhanced.clone()
                } else {
                    transform::transform(enhanced, scale, rotation)?
                };

                if let Some(result) = Self::attempt(backend, &candidate, rotation, scale) {
                    return Ok(Some(result));
                }
            }
        }

        Ok(None)
    }

    /// 单次尝试；命中时在结果上补齐当刻像素快照。
    fn attempt(
        backend: &dyn DecodeBackend,
        candidate: &RawImage,
        rotation: Rotation,
        scale: f32,
    ) -> Option<ScanResult> {
        log::debug!(
            "尝试解码 - 后端: {} 旋转: {}° 缩放: {} 尺寸: {}x{}",
            backend.name(),
            rotation.degrees(),
            scale,
            candidate.width(),
            candidate.height()
        );

        backend.attempt_decode(candidate).map(|mut result| {
            if result.snapshot.is_none() {
                result.snapshot = Some(candidate.clone());
            }
            result
        })
    }
}
