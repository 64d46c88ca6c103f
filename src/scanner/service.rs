//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `ScanServiceState` 作为对外服务入口，替代全局单例函数。
//! 好处：
//! 1. 生命周期清晰（由应用入口统一管理）
//! 2. 测试可创建独立实例，减少共享状态副作用
//! 3. 后续可扩展多实例或按会话配置
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `scan_image` / `scan_base64` / `scan_file`：执行完整识别链路
//! - `set_sweep_profile` / `get_sweep_profile`：切换与读取扫描档位
//! - `set_enhance_params` / `get_enhance_params`：调整增强参数（带范围校验）

use serde::Serialize;

use super::cascade::{ScanOutcome, ScanPipeline};
use super::config::{ScanConfig, ScanSweepProfile};
use super::raster::ScanRequest;
use super::symbology::SymbologyTag;
use super::ScanError;

/// 对外返回的识别结果载荷。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultPayload {
    pub text: String,
    pub format: SymbologyTag,
    pub resized_image_url: String,
}

/// 识别响应：`resized_image_url` 无论成败恒存在，
/// 调用方失败时也能展示被分析的画面以便归因。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageScanResponse {
    pub success: bool,
    pub result: Option<ScanResultPayload>,
    pub resized_image_url: String,
}

impl ImageScanResponse {
    fn from_outcome(outcome: ScanOutcome) -> Self {
        let preview = outcome.preview_data_uri;
        match outcome.result {
            Some(result) => Self {
                success: true,
                result: Some(ScanResultPayload {
                    text: result.text,
                    format: result.symbology,
                    resized_image_url: preview.clone(),
                }),
                resized_image_url: preview,
            },
            None => Self {
                success: false,
                result: None,
                resized_image_url: preview,
            },
        }
    }
}

/// 识别服务状态。
///
/// 内部持有 `ScanPipeline`，可作为托管状态注入到上层框架。
pub struct ScanServiceState {
    pipeline: ScanPipeline,
}

impl ScanServiceState {
    /// 使用默认配置创建服务状态。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use barcode_studio::scanner::ScanServiceState;
    ///
    /// let service = ScanServiceState::new();
    /// let response = service.scan_file("/tmp/code.png".into())?;
    /// println!("{}", response.success);
    /// # Ok::<(), barcode_studio::scanner::ScanError>(())
    /// ```
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    ///
    /// 主要用于测试或后续按场景注入不同策略。
    pub fn with_config(config: ScanConfig) -> Self {
        Self {
            pipeline: ScanPipeline::new(config),
        }
    }

    /// 使用既有流水线创建服务状态（自定义后端组合时使用）。
    pub fn with_pipeline(pipeline: ScanPipeline) -> Self {
        Self { pipeline }
    }

    /// 识别一张图片（原始字节）。
    pub fn scan_image(&self, bytes: Vec<u8>) -> Result<ImageScanResponse, ScanError> {
        self.pipeline
            .scan_request(ScanRequest::Bytes(bytes))
            .map(ImageScanResponse::from_outcome)
    }

    /// 识别一张图片（Base64 / Data URL）。
    pub fn scan_base64(&self, data: String) -> Result<ImageScanResponse, ScanError> {
        self.pipeline
            .scan_request(ScanRequest::Base64(data))
            .map(ImageScanResponse::from_outcome)
    }

    /// 识别一张图片（本地文件路径）。
    pub fn scan_file(&self, path: String) -> Result<ImageScanResponse, ScanError> {
        self.pipeline
            .scan_request(ScanRequest::FilePath(path))
            .map(ImageScanResponse::from_outcome)
    }

    /// 设置扫描档位。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use barcode_studio::scanner::ScanServiceState;
    ///
    /// let service = ScanServiceState::new();
    /// service.set_sweep_profile("quick")?;
    /// assert_eq!(service.get_sweep_profile()?, "quick");
    /// # Ok::<(), barcode_studio::scanner::ScanError>(())
    /// ```
    pub fn set_sweep_profile(&self, profile: &str) -> Result<(), ScanError> {
        let profile = ScanSweepProfile::from_str(profile)?;
        let mut config = self
            .pipeline
            .config
            .write()
            .map_err(|_| ScanError::Resource("配置写入锁已中毒".to_string()))?;
        config.apply_sweep_profile(profile);

        log::info!(
            "⚙️ 已切换扫描档位：{:?}（rotations={} scales={}）",
            profile,
            config.rotation_sweep.len(),
            config.scale_sweep.len()
        );

        Ok(())
    }

    /// 获取当前生效扫描档位（字符串）。
    pub fn get_sweep_profile(&self) -> Result<String, ScanError> {
        let config = self
            .pipeline
            .config
            .read()
            .map_err(|_| ScanError::Resource("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_sweep_profile().as_str().to_string())
    }

    /// 设置增强参数（对比度系数与锐化强度）。
    ///
    /// 两个参数都是经验值而非推导值，因此开放调整，但限定在安全区间内。
    pub fn set_enhance_params(&self, contrast: f32, sharpen: f32) -> Result<(), ScanError> {
        if !(0.5..=3.0).contains(&contrast) {
            return Err(ScanError::InvalidFormat(format!(
                "contrast 必须在 0.5~3.0 之间：{}",
                contrast
            )));
        }
        if !(0.0..=2.0).contains(&sharpen) {
            return Err(ScanError::InvalidFormat(format!(
                "sharpen 必须在 0.0~2.0 之间：{}",
                sharpen
            )));
        }

        let mut config = self
            .pipeline
            .config
            .write()
            .map_err(|_| ScanError::Resource("配置写入锁已中毒".to_string()))?;
        config.contrast_factor = contrast;
        config.sharpen_strength = sharpen;

        log::info!("⚙️ 已更新增强参数：contrast={} sharpen={}", contrast, sharpen);
        Ok(())
    }

    /// 获取当前增强参数快照 `(contrast, sharpen)`。
    pub fn get_enhance_params(&self) -> Result<(f32, f32), ScanError> {
        let config = self
            .pipeline
            .config
            .read()
            .map_err(|_| ScanError::Resource("配置读取锁已中毒".to_string()))?;
        Ok((config.contrast_factor, config.sharpen_strength))
    }
}

impl Default for ScanServiceState {
    fn default() -> Self {
        Self::new()
    }
}
