//! 相机设备抽象：设备枚举与流获取收敛到 `CameraBackend`，
//! 单条活动流收敛到 `CameraStream`。取景器只依赖这两个 trait，
//! 不关心帧从真实硬件还是测试脚本产生。

use serde::Serialize;

use crate::scanner::RawImage;

use super::error::CameraError;

/// 可枚举的相机设备信息。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDeviceInfo {
    pub device_id: String,
    pub label: String,
}

/// 流获取约束。
///
/// `ideal_resolution` 为首选采集分辨率；`None` 表示交给设备默认。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub ideal_resolution: Option<(u32, u32)>,
}

impl StreamConstraints {
    pub fn ideal(width: u32, height: u32) -> Self {
        Self {
            ideal_resolution: Some((width, height)),
        }
    }

    pub fn unconstrained() -> Self {
        Self {
            ideal_resolution: None,
        }
    }
}

/// 相机后端：设备枚举与流获取。
pub trait CameraBackend: Send + Sync {
    /// 枚举当前可用设备。
    fn enumerate(&self) -> Result<Vec<CameraDeviceInfo>, CameraError>;

    /// 独占打开一条相机流。
    ///
    /// `device_id` 为 `None` 时选择默认设备。获取失败按错误分类上抛，
    /// 权限类失败不应被调用方重试。
    fn open(
        &self,
        device_id: Option<&str>,
        constraints: StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// 一条已打开的相机流。
pub trait CameraStream: Send {
    /// 实际绑定的设备 ID。
    fn device_id(&self) -> &str;

    /// 实际协商出的原生采集分辨率。
    fn native_resolution(&self) -> (u32, u32);

    /// 抓取当前帧（原生分辨率）。
    fn grab_frame(&mut self) -> Result<RawImage, CameraError>;

    /// 设备能力集是否宣告支持手电筒。
    fn supports_torch(&self) -> bool;

    /// 开关手电筒。能力缺失时返回 `CapabilityUnsupported`。
    fn set_torch(&mut self, enabled: bool) -> Result<(), CameraError>;
}
