//! # 相机会话（独占生命周期）
//!
//! ## 设计思路
//!
//! `CameraSession` 将“获取 → 使用 → 释放”做成显式对象生命周期，
//! 替代来源实现里隐式挂在环境全局上的权限/设备状态。
//! 一个会话独占一条流；释放即丢弃流句柄。
//!
//! ## 实现思路
//!
//! - 两级分辨率回退：先按首选分辨率请求，失败后退回设备默认约束。
//!   相机获取不允许仅仅因为首选分辨率不可用而整体失败。
//! - 权限类失败立即上抛，不做第二级尝试（重试不会改变授权结果）。
//! - 手电筒开关是能力降级语义：不支持时返回 `false`，不是错误。

use super::device::{CameraBackend, CameraStream, StreamConstraints};
use super::error::CameraError;

/// 一条已获取相机流的独占会话。
pub struct CameraSession {
    stream: Box<dyn CameraStream>,
    torch_on: bool,
}

impl CameraSession {
    /// 获取会话：先按首选分辨率请求，失败后回退到设备默认。
    pub fn acquire(
        backend: &dyn CameraBackend,
        device_id: Option<&str>,
        target_resolution: (u32, u32),
    ) -> Result<Self, CameraError> {
        let (width, height) = target_resolution;
        let stream = match backend.open(device_id, StreamConstraints::ideal(width, height)) {
            Ok(stream) => stream,
            Err(CameraError::PermissionDenied(message)) => {
                return Err(CameraError::PermissionDenied(message));
            }
            Err(first_error) => {
                log::warn!(
                    "⚠️ 首选分辨率 {}x{} 获取失败，回退设备默认约束：{}",
                    width,
                    height,
                    first_error
                );
                backend.open(device_id, StreamConstraints::unconstrained())?
            }
        };

        let (native_w, native_h) = stream.native_resolution();
        log::info!(
            "📷 相机会话已建立 - 设备: {} 原生分辨率: {}x{}",
            stream.device_id(),
            native_w,
            native_h
        );

        Ok(Self {
            stream,
            torch_on: false,
        })
    }

    /// 当前绑定设备 ID。
    pub fn device_id(&self) -> String {
        self.stream.device_id().to_string()
    }

    /// 原生采集分辨率。
    pub fn native_resolution(&self) -> (u32, u32) {
        self.stream.native_resolution()
    }

    /// 抓取当前帧（原生分辨率）。
    pub fn grab_frame(&mut self) -> Result<crate::scanner::RawImage, CameraError> {
        self.stream.grab_frame()
    }

    /// 切换手电筒，返回新状态。
    ///
    /// 设备能力集未宣告支持时为空操作，返回 `false` 而非错误。
    pub fn toggle_torch(&mut self) -> bool {
        if !self.stream.supports_torch() {
            log::info!("🔦 设备不支持手电筒，忽略切换请求");
            return false;
        }

        let next = !self.torch_on;
        match self.stream.set_torch(next) {
            Ok(()) => {
                self.torch_on = next;
                log::info!("🔦 手电筒已{}", if next { "开启" } else { "关闭" });
                next
            }
            Err(err) => {
                log::warn!("⚠️ 手电筒切换失败，按不支持处理：{}", err);
                false
            }
        }
    }

    /// 当前手电筒状态。
    pub fn torch_on(&self) -> bool {
        self.torch_on
    }

    /// 显式释放会话（丢弃流句柄即停止所有媒体轨道）。
    pub fn release(self) {
        log::info!("📷 相机会话已释放 - 设备: {}", self.stream.device_id());
    }
}
