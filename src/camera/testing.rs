//! # 脚本化相机后端（测试与演示用）
//!
//! ## 设计思路
//!
//! 实时取景器只依赖 `CameraBackend` / `CameraStream` 两个 trait，
//! 这里提供一个内存实现：按预先编排的帧序列产帧，并可注入
//! 权限拒绝、首选分辨率拒绝、帧读取失败等故障，
//! 让取景器的状态机与回退路径可以在无硬件环境下被完整验证。
//!
//! 真实硬件后端通过同样的 trait 接入，取景器代码无需改动。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::scanner::RawImage;

use super::device::{CameraBackend, CameraDeviceInfo, CameraStream, StreamConstraints};
use super::error::CameraError;

/// 脚本化相机后端。
pub struct ScriptedCamera {
    devices: Vec<CameraDeviceInfo>,
    frames: Arc<Mutex<VecDeque<RawImage>>>,
    native_resolution: (u32, u32),
    torch_supported: bool,
    deny_permission: bool,
    reject_ideal_resolution: bool,
    fail_frames_after: Option<usize>,
    opened_constraints: Arc<Mutex<Vec<StreamConstraints>>>,
    opened_devices: Arc<Mutex<Vec<Option<String>>>>,
}

impl ScriptedCamera {
    /// 创建单设备后端，帧序列按入参顺序产出；耗尽后重复最后一帧。
    pub fn new(frames: Vec<RawImage>) -> Self {
        let native_resolution = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((640, 480));

        Self {
            devices: vec![CameraDeviceInfo {
                device_id: "cam-0".to_string(),
                label: "Scripted Camera 0".to_string(),
            }],
            frames: Arc::new(Mutex::new(frames.into_iter().collect())),
            native_resolution,
            torch_supported: false,
            deny_permission: false,
            reject_ideal_resolution: false,
            fail_frames_after: None,
            opened_constraints: Arc::new(Mutex::new(Vec::new())),
            opened_devices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 追加一个可枚举设备。
    pub fn with_extra_device(mut self, device_id: &str, label: &str) -> Self {
        self.devices.push(CameraDeviceInfo {
            device_id: device_id.to_string(),
            label: label.to_string(),
        });
        self
    }

    /// 声明设备支持手电筒。
    pub fn with_torch(mut self) -> Self {
        self.torch_supported = true;
        self
    }

    /// 注入权限拒绝：所有 `open` 调用直接失败。
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// 注入首选分辨率拒绝：带 ideal 约束的 `open` 失败，
    /// 无约束请求照常成功（驱动两级回退路径）。
    pub fn reject_ideal_resolution(mut self) -> Self {
        self.reject_ideal_resolution = true;
        self
    }

    /// 注入帧故障：产出 N 帧后 `grab_frame` 开始报错。
    pub fn fail_frames_after(mut self, frames: usize) -> Self {
        self.fail_frames_after = Some(frames);
        self
    }

    /// 历次 `open` 收到的约束（断言两级回退用）。
    pub fn opened_constraints(&self) -> Vec<StreamConstraints> {
        self.opened_constraints
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// 历次 `open` 收到的设备 ID。
    pub fn opened_devices(&self) -> Vec<Option<String>> {
        self.opened_devices
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl CameraBackend for ScriptedCamera {
    fn enumerate(&self) -> Result<Vec<CameraDeviceInfo>, CameraError> {
        Ok(self.devices.clone())
    }

    fn open(
        &self,
        device_id: Option<&str>,
        constraints: StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        if let Ok(mut log) = self.opened_constraints.lock() {
            log.push(constraints);
        }
        if let Ok(mut log) = self.opened_devices.lock() {
            log.push(device_id.map(|s| s.to_string()));
        }

        if self.deny_permission {
            return Err(CameraError::PermissionDenied(
                "用户拒绝了相机访问".to_string(),
            ));
        }

        if let Some(id) = device_id {
            if !self.devices.iter().any(|d| d.device_id == id) {
                return Err(CameraError::DeviceUnavailable(format!(
                    "未知设备：{}",
                    id
                )));
            }
        }

        if self.reject_ideal_resolution && constraints.ideal_resolution.is_some() {
            return Err(CameraError::DeviceUnavailable(
                "设备不支持请求的分辨率".to_string(),
            ));
        }

        let resolved_id = device_id
            .map(|s| s.to_string())
            .or_else(|| self.devices.first().map(|d| d.device_id.clone()))
            .unwrap_or_else(|| "cam-0".to_string());

        Ok(Box::new(ScriptedStream {
            device_id: resolved_id,
            frames: Arc::clone(&self.frames),
            last_frame: None,
            native_resolution: self.native_resolution,
            torch_supported: self.torch_supported,
            torch_on: false,
            frames_served: 0,
            fail_frames_after: self.fail_frames_after,
        }))
    }
}

struct ScriptedStream {
    device_id: String,
    frames: Arc<Mutex<VecDeque<RawImage>>>,
    last_frame: Option<RawImage>,
    native_resolution: (u32, u32),
    torch_supported: bool,
    torch_on: bool,
    frames_served: usize,
    fail_frames_after: Option<usize>,
}

impl CameraStream for ScriptedStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn native_resolution(&self) -> (u32, u32) {
        self.native_resolution
    }

    fn grab_frame(&mut self) -> Result<RawImage, CameraError> {
        if let Some(limit) = self.fail_frames_after {
            if self.frames_served >= limit {
                return Err(CameraError::Stream("取景帧读取失败".to_string()));
            }
        }

        let next = self
            .frames
            .lock()
            .map_err(|_| CameraError::Stream("帧队列锁已中毒".to_string()))?
            .pop_front();

        let frame = match next {
            Some(frame) => {
                self.last_frame = Some(frame.clone());
                frame
            }
            None => match &self.last_frame {
                Some(frame) => frame.clone(),
                None => {
                    let (w, h) = self.native_resolution;
                    RawImage::from_rgba(w, h, vec![255; (w * h * 4) as usize])
                        .map_err(|e| CameraError::Stream(e.to_string()))?
                }
            },
        };

        self.frames_served += 1;
        Ok(frame)
    }

    fn supports_torch(&self) -> bool {
        self.torch_supported
    }

    fn set_torch(&mut self, enabled: bool) -> Result<(), CameraError> {
        if !self.torch_supported {
            return Err(CameraError::CapabilityUnsupported(
                "设备能力集未宣告手电筒".to_string(),
            ));
        }
        self.torch_on = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> RawImage {
        RawImage::from_rgba(width, height, vec![128; (width * height * 4) as usize])
            .expect("build should succeed")
    }

    #[test]
    fn repeats_last_frame_when_script_is_exhausted() {
        let backend = ScriptedCamera::new(vec![frame(4, 4)]);
        let mut stream = backend
            .open(None, StreamConstraints::unconstrained())
            .expect("open should succeed");

        let first = stream.grab_frame().expect("first frame should succeed");
        let second = stream.grab_frame().expect("repeat frame should succeed");
        assert_eq!(first.width(), second.width());
    }

    #[test]
    fn permission_denial_rejects_all_opens() {
        let backend = ScriptedCamera::new(vec![frame(4, 4)]).deny_permission();
        let result = backend.open(None, StreamConstraints::ideal(1920, 1080));
        assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
    }

    #[test]
    fn frame_failure_injection_kicks_in_after_limit() {
        let backend = ScriptedCamera::new(vec![frame(4, 4)]).fail_frames_after(1);
        let mut stream = backend
            .open(None, StreamConstraints::unconstrained())
            .expect("open should succeed");

        assert!(stream.grab_frame().is_ok());
        assert!(matches!(
            stream.grab_frame(),
            Err(CameraError::Stream(_))
        ));
    }

    #[test]
    fn torch_requires_declared_capability() {
        let backend = ScriptedCamera::new(vec![frame(4, 4)]);
        let mut stream = backend
            .open(None, StreamConstraints::unconstrained())
            .expect("open should succeed");

        assert!(!stream.supports_torch());
        assert!(matches!(
            stream.set_torch(true),
            Err(CameraError::CapabilityUnsupported(_))
        ));
    }
}
