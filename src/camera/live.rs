//! # 实时取景扫描器
//!
//! ## 设计思路
//!
//! 把解码级联的“连续帧”变体绑定到一条相机流上：逐帧用快速通道检测器
//! 做单次检测，首次命中即自动停止并回调结果。实时场景延迟优先于召回，
//! 所以不跑完整多后端级联。
//!
//! 状态机：Idle → Starting → Streaming → Stopped。
//! 停止后不自动重启，恢复取景需要重新 `start()`。
//!
//! ## 实现思路
//!
//! - 帧循环是单个 tokio 任务：同一时刻至多一次检测在途，
//!   上一次尝试定论后才调度下一帧。
//! - 取消是协作式的：`alive` 标志是每次循环体的第一个检查，
//!   已在进行中的像素处理允许跑完。
//! - 会话由 `Mutex<Option<CameraSession>>` 独占持有；切换设备时
//!   持锁完成“释放旧流 → 独占获取新流”，帧循环天然暂停在锁上。
//! - 命中时快照取原生分辨率帧，而非降采样后的工作帧。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::imageops::FilterType;
use tokio::task::JoinHandle;

use crate::scanner::backend::{DecodeBackend, FastPathBackend, LegacyBackend};
use crate::scanner::{preprocess, RawImage, ScanConfig, ScanResult};

use super::device::{CameraBackend, CameraDeviceInfo};
use super::error::CameraError;
use super::session::CameraSession;

/// 取景器状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Starting,
    Streaming,
    Stopped,
}

enum FrameStep {
    Frame(RawImage),
    Fail(CameraError),
    Stop,
}

/// 实时取景扫描器。
///
/// 独占一条相机流；`stop()` 幂等且释放全部资源。
pub struct LiveScanner {
    backend: Arc<dyn CameraBackend>,
    config: ScanConfig,
    detector: Arc<dyn DecodeBackend>,
    state: Arc<Mutex<ScannerState>>,
    alive: Arc<AtomicBool>,
    session: Arc<Mutex<Option<CameraSession>>>,
    loop_handle: Option<JoinHandle<()>>,
}

impl LiveScanner {
    /// 创建取景器。
    ///
    /// 检测器优先快速通道；当前环境不支持时降级到兜底解码器。
    pub fn new(backend: Arc<dyn CameraBackend>, config: ScanConfig) -> Self {
        let detector: Arc<dyn DecodeBackend> = match FastPathBackend::try_new() {
            Some(fast) => {
                log::info!("⚡ 实时取景使用快速通道检测器");
                Arc::new(fast)
            }
            None => {
                log::info!("⚡ 快速通道不可用，实时取景降级到兜底解码器");
                Arc::new(LegacyBackend::new())
            }
        };

        Self {
            backend,
            config,
            detector,
            state: Arc::new(Mutex::new(ScannerState::Idle)),
            alive: Arc::new(AtomicBool::new(false)),
            session: Arc::new(Mutex::new(None)),
            loop_handle: None,
        }
    }

    /// 当前状态。
    pub fn state(&self) -> ScannerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ScannerState::Stopped)
    }

    /// 枚举可用相机设备。
    pub fn get_available_cameras(&self) -> Result<Vec<CameraDeviceInfo>, CameraError> {
        self.backend.enumerate()
    }

    /// 当前绑定设备 ID（未在取景时为 `None`）。
    pub fn current_device_id(&self) -> Option<String> {
        self.session
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.device_id()))
    }

    /// 启动取景。已在启动/取景中时为空操作。
    ///
    /// 相机获取失败会同时通过 `on_error` 回调与返回值上报，
    /// 状态落到 `Stopped`，不自动重试。
    pub async fn start(
        &mut self,
        on_scan: impl Fn(ScanResult) + Send + Sync + 'static,
        on_error: impl Fn(String) + Send + Sync + 'static,
    ) -> Result<(), CameraError> {
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| CameraError::InvalidState("状态锁已中毒".to_string()))?;
            if matches!(*state, ScannerState::Starting | ScannerState::Streaming) {
                return Ok(());
            }
            *state = ScannerState::Starting;
        }

        let session =
            match CameraSession::acquire(self.backend.as_ref(), None, self.config.live_target_resolution)
            {
                Ok(session) => session,
                Err(err) => {
                    self.set_state(ScannerState::Stopped);
                    on_error(err.to_string());
                    return Err(err);
                }
            };

        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(session);
        }

        self.alive.store(true, Ordering::SeqCst);
        self.set_state(ScannerState::Streaming);
        log::info!("🎥 实时取景已启动");

        let alive = Arc::clone(&self.alive);
        let state = Arc::clone(&self.state);
        let session = Arc::clone(&self.session);
        let detector = Arc::clone(&self.detector);
        let working_dimension = self.config.live_working_dimension;
        let frame_interval = Duration::from_millis(self.config.live_frame_interval_ms);

        let handle = tokio::spawn(async move {
            loop {
                // 活性检查必须是循环体的第一个动作
                if !alive.load(Ordering::SeqCst) {
                    break;
                }

                let step = {
                    let Ok(mut guard) = session.lock() else {
                        break;
                    };
                    match guard.as_mut() {
                        None => FrameStep::Stop,
                        Some(active) => match active.grab_frame() {
                            Ok(frame) => FrameStep::Frame(frame),
                            Err(err) => FrameStep::Fail(err),
                        },
                    }
                };

                match step {
                    FrameStep::Stop => break,
                    FrameStep::Fail(err) => {
                        log::warn!("⚠️ 取景帧获取失败，停止取景：{}", err);
                        Self::teardown(&alive, &state, &session);
                        on_error(err.to_string());
                        break;
                    }
                    FrameStep::Frame(frame) => {
                        let working = match preprocess::shrink_to_bound(
                            &frame,
                            working_dimension,
                            FilterType::Triangle,
                        ) {
                            Ok(working) => working,
                            Err(err) => {
                                log::warn!("⚠️ 工作帧降采样失败，停止取景：{}", err);
                                Self::teardown(&alive, &state, &session);
                                on_error(err.to_string());
                                break;
                            }
                        };

                        if let Some(mut hit) = detector.attempt_decode(&working) {
                            // 快照取原生分辨率帧，而非工作帧
                            hit.snapshot = Some(frame);
                            log::info!("🎯 实时取景命中 - 码制: {}", hit.symbology);
                            Self::teardown(&alive, &state, &session);
                            on_scan(hit);
                            break;
                        }
                    }
                }

                tokio::time::sleep(frame_interval).await;
            }
        });

        self.loop_handle = Some(handle);
        Ok(())
    }

    /// 停止取景。幂等：未启动或重复调用均为空操作。
    ///
    /// 取消挂起的帧回调、等待在途处理结束、释放相机流。
    pub async fn stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);

        if let Some(handle) = self.loop_handle.take() {
            let _ = handle.await;
        }

        let released = self
            .session
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(session) = released {
            session.release();
        }

        if let Ok(mut state) = self.state.lock() {
            if !matches!(*state, ScannerState::Idle) {
                *state = ScannerState::Stopped;
            }
        }
        log::info!("🛑 实时取景已停止");
    }

    /// 切换活动设备：暂停帧循环、释放旧流、独占获取新流、恢复循环。
    ///
    /// 对外契约不变——取景器仍处于 `Streaming`，调用方无需重新注册回调。
    pub async fn switch_camera(&mut self, device_id: &str) -> Result<(), CameraError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(CameraError::InvalidState("取景未在运行".to_string()));
        }

        let mut guard = self
            .session
            .lock()
            .map_err(|_| CameraError::InvalidState("会话锁已中毒".to_string()))?;

        if let Some(old) = guard.take() {
            old.release();
        }

        match CameraSession::acquire(
            self.backend.as_ref(),
            Some(device_id),
            self.config.live_target_resolution,
        ) {
            Ok(session) => {
                log::info!("🔄 已切换相机设备：{}", device_id);
                *guard = Some(session);
                Ok(())
            }
            Err(err) => {
                drop(guard);
                self.alive.store(false, Ordering::SeqCst);
                self.set_state(ScannerState::Stopped);
                Err(err)
            }
        }
    }

    /// 切换手电筒，返回新状态；设备不支持时返回 `false`。
    pub async fn toggle_torch(&mut self) -> bool {
        self.session
            .lock()
            .ok()
            .and_then(|mut guard| guard.as_mut().map(|s| s.toggle_torch()))
            .unwrap_or(false)
    }

    fn set_state(&self, next: ScannerState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// 帧循环内部的统一停机路径。
    fn teardown(
        alive: &AtomicBool,
        state: &Mutex<ScannerState>,
        session: &Mutex<Option<CameraSession>>,
    ) {
        alive.store(false, Ordering::SeqCst);
        let released = session.lock().ok().and_then(|mut guard| guard.take());
        if let Some(active) = released {
            active.release();
        }
        if let Ok(mut guard) = state.lock() {
            *guard = ScannerState::Stopped;
        }
    }
}
