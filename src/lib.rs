//! # 条码识别工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                调用方 (CLI / 上层应用)                    │
//! │                                                          │
//! │  scan_image / scan_file ── LiveScanner 回调              │
//! │       │  (统一错误处理 + 类型安全)                       │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕              后端 (Rust)                         │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ scanner ──── 预处理 + 解码级联                        │
//! │  │   ├─ preprocess   降采样·对比度·锐化·预览              │
//! │  │   ├─ transform    旋转/缩放变体                        │
//! │  │   ├─ backend      multi-format / fast-path / legacy   │
//! │  │   └─ cascade      (后端 × 参数) 优先级编排             │
//! │  │                                                       │
//! │  ├─ camera ───── 设备抽象·独占会话·逐帧取景               │
//! │  └─ history ──── SQLite (rusqlite) 识别历史               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有对外入口的返回类型 |
//! | [`scanner`] | 图像加载、预处理增强、多后端解码级联、码制归一化 |
//! | [`camera`] | 相机设备抽象、独占会话生命周期、实时取景状态机 |
//! | [`history`] | 识别历史的 SQLite 存储（去重 + 容量上限） |

pub mod camera;
pub mod error;
pub mod history;
pub mod scanner;

pub use camera::{CameraBackend, CameraDeviceInfo, CameraError, LiveScanner, ScannerState};
pub use error::AppError;
pub use history::ScanHistoryStore;
pub use scanner::{
    ImageScanResponse, RawImage, ScanConfig, ScanError, ScanResult, ScanServiceState, SymbologyTag,
};
