//! # 实时取景模块（camera）
//!
//! ## 设计思路
//!
//! 该模块将“设备抽象 → 会话生命周期 → 逐帧扫描”按职责拆分：
//!
//! - `device`：`CameraBackend` / `CameraStream` trait 与设备模型
//! - `session`：独占会话，两级分辨率回退与手电筒能力降级
//! - `live`：取景状态机与单任务帧循环
//! - `testing`：脚本化内存后端（无硬件环境下验证全部路径）
//!
//! 相机流与其渲染面由单个取景器实例独占；切换设备是
//! “释放旧流 → 独占获取新流”，绝不在两个逻辑实例间共享一条流。

mod device;
mod error;
mod live;
mod session;
pub mod testing;

pub use device::{CameraBackend, CameraDeviceInfo, CameraStream, StreamConstraints};
pub use error::CameraError;
pub use live::{LiveScanner, ScannerState};
pub use session::CameraSession;
