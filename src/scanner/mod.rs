//! # 图像识别模块（scanner）
//!
//! ## 设计思路
//!
//! 该模块将“字节加载 → 预处理增强 → 多后端级联解码 → 结构化结果”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `raster`：像素缓冲与中间数据模型
//! - `symbology`：码制枚举与名称归一化
//! - `config`：可调策略集中地（扫描档位、增强参数）
//! - `loader`：字节 / Base64 / 文件来源加载与早期校验
//! - `preprocess`：有界降采样、对比度拉伸、反锐化掩模、预览编码
//! - `transform`：重试用的旋转/缩放变体生成
//! - `backend`：三个解码后端的统一抽象
//! - `cascade`：(后端 × 参数) 组合的优先级编排
//! - `service`：对外服务入口（可注入状态）
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 调用方（CLI / 上层应用）
//!    ↓
//! service.rs（服务入口、档位与参数管理）
//!    ↓
//! cascade.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/格式校验）
//!    ├─ preprocess.rs（降采样 + 对比度 + 锐化 + 预览）
//!    ├─ transform.rs（旋转/缩放变体）
//!    └─ backend.rs（multi-format → fast-path → legacy）
//!    ↓
//! ImageScanResponse 返回调用方
//! ```

pub mod backend;
pub mod cascade;
mod config;
mod error;
mod loader;
pub mod preprocess;
mod raster;
mod service;
mod symbology;
pub mod transform;

pub use cascade::{CascadeStage, ScanOutcome, ScanPipeline, SweepKind};
pub use config::{ScanConfig, ScanSweepProfile};
pub use error::ScanError;
pub use raster::{PreparedScanImage, RawImage, ScanRequest, ScanResult};
pub use service::{ImageScanResponse, ScanResultPayload, ScanServiceState};
pub use symbology::SymbologyTag;
