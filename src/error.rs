//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)`、`expect()` 等不一致模式。
//!
//! 对外入口统一返回 `Result<T, AppError>`，
//! 上层通过 `Serialize` 获得结构化的错误信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ScanError` / `CameraError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 IPC/JSON 输出要求。

use serde::Serialize;

use crate::camera::CameraError;
use crate::scanner::ScanError;

/// 应用级统一错误类型
///
/// 所有对外入口均返回此类型，确保调用方收到一致的错误格式。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图像识别流水线错误（加载 / 预处理 / 解码）
    #[error("{0}")]
    Scan(#[from] ScanError),

    /// 相机与实时取景错误
    #[error("{0}")]
    Camera(#[from] CameraError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据库操作失败
    #[error("数据库错误: {0}")]
    Database(String),
}

/// 上层 IPC 通道要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
