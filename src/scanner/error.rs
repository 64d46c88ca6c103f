//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载识别链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 注意“未命中”不是错误：某次 (后端, 参数) 组合没有找到条码属于级联的
//! 正常负向结果，在后端边界内部就地吞掉，不会出现在这个枚举里。

/// 图像识别统一错误类型。
///
/// 该类型会在上层被上转为 `AppError`，最终透传给调用方。
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("图像加载失败：{0}")]
    Load(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    Resource(String),
}

impl From<ScanError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: ScanError) -> Self {
        error.to_string()
    }
}
