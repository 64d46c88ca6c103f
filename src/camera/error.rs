//! # 相机错误模型
//!
//! ## 设计思路
//!
//! 区分“必须上抛的硬失败”（权限被拒、设备丢失、流中断）与
//! “按能力降级的软失败”（手电筒不支持）。后者在会话层折叠为布尔返回，
//! 不会以错误形态出现在调用方回调里。

/// 相机与实时取景统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("相机权限被拒绝：{0}")]
    PermissionDenied(String),

    #[error("相机设备不可用：{0}")]
    DeviceUnavailable(String),

    #[error("相机流错误：{0}")]
    Stream(String),

    #[error("能力不支持：{0}")]
    CapabilityUnsupported(String),

    #[error("取景器状态错误：{0}")]
    InvalidState(String),
}

impl From<CameraError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: CameraError) -> Self {
        error.to_string()
    }
}
