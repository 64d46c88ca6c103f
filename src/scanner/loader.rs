//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（字节 / Base64 / 本地文件）的原始字节加载，并在
//! “尽可能早”的阶段执行输入校验，尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - Base64：格式解析 + 解码前体积上界估算。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 字节：体积限制在解码入口统一校验。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::cascade::ScanPipeline;
use super::config::ScanConfig;
use super::raster::ScanRequest;
use super::ScanError;

impl ScanPipeline {
    /// 按来源加载原始字节。
    pub(super) fn load_request(
        &self,
        request: ScanRequest,
        config: &ScanConfig,
    ) -> Result<Vec<u8>, ScanError> {
        match request {
            ScanRequest::Bytes(bytes) => Ok(bytes),
            ScanRequest::Base64(data) => Self::parse_base64_with_limit(&data, config.max_file_size),
            ScanRequest::FilePath(path) => Self::load_from_file(&path, config),
        }
    }

    /// 从本地路径加载图片原始字节。
    fn load_from_file(path: &str, config: &ScanConfig) -> Result<Vec<u8>, ScanError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path);

        let file_path = Path::new(path);
        if !file_path.exists() {
            return Err(ScanError::FileSystem(format!("文件不存在：{}", path)));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| ScanError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(ScanError::Resource(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        std::fs::read(file_path)
            .map_err(|e| ScanError::FileSystem(format!("无法读取图片文件：{}", e)))
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ScanError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ScanError::Resource("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ScanError::Resource("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64）。
    pub(crate) fn parse_base64_with_limit(
        data: &str,
        max_file_size: u64,
    ) -> Result<Vec<u8>, ScanError> {
        let normalized = data.trim();

        let base64_data = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| ScanError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;
        if estimated_len > max_file_size {
            return Err(ScanError::Resource(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| ScanError::InvalidFormat(format!("Base64 解码失败：{}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base64_accepts_data_url() {
        let payload = general_purpose::STANDARD.encode(b"hello");
        let data_url = format!("data:image/png;base64,{}", payload);

        let decoded = ScanPipeline::parse_base64_with_limit(&data_url, 1024)
            .expect("parse base64 should succeed");
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn parse_base64_accepts_bare_payload() {
        let payload = general_purpose::STANDARD.encode(b"bare");
        let decoded = ScanPipeline::parse_base64_with_limit(&payload, 1024)
            .expect("parse base64 should succeed");
        assert_eq!(decoded, b"bare");
    }

    #[test]
    fn parse_base64_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = ScanPipeline::parse_base64_with_limit(&huge, 32);
        assert!(matches!(result, Err(ScanError::Resource(_))));
    }

    #[test]
    fn parse_base64_rejects_data_url_without_marker() {
        let result = ScanPipeline::parse_base64_with_limit("data:image/png;hex,00", 1024);
        assert!(matches!(result, Err(ScanError::InvalidFormat(_))));
    }
}
