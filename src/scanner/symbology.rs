//! # 码制枚举与名称归一化
//!
//! ## 设计思路
//!
//! 不同解码后端用不同词汇表上报码制：数字编号、库内部枚举名、原始字符串。
//! 统一在返回调用方之前归一化为一个固定枚举，避免上层各自做字符串匹配。
//!
//! ## 实现思路
//!
//! - `SymbologyTag::from_numeric`：小整数回退映射表。
//! - `SymbologyTag::normalize`：大写化、去连字符、剥离已知前缀后匹配。
//! - `from_rxing`：软件解码器枚举的直接映射，未覆盖的变体走字符串归一化兜底。

use serde::Serialize;

/// 码制标准枚举（对外输出的唯一形态）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbologyTag {
    QrCode,
    Code128,
    Code39,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    DataMatrix,
    Itf,
    Codabar,
    Unknown,
}

impl SymbologyTag {
    /// 稳定字符串形态，供前端展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QrCode => "QR_CODE",
            Self::Code128 => "CODE_128",
            Self::Code39 => "CODE_39",
            Self::Ean13 => "EAN_13",
            Self::Ean8 => "EAN_8",
            Self::UpcA => "UPC_A",
            Self::UpcE => "UPC_E",
            Self::DataMatrix => "DATA_MATRIX",
            Self::Itf => "ITF",
            Self::Codabar => "CODABAR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// 小整数回退映射：部分后端只上报数字编号。
    ///
    /// 表中未出现的编号（含 5、6）一律归为 `Unknown`。
    pub fn from_numeric(code: u32) -> Self {
        match code {
            0 => Self::QrCode,
            1 => Self::DataMatrix,
            2 => Self::Codabar,
            3 => Self::Code39,
            4 => Self::Code128,
            7 => Self::Ean8,
            8 => Self::Ean13,
            9 => Self::Itf,
            10 => Self::UpcA,
            11 => Self::UpcE,
            _ => Self::Unknown,
        }
    }

    /// 任意字符串形态的归一化入口。
    ///
    /// 处理顺序：裁剪 → 纯数字走编号表 → 大写化并统一分隔符 →
    /// 剥离已知前缀（`FORMAT_` / `AZTEC_` / `ISO_`）→ 名称匹配。
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Unknown;
        }

        if let Ok(code) = trimmed.parse::<u32>() {
            return Self::from_numeric(code);
        }

        let mut name = trimmed.to_uppercase().replace('-', "_").replace(' ', "_");
        for prefix in ["FORMAT_", "AZTEC_", "ISO_"] {
            if let Some(stripped) = name.strip_prefix(prefix) {
                name = stripped.to_string();
            }
        }

        match name.as_str() {
            "QR_CODE" | "QRCODE" | "QR" => Self::QrCode,
            "CODE_128" | "CODE128" => Self::Code128,
            "CODE_39" | "CODE39" => Self::Code39,
            "EAN_13" | "EAN13" => Self::Ean13,
            "EAN_8" | "EAN8" => Self::Ean8,
            "UPC_A" | "UPCA" => Self::UpcA,
            "UPC_E" | "UPCE" => Self::UpcE,
            "DATA_MATRIX" | "DATAMATRIX" => Self::DataMatrix,
            "ITF" | "ITF_14" => Self::Itf,
            "CODABAR" => Self::Codabar,
            _ => Self::Unknown,
        }
    }

    /// 软件解码器（rxing）枚举映射。
    pub fn from_rxing(format: &rxing::BarcodeFormat) -> Self {
        use rxing::BarcodeFormat as F;
        match format {
            F::QR_CODE => Self::QrCode,
            F::CODE_128 => Self::Code128,
            F::CODE_39 => Self::Code39,
            F::EAN_13 => Self::Ean13,
            F::EAN_8 => Self::Ean8,
            F::UPC_A => Self::UpcA,
            F::UPC_E => Self::UpcE,
            F::DATA_MATRIX => Self::DataMatrix,
            F::ITF => Self::Itf,
            F::CODABAR => Self::Codabar,
            other => Self::normalize(&format!("{:?}", other)),
        }
    }
}

/// 对外序列化为标准字符串形态。
impl Serialize for SymbologyTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for SymbologyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_table_matches_contract() {
        assert_eq!(SymbologyTag::from_numeric(0), SymbologyTag::QrCode);
        assert_eq!(SymbologyTag::from_numeric(1), SymbologyTag::DataMatrix);
        assert_eq!(SymbologyTag::from_numeric(2), SymbologyTag::Codabar);
        assert_eq!(SymbologyTag::from_numeric(3), SymbologyTag::Code39);
        assert_eq!(SymbologyTag::from_numeric(4), SymbologyTag::Code128);
        assert_eq!(SymbologyTag::from_numeric(7), SymbologyTag::Ean8);
        assert_eq!(SymbologyTag::from_numeric(8), SymbologyTag::Ean13);
        assert_eq!(SymbologyTag::from_numeric(9), SymbologyTag::Itf);
        assert_eq!(SymbologyTag::from_numeric(10), SymbologyTag::UpcA);
        assert_eq!(SymbologyTag::from_numeric(11), SymbologyTag::UpcE);
        assert_eq!(SymbologyTag::from_numeric(5), SymbologyTag::Unknown);
        assert_eq!(SymbologyTag::from_numeric(6), SymbologyTag::Unknown);
        assert_eq!(SymbologyTag::from_numeric(99), SymbologyTag::Unknown);
    }

    #[test]
    fn normalize_strips_known_prefixes() {
        assert_eq!(
            SymbologyTag::normalize("FORMAT_CODE_128"),
            SymbologyTag::Code128
        );
        assert_eq!(SymbologyTag::normalize("ISO_QR_CODE"), SymbologyTag::QrCode);
        assert_eq!(
            SymbologyTag::normalize("AZTEC_DATA_MATRIX"),
            SymbologyTag::DataMatrix
        );
    }

    #[test]
    fn normalize_accepts_native_lowercase_names() {
        assert_eq!(SymbologyTag::normalize("qr_code"), SymbologyTag::QrCode);
        assert_eq!(SymbologyTag::normalize("upc_e"), SymbologyTag::UpcE);
        assert_eq!(SymbologyTag::normalize("ean-13"), SymbologyTag::Ean13);
    }

    #[test]
    fn normalize_routes_numeric_strings_through_table() {
        assert_eq!(SymbologyTag::normalize("8"), SymbologyTag::Ean13);
        assert_eq!(SymbologyTag::normalize(" 4 "), SymbologyTag::Code128);
    }

    #[test]
    fn normalize_unmapped_names_to_unknown() {
        assert_eq!(SymbologyTag::normalize("DETECTED"), SymbologyTag::Unknown);
        assert_eq!(SymbologyTag::normalize(""), SymbologyTag::Unknown);
        assert_eq!(SymbologyTag::normalize("PDF_417"), SymbologyTag::Unknown);
    }
}
