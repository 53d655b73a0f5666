//! 数据源文本解码方案的枚举与标签解析。
//!
//! # 设计动机（Why）
//! - 解码本身由数据源负责，组装器只负责在构造时把调用方的选择透传下去；
//! - 统一的枚举避免各数据源实现各自解析字符串标签，导致同一配置在不同传输上语义漂移。
//!
//! # 契约说明（What）
//! - 支持的编码集合固定为 ASCII、UTF-8、UTF-16LE、UCS-2、Latin-1，默认 UTF-8；
//! - 标签解析大小写不敏感，并接受常见别名（`utf-8`、`utf-16le`、`ucs-2`、`binary`）；
//! - 启用 `serde` 特性时，反序列化同样经由 [`FromStr`]，配置文件与命令行接受同一组标签。

use core::fmt;
use core::str::FromStr;

use crate::error::EncodingParseError;

/// 数据源在投递文本前使用的解码方案。
///
/// # 教案式说明
/// - **意图 (Why)**：以强类型表达有限的编码集合，配置错误在解析阶段即被拒绝；
/// - **契约 (What)**：`Ucs2` 与 `Utf16Le` 在字节层面按相同规则解码，保留两个变体只是为了与
///   既有配置标签一一对应；
/// - **权衡 (Trade-offs)**：不提供“自定义编码”分支，需要其他字符集的调用方应在数据源内部完成转码。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// 7 位 ASCII，高位被丢弃。
    Ascii,
    /// UTF-8，默认值。
    #[default]
    Utf8,
    /// 小端 UTF-16。
    Utf16Le,
    /// UCS-2，按小端 UTF-16 解码。
    Ucs2,
    /// ISO-8859-1，每个字节直接映射为同值码点。
    Latin1,
}

impl TextEncoding {
    /// 全部受支持的编码，按声明顺序排列。
    pub const ALL: [TextEncoding; 5] = [
        TextEncoding::Ascii,
        TextEncoding::Utf8,
        TextEncoding::Utf16Le,
        TextEncoding::Ucs2,
        TextEncoding::Latin1,
    ];

    /// 返回规范标签，与 [`FromStr`] 接受的主标签一致。
    pub const fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Ascii => "ascii",
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Utf16Le => "utf16le",
            TextEncoding::Ucs2 => "ucs2",
            TextEncoding::Latin1 => "latin1",
        }
    }

    /// 该编码是否以两字节为最小码元。
    pub const fn is_wide(self) -> bool {
        matches!(self, TextEncoding::Utf16Le | TextEncoding::Ucs2)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = EncodingParseError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "ascii" => Ok(TextEncoding::Ascii),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "utf16le" | "utf-16le" => Ok(TextEncoding::Utf16Le),
            "ucs2" | "ucs-2" => Ok(TextEncoding::Ucs2),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            _ => Err(EncodingParseError::new(label)),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TextEncoding {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TextEncoding {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = <String as serde::Deserialize>::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}
