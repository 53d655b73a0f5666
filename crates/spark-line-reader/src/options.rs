//! 构造 [`LineAssembler`](crate::LineAssembler) 时的可选配置。

use crate::encoding::TextEncoding;

/// 逐行读取器的构造选项。
///
/// # 教案式说明
/// - **意图 (Why)**：把“交给数据源的解码方案”等构造期参数集中到一个可序列化结构，
///   宿主可以直接从 TOML/JSON 配置文件加载；
/// - **契约 (What)**：缺省字段回落到 [`Default`]，即 UTF-8；
/// - **权衡 (Trade-offs)**：目前只有编码一个字段，仍保留结构体形态以便后续追加参数时不破坏调用方。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct LineReaderOptions {
    /// 数据源使用的解码方案。
    pub encoding: TextEncoding,
}

impl LineReaderOptions {
    /// 以默认值创建选项。
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定解码方案。
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl From<TextEncoding> for LineReaderOptions {
    fn from(encoding: TextEncoding) -> Self {
        Self::new().with_encoding(encoding)
    }
}
