//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义逐行读取对外暴露的错误语义：数据源致命错误与并发读取冲突；
//! - 流结束不是错误，由 `Ok(None)` 表达，绝不与 [`LineReaderError::Source`] 混用。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`，兼容 `std::error::Error` 生态；
//! - 每个变体提供稳定错误码（`line_reader.*`），便于日志与指标聚合。

use thiserror::Error;

/// 稳定错误码常量。
pub mod codes {
    /// 数据源上报致命错误。
    pub const SOURCE_FAILED: &str = "line_reader.source_failed";
    /// 在已有在途读取时再次发起读取。
    pub const CONCURRENT_READ: &str = "line_reader.concurrent_read";
}

/// 逐行读取的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方需要区分“数据源坏了”与“自己用错了”，前者通常终止读取循环，
///   后者说明调用方存在重入或未等待上一次读取完成的 bug；
/// - **契约 (What)**：
///   - `Source(E)` 原样携带数据源错误，`Display` 与 `source()` 透传，不额外包装文案；
///     错误具有粘滞性，已缓冲的行耗尽后，每次读取都会得到同一错误的克隆；
///   - `ConcurrentRead` 同步返回，不影响在途读取的最终结果；
/// - **权衡 (Trade-offs)**：粘滞语义要求 `E: Clone`，不可克隆的错误（如 `std::io::Error`）
///   应由数据源包装为 `Arc` 后再上报。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LineReaderError<E> {
    /// 数据源上报的致命错误，原样透传。
    #[error(transparent)]
    Source(E),
    /// 同一实例上已有未完成的读取请求。
    #[error("a read operation is already in progress")]
    ConcurrentRead,
}

impl<E> LineReaderError<E> {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            LineReaderError::Source(_) => codes::SOURCE_FAILED,
            LineReaderError::ConcurrentRead => codes::CONCURRENT_READ,
        }
    }

    /// 是否为并发读取冲突。
    pub fn is_concurrent_read(&self) -> bool {
        matches!(self, LineReaderError::ConcurrentRead)
    }

    /// 若为数据源错误，返回其引用。
    pub fn source_error(&self) -> Option<&E> {
        match self {
            LineReaderError::Source(err) => Some(err),
            LineReaderError::ConcurrentRead => None,
        }
    }

    /// 消费自身，取出数据源错误。
    pub fn into_source_error(self) -> Option<E> {
        match self {
            LineReaderError::Source(err) => Some(err),
            LineReaderError::ConcurrentRead => None,
        }
    }
}

/// 编码标签无法识别。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported text encoding `{label}`; expected one of ascii, utf8, utf16le, ucs2, latin1")]
pub struct EncodingParseError {
    label: String,
}

impl EncodingParseError {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
        }
    }

    /// 被拒绝的原始标签。
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[derive(Clone, Debug, PartialEq, Eq, Error)]
    #[error("pipe broke")]
    struct PipeBroke(#[source] IoKindError);

    #[derive(Clone, Debug, PartialEq, Eq, Error)]
    #[error("{0:?}")]
    struct IoKindError(io::ErrorKind);

    #[test]
    fn source_variant_is_transparent() {
        let err = LineReaderError::Source(PipeBroke(IoKindError(io::ErrorKind::BrokenPipe)));
        assert_eq!(err.to_string(), "pipe broke");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("BrokenPipe".to_owned()),
            "transparent 变体应直接暴露内部错误的 source 链"
        );
        assert_eq!(err.code(), codes::SOURCE_FAILED);
        assert!(!err.is_concurrent_read());
    }

    #[test]
    fn concurrent_read_has_stable_code_and_message() {
        let err = LineReaderError::<PipeBroke>::ConcurrentRead;
        assert_eq!(err.code(), "line_reader.concurrent_read");
        assert_eq!(err.to_string(), "a read operation is already in progress");
        assert!(err.source_error().is_none());
        assert!(err.into_source_error().is_none());
    }
}
