//! 字节流数据源的错误域。

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// 稳定错误码常量。
pub mod codes {
    /// 底层字节流读取失败。
    pub const IO_FAILED: &str = "line_reader.tokio.io_failed";
    /// 构造时找不到 Tokio 运行时。
    pub const RUNTIME_UNAVAILABLE: &str = "line_reader.tokio.runtime_unavailable";
}

/// [`AsyncReadSource`](crate::AsyncReadSource) 上报的错误。
///
/// # 教案式说明
/// - **意图 (Why)**：组装器要求数据源错误可克隆以实现粘滞语义，而 `std::io::Error`
///   不可克隆，因此以 `Arc` 共享同一份错误；
/// - **契约 (What)**：`Io` 的 `source()` 指向原始 `io::Error`，调用方可借助
///   [`ReadSourceError::io_kind`] 做分类；`RuntimeUnavailable` 只会在构造期出现。
#[derive(Clone, Debug, Error)]
pub enum ReadSourceError {
    /// 底层字节流读取失败。
    #[error("failed to read from byte stream: {0}")]
    Io(#[source] Arc<io::Error>),
    /// 当前线程不在 Tokio 运行时上下文中。
    #[error("no Tokio runtime is available to drive the byte stream")]
    RuntimeUnavailable,
}

impl ReadSourceError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            ReadSourceError::Io(_) => codes::IO_FAILED,
            ReadSourceError::RuntimeUnavailable => codes::RUNTIME_UNAVAILABLE,
        }
    }

    /// 若为 IO 错误，返回其分类。
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            ReadSourceError::Io(err) => Some(err.kind()),
            ReadSourceError::RuntimeUnavailable => None,
        }
    }
}

impl From<io::Error> for ReadSourceError {
    fn from(err: io::Error) -> Self {
        ReadSourceError::Io(Arc::new(err))
    }
}
