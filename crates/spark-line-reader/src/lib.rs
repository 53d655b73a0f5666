#![deny(unsafe_code)]

//! `spark-line-reader` 提供面向增量文本源的背压感知逐行读取能力。
//!
//! # 模块定位（Why）
//! - 标准输入、套接字、文件流等数据源都以任意大小的分片陆续到达，调用方却通常只想要“下一行”；
//! - 本 crate 将分片拼接、行终止符切分、流结束判定、错误传播与并发保护收敛到单一组件
//!   [`LineAssembler`]，调用方只需反复调用 [`LineAssembler::read_line`]；
//! - 核心与具体异步运行时解耦：Tokio 集成位于 `spark-line-reader-tokio`，本 crate 仅依赖
//!   `futures` 的一次性通道完成唤醒。
//!
//! # 设计概要（How）
//! - [`source`]：描述被包装数据源需要满足的契约（编码配置、暂停/恢复、三类事件投递）；
//! - `state`：纯同步的行组装状态机，维护已完成行队列、残余分片、终态错误与在途请求标记；
//! - `wake`：单槽唤醒原语，保证任意时刻至多一个等待者；
//! - [`reader`]：对外暴露的 [`LineAssembler`]，负责驱动数据源的流控并兑现读取请求；
//! - [`memory`]：无需运行时的内存数据源，既服务测试，也适用于调用方已持有文本的场景。
//!
//! # 契约说明（What）
//! - 行按终止符出现顺序交付，终止符与其前紧邻的单个 `\r` 会被剥离；
//! - 已缓冲的行总是先于错误或流结束标记交付；
//! - 任意时刻只允许一个在途读取，重复调用立即返回 [`LineReaderError::ConcurrentRead`]；
//! - 数据源默认处于暂停态，仅在存在未满足的读取请求时恢复流动。
//!
//! # 使用示例
//! ```
//! use futures::executor::block_on;
//! use spark_line_reader::{LineAssembler, MemorySource};
//!
//! let (source, writer) = MemorySource::<std::io::ErrorKind>::new();
//! let reader = LineAssembler::new(source);
//! writer.write("hello\r\nworld");
//! writer.end();
//!
//! assert_eq!(block_on(reader.read_line()), Ok(Some("hello".to_owned())));
//! assert_eq!(block_on(reader.read_line()), Ok(Some("world".to_owned())));
//! assert_eq!(block_on(reader.read_line()), Ok(None));
//! ```

pub mod encoding;
pub mod error;
pub mod memory;
pub mod options;
pub mod reader;
pub mod source;

mod state;
mod wake;

pub use encoding::TextEncoding;
pub use error::{EncodingParseError, LineReaderError};
pub use memory::{MemorySource, MemoryWriter};
pub use options::LineReaderOptions;
pub use reader::{LineAssembler, ReadLine};
pub use source::{SourceSink, TextSource};

/// 单次读取的结果：`Ok(Some(line))` 为一行文本，`Ok(None)` 表示流已结束。
pub type ReadResult<E> = Result<Option<String>, LineReaderError<E>>;
