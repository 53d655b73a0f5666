#![doc = r#"
# spark-line-reader-tokio

## 设计动机（Why）
- **定位**：`spark-line-reader` 的核心与运行时无关，本 crate 在 Tokio 上为任意
  [`AsyncRead`](tokio::io::AsyncRead) 字节流提供满足
  [`TextSource`](spark_line_reader::TextSource) 契约的实现，使标准输入、套接字、
  文件、子进程输出都能被逐行读取。
- **架构角色**：与核心 crate 的关系等同传输实现层之于契约层，运行时依赖只出现在这里。

## 核心契约（What）
- **输入条件**：构造时需要 Tokio 运行时（显式 `Handle` 或当前上下文）；
- **输出保障**：仅在组装器恢复流动时读取底层字节流，字节按配置的编码解码后投递；
  EOF 时冲刷解码器残余并投递结束事件；IO 错误包装为可克隆的
  [`ReadSourceError::Io`] 上报；
- **前置约束**：编码在组装器包装（`attach`）时固定。

## 实现策略（How）
- **泵任务**：`attach` 时在运行时上派生一个任务，通过 `tokio::sync::watch` 观察流动标记，
  暂停期间不发起读取，也不投递已读到的数据；
- **解码**：[`TextDecoder`] 借助 `encoding_rs` 的流式解码器处理跨分片的多字节序列；
- **生命周期**：数据源被丢弃（通常随组装器一起）时中止泵任务，释放底层字节流。

## 风险与考量（Trade-offs）
- 暂停请求在一次读取进行中到达时，该次读取仍会完成，读到的数据保留在泵任务中，
  直到下一次恢复才投递，因此数据源内最多额外持有一个分片；
- 分片大小决定单次读取的上限，过小会放大系统调用次数，过大会增加暂停前的预读量。
"#]

mod decode;
mod error;
mod source;

pub use decode::TextDecoder;
pub use error::ReadSourceError;
pub use source::{AsyncReadSource, DEFAULT_CHUNK_SIZE};
