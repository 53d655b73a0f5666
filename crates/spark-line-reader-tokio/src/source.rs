//! 基于 Tokio `AsyncRead` 的文本数据源。

use std::fmt;
use std::io;
use std::sync::Arc;

use spark_line_reader::{SourceSink, TextEncoding, TextSource};
use tokio::io::{AsyncRead, AsyncReadExt, Stdin};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::decode::TextDecoder;
use crate::error::ReadSourceError;

/// 单次读取的默认分片大小。
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// 将 [`AsyncRead`] 字节流适配为 [`TextSource`]。
///
/// # 教案式说明
/// - **意图 (Why)**：让标准输入、套接字、管道等字节流接入逐行组装器，并把组装器的
///   暂停/恢复映射为“是否继续从底层读取”，在读取端形成真实背压；
/// - **逻辑 (How)**：
///   1. 构造阶段只记录读取器与运行时句柄，不发起任何 IO；
///   2. `attach` 派生泵任务，任务持有读取器、解码器与事件出口；
///   3. `pause`/`resume` 写入 `watch` 标记，泵任务在读取前与投递前都会等待标记为真；
///   4. EOF 时投递解码器残余与结束事件，IO 错误立即投递，二者都会结束泵任务；
/// - **契约 (What)**：
///   - 编码只在 `attach` 之前可调整，之后的修改被忽略并记录告警；
///   - `ErrorKind::Interrupted` 视为可重试，不上报；
///   - 实例被丢弃时中止泵任务。
pub struct AsyncReadSource<R> {
    reader: Option<R>,
    handle: Handle,
    encoding: TextEncoding,
    chunk_size: usize,
    flowing: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<R> AsyncReadSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// 在当前 Tokio 运行时上下文中创建数据源。
    ///
    /// # 错误
    /// - 不在运行时上下文中调用时返回 [`ReadSourceError::RuntimeUnavailable`]。
    pub fn new(reader: R) -> Result<Self, ReadSourceError> {
        let handle = Handle::try_current().map_err(|_| ReadSourceError::RuntimeUnavailable)?;
        Ok(Self::with_handle(reader, handle))
    }

    /// 使用显式运行时句柄创建数据源。
    pub fn with_handle(reader: R, handle: Handle) -> Self {
        let (flowing, _) = watch::channel(false);
        Self {
            reader: Some(reader),
            handle,
            encoding: TextEncoding::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            flowing,
            task: None,
        }
    }

    /// 调整单次读取的分片大小，最小为 1 字节。
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// 当前是否处于流动态。
    pub fn is_flowing(&self) -> bool {
        *self.flowing.borrow()
    }

    /// 泵任务是否已经启动。
    pub fn is_attached(&self) -> bool {
        self.task.is_some()
    }
}

impl AsyncReadSource<Stdin> {
    /// 以进程标准输入为字节流。
    pub fn stdin() -> Result<Self, ReadSourceError> {
        Self::new(tokio::io::stdin())
    }
}

impl<R> TextSource for AsyncReadSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    type Error = ReadSourceError;

    fn set_encoding(&mut self, encoding: TextEncoding) {
        if self.task.is_some() {
            warn!(
                current = %self.encoding,
                requested = %encoding,
                "encoding is fixed once the pump has started; ignoring change"
            );
            return;
        }
        self.encoding = encoding;
    }

    fn attach(&mut self, sink: SourceSink<ReadSourceError>) {
        let Some(reader) = self.reader.take() else {
            warn!("byte stream already attached to a line reader");
            return;
        };
        let pump = Pump {
            reader,
            decoder: TextDecoder::new(self.encoding),
            flowing: self.flowing.subscribe(),
            sink,
            chunk_size: self.chunk_size,
        };
        debug!(encoding = %self.encoding, chunk_size = self.chunk_size, "spawning byte stream pump");
        self.task = Some(self.handle.spawn(pump.run()));
    }

    fn pause(&mut self) {
        self.flowing.send_replace(false);
    }

    fn resume(&mut self) {
        self.flowing.send_replace(true);
    }
}

impl<R> Drop for AsyncReadSource<R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<R> fmt::Debug for AsyncReadSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncReadSource")
            .field("encoding", &self.encoding)
            .field("chunk_size", &self.chunk_size)
            .field("flowing", &*self.flowing.borrow())
            .field("attached", &self.task.is_some())
            .finish_non_exhaustive()
    }
}

struct Pump<R> {
    reader: R,
    decoder: TextDecoder,
    flowing: watch::Receiver<bool>,
    sink: SourceSink<ReadSourceError>,
    chunk_size: usize,
}

impl<R> Pump<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn run(mut self) {
        let mut buf = vec![0_u8; self.chunk_size];
        loop {
            if !self.wait_until_flowing().await {
                return;
            }
            match self.reader.read(&mut buf).await {
                Ok(0) => {
                    self.finish().await;
                    return;
                }
                Ok(read) => {
                    let text = self.decoder.decode(&buf[..read]);
                    trace!(bytes = read, decoded = text.len(), "byte stream chunk decoded");
                    if text.is_empty() {
                        continue;
                    }
                    if !self.wait_until_flowing().await || !self.sink.on_data(&text) {
                        return;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "byte stream read failed");
                    self.sink.on_error(ReadSourceError::Io(Arc::new(err)));
                    return;
                }
            }
        }
    }

    async fn finish(&mut self) {
        let tail = self.decoder.finish();
        if !self.wait_until_flowing().await {
            return;
        }
        if !tail.is_empty() {
            self.sink.on_data(&tail);
        }
        self.sink.on_end();
        debug!("byte stream reached end of input");
    }

    /// 数据源被丢弃（发送端关闭）时返回 `false`。
    async fn wait_until_flowing(&mut self) -> bool {
        let open = self.flowing.wait_for(|flowing| *flowing).await.is_ok();
        if !open {
            trace!("byte stream source dropped; pump exits");
        }
        open
    }
}
