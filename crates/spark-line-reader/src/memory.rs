//! 运行时无关的内存数据源。
//!
//! # 设计动机（Why）
//! - 测试需要精确控制“数据何时到达、何时结束、何时出错”，并观测组装器施加的流控；
//! - 调用方若已持有整段文本，也可直接借助本数据源获得逐行读取能力，而无需引入异步运行时。
//!
//! # 行为约定（What）
//! - 写入的分片在暂停态下排队，流动态下按写入顺序投递；
//! - 结束事件在所有排队分片投递完毕后才会投递；
//! - 错误事件不受暂停约束，写入后立即投递（尚未被包装时则在 `attach` 时投递）；
//! - 投递在内部锁之外进行，同一时刻只有一个线程负责投递，保证事件严格串行。
//!
//! # 使用方式（How）
//! - [`MemorySource::new`] 返回数据源与写入端；数据源交给 [`LineAssembler`](crate::LineAssembler)，
//!   写入端留给生产者，并可通过 [`MemoryWriter::stats`] 观测流控状态。

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::encoding::TextEncoding;
use crate::source::{SourceSink, TextSource};

/// 内存数据源的数据源端，交给组装器持有。
pub struct MemorySource<E> {
    inner: Arc<Mutex<Inner<E>>>,
}

/// 内存数据源的写入端。
pub struct MemoryWriter<E> {
    inner: Arc<Mutex<Inner<E>>>,
}

/// 内存数据源的流控快照。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryStats {
    /// 是否处于流动态。
    pub flowing: bool,
    /// 尚未投递的分片数量。
    pub queued_chunks: usize,
    /// `pause` 被调用的次数。
    pub pause_calls: usize,
    /// `resume` 被调用的次数。
    pub resume_calls: usize,
    /// 是否已交付事件出口且组装器仍存活。
    pub attached: bool,
    /// 结束事件是否已投递。
    pub end_delivered: bool,
    /// 组装器配置的解码方案。
    pub encoding: TextEncoding,
}

struct Inner<E> {
    queue: VecDeque<String>,
    end_requested: bool,
    end_delivered: bool,
    pending_error: Option<E>,
    flowing: bool,
    delivering: bool,
    sink: Option<SourceSink<E>>,
    encoding: TextEncoding,
    pause_calls: usize,
    resume_calls: usize,
}

enum Event<E> {
    Data(String),
    End,
    Error(E),
}

impl<E: Clone + fmt::Debug + Send + Sync + 'static> MemorySource<E> {
    /// 创建一对数据源与写入端；数据源初始为暂停态。
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (MemorySource<E>, MemoryWriter<E>) {
        let inner = Arc::new(Mutex::new(Inner {
            queue: VecDeque::new(),
            end_requested: false,
            end_delivered: false,
            pending_error: None,
            flowing: false,
            delivering: false,
            sink: None,
            encoding: TextEncoding::default(),
            pause_calls: 0,
            resume_calls: 0,
        }));
        (
            MemorySource {
                inner: Arc::clone(&inner),
            },
            MemoryWriter { inner },
        )
    }
}

impl<E: Clone + fmt::Debug + Send + Sync + 'static> TextSource for MemorySource<E> {
    type Error = E;

    fn set_encoding(&mut self, encoding: TextEncoding) {
        self.inner.lock().encoding = encoding;
    }

    fn attach(&mut self, sink: SourceSink<E>) {
        self.inner.lock().sink = Some(sink);
        deliver(&self.inner);
    }

    fn pause(&mut self) {
        let mut inner = self.inner.lock();
        inner.pause_calls += 1;
        inner.flowing = false;
    }

    fn resume(&mut self) {
        {
            let mut inner = self.inner.lock();
            inner.resume_calls += 1;
            inner.flowing = true;
        }
        deliver(&self.inner);
    }
}

impl<E: Clone> MemoryWriter<E> {
    /// 写入一段文本；结束之后的写入被忽略并返回 `false`。
    pub fn write(&self, chunk: impl Into<String>) -> bool {
        let chunk = chunk.into();
        {
            let mut inner = self.inner.lock();
            if inner.end_requested {
                trace!(len = chunk.len(), "write after end ignored");
                return false;
            }
            if chunk.is_empty() {
                return true;
            }
            inner.queue.push_back(chunk);
        }
        deliver(&self.inner);
        true
    }

    /// 标记数据已写完；排队分片投递完毕后投递结束事件。
    pub fn end(&self) {
        self.inner.lock().end_requested = true;
        deliver(&self.inner);
    }

    /// 依次写入所有分片后结束。
    pub fn end_with<I, T>(&self, chunks: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for chunk in chunks {
            self.write(chunk);
        }
        self.end();
    }

    /// 上报致命错误。
    pub fn fail(&self, err: E) {
        self.inner.lock().pending_error = Some(err);
        deliver(&self.inner);
    }

    /// 当前流控快照。
    pub fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock();
        MemoryStats {
            flowing: inner.flowing,
            queued_chunks: inner.queue.len(),
            pause_calls: inner.pause_calls,
            resume_calls: inner.resume_calls,
            attached: inner.sink.as_ref().is_some_and(SourceSink::is_attached),
            end_delivered: inner.end_delivered,
            encoding: inner.encoding,
        }
    }
}

impl<E> fmt::Debug for MemorySource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource").finish_non_exhaustive()
    }
}

impl<E> fmt::Debug for MemoryWriter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryWriter").finish_non_exhaustive()
    }
}

fn deliver<E: Clone>(inner: &Arc<Mutex<Inner<E>>>) {
    {
        let mut guard = inner.lock();
        if guard.delivering || guard.sink.is_none() {
            return;
        }
        guard.delivering = true;
    }

    loop {
        let (sink, event) = {
            let mut guard = inner.lock();
            let Some(sink) = guard.sink.clone() else {
                guard.delivering = false;
                return;
            };
            match next_event(&mut *guard) {
                Some(event) => (sink, event),
                None => {
                    guard.delivering = false;
                    return;
                }
            }
        };

        let attached = match event {
            Event::Data(chunk) => sink.on_data(&chunk),
            Event::End => sink.on_end(),
            Event::Error(err) => sink.on_error(err),
        };
        if !attached {
            trace!("line assembler dropped, memory source stops delivering");
            let mut guard = inner.lock();
            guard.sink = None;
            guard.delivering = false;
            return;
        }
    }
}

fn next_event<E>(inner: &mut Inner<E>) -> Option<Event<E>> {
    if let Some(err) = inner.pending_error.take() {
        return Some(Event::Error(err));
    }
    if !inner.flowing {
        return None;
    }
    if let Some(chunk) = inner.queue.pop_front() {
        return Some(Event::Data(chunk));
    }
    if inner.end_requested && !inner.end_delivered {
        inner.end_delivered = true;
        return Some(Event::End);
    }
    None
}
