//! [`LineAssembler`]：单消费者、背压感知的逐行读取器。

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::stream::{self, Stream};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::ReadResult;
use crate::encoding::TextEncoding;
use crate::error::LineReaderError;
use crate::options::LineReaderOptions;
use crate::source::{SourceSink, TextSource};
use crate::state::{LineState, Step};

/// 包装一个增量文本源，向单一消费者提供“读取下一行”操作。
///
/// # 教案式说明
///
/// ## 意图 (Why)
/// - 调用方不必关心分片边界、行终止符跨分片、流结束判定与错误时序，只需循环调用
///   [`read_line`](Self::read_line) 直到得到 `Ok(None)`；
/// - 组装器按需拉取：数据源默认暂停，只有存在未满足的读取请求时才恢复流动，
///   从而永远不会比消费者读得更快。
///
/// ## 逻辑 (How)
/// - 状态（已完成行、残余分片、终态错误、在途标记、单槽唤醒）集中在内部状态机中，
///   由数据源事件与读取请求各自在短临界区内推进；
/// - `read_line` 在调用时即完成并发检查与同步兑现；需要等待时登记唤醒、恢复数据源，
///   返回的 [`ReadLine`] 在被唤醒后暂停数据源（若未结束）并重新判定。
///
/// ## 契约 (What)
/// - 行的交付顺序与终止符在字符流中的出现顺序一致；
/// - 已缓冲的行总是先于错误与流结束标记交付；错误粘滞，此后每次读取都返回同一错误；
/// - 在途请求存在时再次读取，立即得到 [`LineReaderError::ConcurrentRead`]，在途请求不受影响；
/// - 顺序调用（上一次完成后再发起下一次）是预期的使用方式。
///
/// ## 注意事项 (Trade-offs)
/// - 不支持超时；需要超时的调用方应在更高层与计时器竞速，丢弃落败的 [`ReadLine`] 即可取消请求；
/// - 组装器独占数据源流控，包装后不应再从外部调用数据源的 `pause`/`resume`。
pub struct LineAssembler<S: TextSource> {
    state: Arc<Mutex<LineState<S::Error>>>,
    source: Mutex<S>,
    encoding: TextEncoding,
}

impl<S: TextSource> LineAssembler<S> {
    /// 以默认选项（UTF-8）包装数据源。
    pub fn new(source: S) -> Self {
        Self::with_options(source, LineReaderOptions::default())
    }

    /// 以给定选项包装数据源。
    ///
    /// 依次配置编码、暂停数据源并交付事件出口；构造过程本身不消费任何数据。
    pub fn with_options(mut source: S, options: impl Into<LineReaderOptions>) -> Self {
        let options = options.into();
        let state = Arc::new(Mutex::new(LineState::default()));

        source.set_encoding(options.encoding);
        // 先暂停再交付出口：已处于流动态的数据源在 attach 时不得投递任何数据。
        source.pause();
        source.attach(SourceSink::new(&state));
        debug!(encoding = %options.encoding, "line assembler attached to source");

        Self {
            state,
            source: Mutex::new(source),
            encoding: options.encoding,
        }
    }

    /// 交给数据源的解码方案。
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// 读取下一行。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：返回的 future 产出
    ///   - `Ok(Some(line))`：去除终止符及其前单个 `\r` 的一行；
    ///   - `Ok(None)`：数据源已结束且没有剩余行；
    ///   - `Err(LineReaderError::Source(e))`：数据源错误（缓冲行耗尽之后）；
    ///   - `Err(LineReaderError::ConcurrentRead)`：已有在途请求。
    /// - **执行 (How)**：并发检查与同步兑现在调用时立即完成，与是否轮询返回值无关；
    ///   只有“流仍开放且无缓冲”时才登记在途请求并恢复数据源。
    /// - **风险 (Trade-offs)**：丢弃尚未完成的 [`ReadLine`] 会撤销请求并重新暂停数据源，
    ///   已到达的数据仍保留在缓冲中，不会丢失。
    pub fn read_line(&self) -> ReadLine<'_, S> {
        let step = self.state.lock().begin_request();
        match step {
            Step::Resolved(outcome) => {
                if matches!(outcome, Err(LineReaderError::ConcurrentRead)) {
                    debug!("rejected read_line: a read is already in flight");
                }
                ReadLine {
                    phase: Phase::Ready(outcome),
                }
            }
            Step::Wait(wake) => {
                trace!("nothing buffered, resuming source");
                self.source.lock().resume();
                ReadLine {
                    phase: Phase::Waiting { reader: self, wake },
                }
            }
        }
    }

    /// 读取并丢弃至多 `count` 行，返回实际跳过的行数。
    ///
    /// 提前到达流结束时返回值小于 `count`；读取出错时立即返回该错误，已跳过的行数不再上报。
    pub async fn skip(&self, count: usize) -> Result<usize, LineReaderError<S::Error>> {
        let mut skipped = 0;
        while skipped < count {
            match self.read_line().await? {
                Some(_) => skipped += 1,
                None => break,
            }
        }
        Ok(skipped)
    }

    /// 以 [`Stream`] 形式逐行消费。
    ///
    /// 流在结束标记处终止；遇到错误时产出一次 `Err` 后终止。流存活期间仍受单消费者约束，
    /// 期间直接调用 [`read_line`](Self::read_line) 会得到 [`LineReaderError::ConcurrentRead`]。
    pub fn lines(&self) -> impl Stream<Item = Result<String, LineReaderError<S::Error>>> + '_ {
        stream::unfold(Some(self), |reader| async move {
            let reader = reader?;
            match reader.read_line().await {
                Ok(Some(line)) => Some((Ok(line), Some(reader))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    fn finish_wait(&self) -> Step<S::Error> {
        let retired = self.state.lock().is_retired();
        if !retired {
            self.source.lock().pause();
        }

        let step = self.state.lock().after_wake();
        if let Step::Wait(_) = step {
            trace!("woken without a resolution, resuming source again");
            self.source.lock().resume();
        }
        step
    }

    fn abandon_wait(&self) {
        let retired = {
            let mut state = self.state.lock();
            state.abandon_request();
            state.is_retired()
        };
        if !retired {
            self.source.lock().pause();
        }
        debug!("pending read_line dropped before completion");
    }
}

impl<S: TextSource> fmt::Debug for LineAssembler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineAssembler")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// [`LineAssembler::read_line`] 返回的 future。
#[must_use = "dropping a pending ReadLine cancels the read"]
pub struct ReadLine<'a, S: TextSource> {
    phase: Phase<'a, S>,
}

enum Phase<'a, S: TextSource> {
    Ready(ReadResult<S::Error>),
    Waiting {
        reader: &'a LineAssembler<S>,
        wake: oneshot::Receiver<()>,
    },
    Done,
}

// 不做结构化 pin 投影，所有字段均按值移动。
impl<S: TextSource> Unpin for ReadLine<'_, S> {}

impl<S: TextSource> Future for ReadLine<'_, S> {
    type Output = ReadResult<S::Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        loop {
            match mem::replace(&mut this.phase, Phase::Done) {
                Phase::Ready(outcome) => return Poll::Ready(outcome),
                Phase::Waiting { reader, mut wake } => {
                    // 发送端被丢弃同样视为一次唤醒，交由重新判定处理。
                    if Pin::new(&mut wake).poll(cx).is_pending() {
                        this.phase = Phase::Waiting { reader, wake };
                        return Poll::Pending;
                    }
                    match reader.finish_wait() {
                        Step::Resolved(outcome) => return Poll::Ready(outcome),
                        Step::Wait(wake) => this.phase = Phase::Waiting { reader, wake },
                    }
                }
                Phase::Done => panic!("`ReadLine` polled after completion"),
            }
        }
    }
}

impl<S: TextSource> Drop for ReadLine<'_, S> {
    fn drop(&mut self) {
        if let Phase::Waiting { reader, .. } = &self.phase {
            reader.abandon_wait();
        }
    }
}

impl<S: TextSource> fmt::Debug for ReadLine<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Ready(_) => "ready",
            Phase::Waiting { .. } => "waiting",
            Phase::Done => "done",
        };
        f.debug_struct("ReadLine").field("phase", &phase).finish()
    }
}
