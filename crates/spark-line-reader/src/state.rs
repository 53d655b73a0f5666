//! 行组装状态机。
//!
//! # 教案级注释
//!
//! ## 意图（Why）
//! - 将“分片 → 完整行”的切分与“读取请求如何被兑现”的判定从 IO/调度中剥离，
//!   形成可单独测试的纯同步状态对象；
//! - 数据源事件处理与读取判定都只是对该对象的一次短临界区操作，不存在隐藏的重入。
//!
//! ## 逻辑（How）
//! - `pending`：已完成且剥离终止符的行，FIFO；
//! - `partial`：自上一个终止符以来累积的字符；`None` 表示数据源已结束（退休态，单调不可逆）；
//! - `error`：首个数据源错误，粘滞且不可覆盖；
//! - `request_in_flight` 与 `wake`：在途请求标记与单槽唤醒。
//!
//! ## 契约（What）
//! - `pending` 中永不包含 `\n`，行尾单个 `\r` 已被剥离；
//! - `resolve` 的优先级固定为：已缓冲行 > 终态错误 > 流结束 > 需要等待。

use std::collections::VecDeque;
use std::mem;

use futures::channel::oneshot;
use tracing::{debug, trace};

use crate::error::LineReaderError;
use crate::wake::WakeSlot;
use crate::ReadResult;

const LINE_TERMINATOR: char = '\n';
const CARRIAGE_RETURN: char = '\r';

/// 读取请求在临界区内的判定结果。
#[derive(Debug)]
pub(crate) enum Step<E> {
    /// 请求已得到结果。
    Resolved(ReadResult<E>),
    /// 需要等待下一次到达事件；请求已被标记为在途，唤醒已登记。
    Wait(oneshot::Receiver<()>),
}

#[derive(Debug)]
pub(crate) struct LineState<E> {
    pending: VecDeque<String>,
    partial: Option<String>,
    error: Option<E>,
    request_in_flight: bool,
    wake: WakeSlot,
}

impl<E> Default for LineState<E> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            partial: Some(String::new()),
            error: None,
            request_in_flight: false,
            wake: WakeSlot::default(),
        }
    }
}

impl<E: Clone> LineState<E> {
    /// 处理一段已解码文本；本段内至少完成一行时唤醒一次等待者。
    ///
    /// 返回本段完成的行数。
    pub(crate) fn on_data(&mut self, chunk: &str) -> usize {
        let Some(partial) = self.partial.as_mut() else {
            trace!(len = chunk.len(), "data delivered after end of input; ignored");
            return 0;
        };

        let mut completed = 0;
        let mut rest = chunk;
        while let Some(idx) = rest.find(LINE_TERMINATOR) {
            partial.push_str(&rest[..idx]);
            self.pending.push_back(chomp(mem::take(partial)));
            rest = &rest[idx + LINE_TERMINATOR.len_utf8()..];
            completed += 1;
        }
        partial.push_str(rest);

        if completed > 0 {
            trace!(completed, buffered = self.pending.len(), "chunk completed lines");
            self.wake.notify();
        }
        completed
    }

    /// 数据源耗尽：冲刷残余分片并进入退休态，无条件唤醒。
    pub(crate) fn on_end(&mut self) {
        match self.partial.take() {
            Some(rest) if !rest.is_empty() => {
                self.pending.push_back(chomp(rest));
                debug!(buffered = self.pending.len(), "source ended; trailing partial flushed as last line");
            }
            Some(_) => debug!(buffered = self.pending.len(), "source ended"),
            None => trace!("duplicate end event"),
        }
        self.wake.notify();
    }

    /// 记录首个数据源错误并唤醒；后续错误不覆盖。
    pub(crate) fn on_error(&mut self, err: E) {
        if self.error.is_none() {
            debug!(buffered = self.pending.len(), "source reported a fatal error");
            self.error = Some(err);
        } else {
            trace!("ignoring subsequent source error");
        }
        self.wake.notify();
    }

    /// 按优先级尝试兑现一次读取；`None` 表示需要等待。
    pub(crate) fn resolve(&mut self) -> Option<ReadResult<E>> {
        if let Some(line) = self.pending.pop_front() {
            return Some(Ok(Some(line)));
        }
        if let Some(err) = &self.error {
            return Some(Err(LineReaderError::Source(err.clone())));
        }
        if self.partial.is_none() {
            return Some(Ok(None));
        }
        None
    }

    /// 新请求到来时的判定：拒绝并发、尝试同步兑现，否则登记在途并挂起。
    pub(crate) fn begin_request(&mut self) -> Step<E> {
        if self.request_in_flight {
            return Step::Resolved(Err(LineReaderError::ConcurrentRead));
        }
        match self.resolve() {
            Some(outcome) => Step::Resolved(outcome),
            None => self.suspend(),
        }
    }

    /// 唤醒后的判定：兑现则清除在途标记，否则在同一临界区内重新登记。
    pub(crate) fn after_wake(&mut self) -> Step<E> {
        match self.resolve() {
            Some(outcome) => {
                self.request_in_flight = false;
                Step::Resolved(outcome)
            }
            None => self.suspend(),
        }
    }

    /// 在途请求被放弃（对应 future 被丢弃）。
    pub(crate) fn abandon_request(&mut self) {
        self.request_in_flight = false;
        self.wake.disarm();
    }

    /// 数据源是否已结束（`partial` 已退休）。
    pub(crate) fn is_retired(&self) -> bool {
        self.partial.is_none()
    }

    fn suspend(&mut self) -> Step<E> {
        self.request_in_flight = true;
        Step::Wait(self.wake.arm())
    }
}

/// 剥离行尾单个 `\r`。
fn chomp(mut line: String) -> String {
    if line.ends_with(CARRIAGE_RETURN) {
        line.pop();
    }
    line
}
