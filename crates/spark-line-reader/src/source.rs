//! 被包装数据源的契约。
//!
//! # 设计动机（Why）
//! - 组装器与传输无关：文件、套接字、进程输入只要满足本模块的 [`TextSource`] 契约即可被包装；
//! - 数据源以“事件推送”的方式工作，[`SourceSink`] 是它向组装器投递事件的唯一入口。
//!
//! # 契约说明（What）
//! - 数据源负责解码，投递给组装器的总是已解码文本；
//! - `pause`/`resume` 必须幂等：重复调用不得改变结果，也不得丢失或重复投递数据；
//! - 事件之间严格串行：`on_data`/`on_end`/`on_error` 在组装器内部锁保护下逐个执行完毕；
//! - 组装器一经包装数据源即独占其流控，外部组件不得再直接调用 `pause`/`resume`。

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::encoding::TextEncoding;
use crate::state::LineState;

/// 可暂停、按事件推送已解码文本的增量数据源。
///
/// # 教案式说明
/// - **意图 (Why)**：抽象出组装器真正依赖的最小能力集，使核心逻辑不绑定任何运行时或传输；
/// - **逻辑 (How)**：组装器构造时依次调用 `set_encoding` → `pause` → `attach`，此后仅在存在
///   未满足的读取请求时调用 `resume`，请求兑现后立即 `pause`；
/// - **契约 (What)**：
///   - `attach` 交付的 [`SourceSink`] 是事件出口，数据源应在流动态下通过它投递数据；
///   - 暂停态下不得调用 [`SourceSink::on_data`]，但错误可随时上报；
///   - `on_end` 至多有意义地调用一次，之后的数据会被忽略；
/// - **权衡 (Trade-offs)**：`Error: Clone` 是错误粘滞语义的代价，不可克隆的错误请包装为 `Arc`。
pub trait TextSource {
    /// 数据源的致命错误类型。
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    /// 配置解码方案；在 `attach` 之前调用。
    fn set_encoding(&mut self, encoding: TextEncoding);

    /// 交付事件出口。
    fn attach(&mut self, sink: SourceSink<Self::Error>);

    /// 停止投递数据，幂等。
    fn pause(&mut self);

    /// 开始（或继续）投递数据，幂等。
    fn resume(&mut self);
}

/// 数据源向组装器投递事件的句柄。
///
/// 仅持有组装器状态的弱引用：组装器被丢弃后，所有投递方法返回 `false`，
/// 数据源据此停止生产。
pub struct SourceSink<E> {
    state: Weak<Mutex<LineState<E>>>,
}

impl<E> SourceSink<E> {
    pub(crate) fn new(state: &Arc<Mutex<LineState<E>>>) -> Self {
        Self {
            state: Arc::downgrade(state),
        }
    }

    /// 组装器是否仍然存活。
    pub fn is_attached(&self) -> bool {
        self.state.strong_count() > 0
    }
}

impl<E: Clone> SourceSink<E> {
    /// 投递一段已解码文本。
    pub fn on_data(&self, chunk: &str) -> bool {
        self.with_state(|state| {
            state.on_data(chunk);
        })
    }

    /// 通知数据源已耗尽。
    pub fn on_end(&self) -> bool {
        self.with_state(LineState::on_end)
    }

    /// 上报致命错误。
    pub fn on_error(&self, err: E) -> bool {
        self.with_state(|state| state.on_error(err))
    }

    fn with_state(&self, f: impl FnOnce(&mut LineState<E>)) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                let mut guard = state.lock();
                f(&mut *guard);
                true
            }
            None => false,
        }
    }
}

impl<E> Clone for SourceSink<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<E> fmt::Debug for SourceSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSink")
            .field("attached", &self.is_attached())
            .finish()
    }
}
