//! 单槽唤醒原语。
//!
//! 任意时刻至多持有一个等待者；每次挂起都重新 `arm` 一个新的一次性通道，
//! 到达事件通过 `notify` 恰好唤醒一次，不存在监听者累积。

use futures::channel::oneshot;

#[derive(Debug, Default)]
pub(crate) struct WakeSlot {
    waiter: Option<oneshot::Sender<()>>,
}

impl WakeSlot {
    /// 登记新的等待者并返回其接收端；旧的等待者（若有）被丢弃。
    pub(crate) fn arm(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.waiter = Some(tx);
        rx
    }

    /// 唤醒当前等待者；返回是否确有等待者被唤醒。
    pub(crate) fn notify(&mut self) -> bool {
        match self.waiter.take() {
            // 接收端已被丢弃时 send 失败，视同无人等待。
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub(crate) fn disarm(&mut self) {
        self.waiter = None;
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.waiter.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_fires_armed_waiter_exactly_once() {
        let mut slot = WakeSlot::default();
        let mut rx = slot.arm();
        assert!(slot.is_armed());
        assert!(slot.notify());
        assert!(!slot.is_armed());
        assert!(!slot.notify(), "同一等待者不得被唤醒两次");
        assert_eq!(rx.try_recv(), Ok(Some(())));
    }

    #[test]
    fn rearming_replaces_previous_waiter() {
        let mut slot = WakeSlot::default();
        let mut stale = slot.arm();
        let mut fresh = slot.arm();
        assert!(slot.notify());
        assert!(stale.try_recv().is_err(), "被替换的等待者应观察到发送端被丢弃");
        assert_eq!(fresh.try_recv(), Ok(Some(())));
    }

    #[test]
    fn notify_without_waiter_is_noop() {
        let mut slot = WakeSlot::default();
        assert!(!slot.notify());
        let rx = slot.arm();
        drop(rx);
        assert!(!slot.notify());
        slot.disarm();
        assert!(!slot.is_armed());
    }
}
