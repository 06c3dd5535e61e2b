/// NimBLE 用这个句柄表示"不是来自某个连接"，例如恢复已绑定设备的订阅
pub const CONN_HANDLE_NONE: u16 = 0xffff;

/// 协议栈上报的一次 CCCD 变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeEvent {
    pub conn_handle: u16,
    pub notify: bool,
    pub indicate: bool,
}

/// 由协议栈本身发起的访问（读、订阅），不属于任何连接
pub fn is_stack_handle(conn_handle: u16) -> bool {
    conn_handle == CONN_HANDLE_NONE
}

impl SubscribeEvent {
    /// 由协议栈本身发起，而不是某个对端写 CCCD
    pub fn from_stack(&self) -> bool {
        is_stack_handle(self.conn_handle)
    }
}

/// 单个特征的订阅状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subscription {
    pub conn_handle: Option<u16>,
    pub notify: bool,
    pub indicate: bool,
}

impl Subscription {
    pub fn on_subscribe(&mut self, event: SubscribeEvent) {
        if event.from_stack() {
            log::info!(
                "subscribe by nimble stack; notify={} indicate={}",
                event.notify,
                event.indicate
            );
            self.conn_handle = None;
        } else {
            log::info!(
                "subscribe event; conn_handle={} notify={} indicate={}",
                event.conn_handle,
                event.notify,
                event.indicate
            );
            self.conn_handle = Some(event.conn_handle);
        }
        self.notify = event.notify;
        self.indicate = event.indicate;
    }

    pub fn on_disconnect(&mut self, conn_handle: u16) {
        if self.conn_handle == Some(conn_handle) {
            *self = Self::default();
        }
    }

    /// 通知只发给开启了 notify 且连接已知的对端
    pub fn can_notify(&self) -> Option<u16> {
        self.conn_handle.filter(|_| self.notify)
    }

    pub fn can_indicate(&self) -> Option<u16> {
        self.conn_handle.filter(|_| self.indicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(conn_handle: u16, notify: bool, indicate: bool) -> SubscribeEvent {
        SubscribeEvent { conn_handle, notify, indicate }
    }

    #[test]
    fn starts_unsubscribed() {
        let sub = Subscription::default();
        assert_eq!(sub.can_notify(), None);
        assert_eq!(sub.can_indicate(), None);
    }

    #[test]
    fn indicate_requires_flag_and_connection() {
        let mut sub = Subscription::default();
        sub.on_subscribe(event(1, false, true));
        assert_eq!(sub.can_indicate(), Some(1));
        assert_eq!(sub.can_notify(), None);

        sub.on_subscribe(event(1, false, false));
        assert_eq!(sub.can_indicate(), None);
    }

    #[test]
    fn stack_restore_keeps_flags_without_connection() {
        let mut sub = Subscription::default();
        sub.on_subscribe(event(CONN_HANDLE_NONE, true, false));
        assert!(sub.notify);
        assert_eq!(sub.conn_handle, None);
        assert_eq!(sub.can_notify(), None);
    }

    #[test]
    fn stack_handle_is_not_a_connection() {
        assert!(is_stack_handle(0xffff));
        assert!(!is_stack_handle(0));
        assert!(event(CONN_HANDLE_NONE, false, true).from_stack());
        assert!(!event(1, false, true).from_stack());
    }

    #[test]
    fn disconnect_only_clears_matching_connection() {
        let mut sub = Subscription::default();
        sub.on_subscribe(event(3, true, false));

        sub.on_disconnect(4);
        assert_eq!(sub.can_notify(), Some(3));

        sub.on_disconnect(3);
        assert_eq!(sub, Subscription::default());
    }
}
