mod common;

use common::{ FailingNotifier, Kind, RecordingNotifier };
use esp_ble_peripheral::{
    ble::{ SubscribeEvent, CONN_HANDLE_NONE },
    heart_rate::{ self, HeartRateTask, HEART_RATE_MEASUREMENT_UUID },
};

fn subscribe(conn_handle: u16, indicate: bool) -> SubscribeEvent {
    SubscribeEvent { conn_handle, notify: false, indicate }
}

#[test]
fn no_indication_without_subscription() {
    let app = heart_rate::app("HR", false).unwrap();
    let notifier = RecordingNotifier::default();
    let mut task = HeartRateTask::new(|| 5, app.state.clone());

    assert!(!task.tick(&notifier).unwrap());
    assert!(notifier.sent().is_empty());
    // 没有订阅也要更新读到的值
    assert_eq!(app.on_read(HEART_RATE_MEASUREMENT_UUID), Ok(vec![0x00, 65]));
}

#[test]
fn indicates_after_subscribe() {
    let app = heart_rate::app("HR", false).unwrap();
    let notifier = RecordingNotifier::default();
    let mut values = [0u32, 20, 42].into_iter();
    let mut task = HeartRateTask::new(move || values.next().unwrap_or(0), app.state.clone());

    app.on_subscribe(HEART_RATE_MEASUREMENT_UUID, subscribe(1, true));
    assert!(task.tick(&notifier).unwrap());
    assert!(task.tick(&notifier).unwrap());
    assert!(task.tick(&notifier).unwrap());

    assert_eq!(notifier.sent(), vec![
        (Kind::Indicate, HEART_RATE_MEASUREMENT_UUID, vec![0x00, 60]),
        (Kind::Indicate, HEART_RATE_MEASUREMENT_UUID, vec![0x00, 80]),
        (Kind::Indicate, HEART_RATE_MEASUREMENT_UUID, vec![0x00, 60])
    ]);
}

#[test]
fn stops_after_unsubscribe_or_disconnect() {
    let app = heart_rate::app("HR", false).unwrap();
    let notifier = RecordingNotifier::default();
    let mut task = HeartRateTask::new(|| 7, app.state.clone());

    app.on_subscribe(HEART_RATE_MEASUREMENT_UUID, subscribe(1, true));
    app.on_subscribe(HEART_RATE_MEASUREMENT_UUID, subscribe(1, false));
    assert!(!task.tick(&notifier).unwrap());

    app.on_subscribe(HEART_RATE_MEASUREMENT_UUID, subscribe(2, true));
    // 别的连接断开不影响当前订阅
    app.on_disconnect(9);
    assert!(task.tick(&notifier).unwrap());
    app.on_disconnect(2);
    assert!(!task.tick(&notifier).unwrap());

    assert_eq!(notifier.sent().len(), 1);
}

#[test]
fn stack_subscription_sends_nothing() {
    let app = heart_rate::app("HR", false).unwrap();
    let notifier = RecordingNotifier::default();
    let mut task = HeartRateTask::new(|| 0, app.state.clone());

    app.on_subscribe(HEART_RATE_MEASUREMENT_UUID, subscribe(CONN_HANDLE_NONE, true));
    assert!(!task.tick(&notifier).unwrap());
    assert!(notifier.sent().is_empty());
}

#[test]
fn send_failure_is_reported() {
    let app = heart_rate::app("HR", false).unwrap();
    let mut task = HeartRateTask::new(|| 0, app.state.clone());

    app.on_subscribe(HEART_RATE_MEASUREMENT_UUID, subscribe(1, true));
    assert!(task.tick(&FailingNotifier).is_err());
    // 下一轮照常继续
    assert!(task.tick(&RecordingNotifier::default()).unwrap());
}
