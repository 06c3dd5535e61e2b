use esp_ble_peripheral::heart_rate::{ self, HeartRateTask };
use esp_idf_svc::hal::delay::FreeRtos;

#[toml_cfg::toml_config]
#[derive(Debug)]
pub struct Config {
    #[default("ESP32 Heart Rate")]
    device_name: &'static str,
    #[default(1000)]
    interval_ms: u32,
    #[default(true)]
    bonding: bool,
}

fn main() -> anyhow::Result<()> {
    // 初始化系统、日志和NVS flash。
    let _nvs = esp_ble_peripheral::init()?;
    log::info!("config: {:?}", CONFIG);

    let app = heart_rate::app(CONFIG.device_name, CONFIG.bonding)?;
    let state = app.state.clone();
    let notifier = esp_ble_peripheral::ble::start(app)?;

    // 主任务就是心率任务：更新心率，有订阅时发 indication
    log::info!("heart rate task started!");
    let mut task = HeartRateTask::new(|| unsafe { esp_idf_svc::sys::esp_random() }, state);
    loop {
        if let Err(e) = task.tick(&notifier) {
            log::error!("Failed to send heart rate indication: {}", e);
        }
        FreeRtos::delay_ms(CONFIG.interval_ms);
    }
}
