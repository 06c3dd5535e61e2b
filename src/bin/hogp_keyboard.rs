use esp_ble_peripheral::hid::{ self, Keyboard, Typist };
use esp_idf_svc::hal::delay::FreeRtos;

#[toml_cfg::toml_config]
#[derive(Debug)]
pub struct Config {
    #[default("ESP32 Keyboard")]
    device_name: &'static str,
    #[default(1000)]
    key_interval_ms: u32,
    #[default("hello world\n")]
    demo_text: &'static str,
    #[default(true)]
    bonding: bool,
    #[default(100)]
    battery_level: u8,
}

fn main() -> anyhow::Result<()> {
    // 初始化系统、日志和NVS flash。
    let _nvs = esp_ble_peripheral::init()?;
    log::info!("config: {:?}", CONFIG);

    let app = hid::app(CONFIG.device_name, CONFIG.bonding, CONFIG.battery_level)?;
    let keyboard = Keyboard::new(app.state.clone());
    let notifier = esp_ble_peripheral::ble::start(app)?;

    // 主机订阅输入报告后开始逐个字符输入演示文本
    let mut typist = Typist::new(CONFIG.demo_text, keyboard);
    loop {
        if let Err(e) = typist.tick(&notifier) {
            log::error!("Failed to send keyboard report: {}", e);
        }
        FreeRtos::delay_ms(CONFIG.key_interval_ms);
    }
}
