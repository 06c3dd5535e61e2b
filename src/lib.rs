// 协议栈无关的部分（属性分发、订阅状态、广播编码、HID 报告）在主机上也能编译和测试，
// 只有 `ble::start` 和 `init` 依赖 ESP-IDF。
pub mod ble;
pub mod battery;
pub mod heart_rate;
pub mod hid;

/**
 * 系统初始化函数。
 *
 * 链接 ESP-IDF 补丁、初始化日志，并获取默认 NVS 分区。获取分区时会初始化 NVS flash，
 * 如果没有空闲页或者版本不一致会先擦除再初始化。NimBLE 用它保存 PHY 校准数据和绑定信息。
 *
 * @return Result<EspDefaultNvsPartition> 需要在程序运行期间一直持有的 NVS 分区。
 */
#[cfg(target_os = "espidf")]
pub fn init() -> anyhow::Result<esp_idf_svc::nvs::EspDefaultNvsPartition> {
    // 链接SDK中的补丁，以修正某些功能的兼容性问题。
    esp_idf_svc::sys::link_patches();

    // 初始化日志系统，为后续的调试和错误追踪提供支持。
    esp_idf_svc::log::EspLogger::initialize_default();

    let nvs = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;
    Ok(nvs)
}
