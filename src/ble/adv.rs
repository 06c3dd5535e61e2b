//! 传统广播（31 字节）与扫描响应的原始数据编码。
//!
//! NimBLE 的 `ble_hs_adv_fields` 能表达的字段这里都能写出来，
//! 再通过 `set_raw_data` 交给协议栈，这样主机上也能测试负载内容。

use std::fmt;

use anyhow::bail;

pub const MAX_ADV_LEN: usize = 31;

pub type AdvData = heapless::Vec<u8, MAX_ADV_LEN>;

const AD_FLAGS: u8 = 0x01;
const AD_COMPLETE_UUID16: u8 = 0x03;
const AD_SHORT_NAME: u8 = 0x08;
const AD_COMPLETE_NAME: u8 = 0x09;
const AD_TX_POWER: u8 = 0x0a;
const AD_APPEARANCE: u8 = 0x19;
const AD_LE_ADDRESS: u8 = 0x1b;
const AD_LE_ROLE: u8 = 0x1c;

pub const FLAG_LE_GENERAL_DISC: u8 = 0x02;
pub const FLAG_BREDR_UNSUPPORTED: u8 = 0x04;
const LE_ROLE_PERIPHERAL_ONLY: u8 = 0x00;

/// 本机蓝牙地址，`val` 与 NimBLE 一样按小端存放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdAddr {
    pub val: [u8; 6],
    pub addr_type: u8,
}

impl BdAddr {
    /// 公共地址或随机地址，对应 AD 结构里最后一个字节的 bit0
    pub fn is_random(&self) -> bool {
        self.addr_type & 0x01 != 0
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_addr(&self.val))
    }
}

/// 按惯例从最高字节开始打印 `XX:XX:XX:XX:XX:XX`
pub fn format_addr(val: &[u8; 6]) -> String {
    val.iter()
        .rev()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[derive(Debug, Default, Clone)]
pub struct AdvPayload {
    data: AdvData,
}

impl AdvPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        MAX_ADV_LEN - self.data.len()
    }

    pub fn push(&mut self, ad_type: u8, value: &[u8]) -> anyhow::Result<&mut Self> {
        if value.len() + 2 > self.remaining() {
            bail!(
                "AD type 0x{ad_type:02x} needs {} bytes, only {} left",
                value.len() + 2,
                self.remaining()
            );
        }
        // 长度和类型各一个字节，容量已经检查过
        let _ = self.data.push((value.len() + 1) as u8);
        let _ = self.data.push(ad_type);
        let _ = self.data.extend_from_slice(value);
        Ok(self)
    }

    pub fn flags(&mut self, flags: u8) -> anyhow::Result<&mut Self> {
        self.push(AD_FLAGS, &[flags])
    }

    pub fn tx_power(&mut self, dbm: i8) -> anyhow::Result<&mut Self> {
        self.push(AD_TX_POWER, &dbm.to_le_bytes())
    }

    pub fn appearance(&mut self, appearance: u16) -> anyhow::Result<&mut Self> {
        self.push(AD_APPEARANCE, &appearance.to_le_bytes())
    }

    pub fn le_role_peripheral(&mut self) -> anyhow::Result<&mut Self> {
        self.push(AD_LE_ROLE, &[LE_ROLE_PERIPHERAL_ONLY])
    }

    pub fn service_uuids16(&mut self, uuids: &[u16]) -> anyhow::Result<&mut Self> {
        if uuids.is_empty() {
            return Ok(self);
        }
        let value = uuids.iter().flat_map(|uuid| uuid.to_le_bytes()).collect::<Vec<_>>();
        self.push(AD_COMPLETE_UUID16, &value)
    }

    pub fn le_address(&mut self, addr: &BdAddr) -> anyhow::Result<&mut Self> {
        let mut value = [0u8; 7];
        value[..6].copy_from_slice(&addr.val);
        value[6] = addr.is_random() as u8;
        self.push(AD_LE_ADDRESS, &value)
    }

    /// 放得下就写完整名称，否则截断成缩写名称
    pub fn name(&mut self, name: &str) -> anyhow::Result<&mut Self> {
        let room = self.remaining().saturating_sub(2);
        if name.len() <= room {
            return self.push(AD_COMPLETE_NAME, name.as_bytes());
        }
        let short = truncate_utf8(name, room);
        if short.is_empty() {
            bail!("no room left for device name {name:?}");
        }
        self.push(AD_SHORT_NAME, short.as_bytes())
    }

    pub fn into_data(self) -> AdvData {
        self.data
    }
}

fn truncate_utf8(text: &str, max: usize) -> &str {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// 广播包: 标志、发射功率、外观、LE 角色、服务 UUID，最后是名称
pub fn advertisement(
    appearance: u16,
    tx_power: i8,
    services: &[u16],
    name: &str
) -> anyhow::Result<AdvData> {
    let mut payload = AdvPayload::new();
    payload
        .flags(FLAG_LE_GENERAL_DISC | FLAG_BREDR_UNSUPPORTED)?
        .tx_power(tx_power)?
        .appearance(appearance)?
        .le_role_peripheral()?
        .service_uuids16(services)?
        .name(name)?;
    Ok(payload.into_data())
}

/// 扫描响应: 设备地址，部分扫描器只看这里的名称
pub fn scan_response(addr: &BdAddr, name: &str) -> anyhow::Result<AdvData> {
    let mut payload = AdvPayload::new();
    payload.le_address(addr)?.name(name)?;
    Ok(payload.into_data())
}
