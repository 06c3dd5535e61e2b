use anyhow::anyhow;
use super::BLEApp;

#[derive(Clone, Default)]
pub struct BLEAppBuilder<State: Sync + Send + Clone = ()> {
    pub device_name: Option<String>,
    pub appearance: Option<u16>,
    pub tx_power: Option<i8>,
    pub bonding: Option<bool>,
    pub state: Option<State>,
}

impl<State: Sync + Send + Clone> BLEAppBuilder<State> {
    pub fn new() -> Self {
        Self {
            device_name: None,
            appearance: None,
            tx_power: None,
            bonding: None,
            state: None,
        }
    }

    pub fn device_name(&mut self, device_name: &str) -> &mut Self {
        self.device_name = Some(device_name.to_string());
        self
    }

    /// GAP 外观值，见 Bluetooth Assigned Numbers
    pub fn appearance(&mut self, appearance: u16) -> &mut Self {
        self.appearance = Some(appearance);
        self
    }

    pub fn tx_power(&mut self, tx_power: i8) -> &mut Self {
        self.tx_power = Some(tx_power);
        self
    }

    pub fn bonding(&mut self, bonding: bool) -> &mut Self {
        self.bonding = Some(bonding);
        self
    }

    pub fn state(&mut self, state: State) -> &mut Self {
        self.state = Some(state);
        self
    }

    pub fn build(&self) -> anyhow::Result<BLEApp<State>> {
        let device_name = self.device_name.clone().ok_or(anyhow!("device_name is required"))?;
        let state = self.state.clone().ok_or(anyhow!("state is required"))?;
        Ok(
            BLEApp::new(
                device_name,
                self.appearance.unwrap_or(0),
                self.tx_power.unwrap_or(0),
                self.bonding.unwrap_or(false),
                state
            )
        )
    }
}
