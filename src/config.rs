use serde::Deserialize;

use crate::prelude::*;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub devices: Vec<Device>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

// Device {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub host: String,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    #[serde(default = "Config::default_unit_id")]
    pub unit_id: u8,
    #[serde(default = "Config::default_scan_interval")]
    pub scan_interval: u64,
    #[serde(default = "Config::default_model")]
    pub model: String,

    pub empty_poll_warning: Option<bool>,
}

impl Device {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn scan_interval(&self) -> u64 {
        self.scan_interval
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn empty_poll_warning(&self) -> bool {
        self.empty_poll_warning.unwrap_or(true)
    }

    pub fn identifier(&self) -> String {
        format!("{}:{}", self.host, self.unit_id)
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let contents = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;

        let config: Self = serde_yaml::from_str(&contents)
            .map_err(|err| anyhow!("error parsing {}: {}", file, err))?;

        config.validate()?;

        Ok(config)
    }

    // The setup flow that would normally range-check these values is out
    // of scope here, so the check lives at config load; everything past
    // this point trusts them.
    fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            bail!("config contains no devices");
        }

        for device in &self.devices {
            if !(5..=600).contains(&device.scan_interval) {
                bail!(
                    "device {}: scan_interval {}s outside the allowed 5-600s",
                    device.identifier(),
                    device.scan_interval
                );
            }
        }

        Ok(())
    }

    pub fn enabled_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|device| device.enabled())
    }

    pub fn loglevel(&self) -> String {
        self.loglevel.clone()
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_port() -> u16 {
        502
    }

    fn default_unit_id() -> u8 {
        3
    }

    fn default_scan_interval() -> u64 {
        30
    }

    fn default_model() -> String {
        "ED300".to_string()
    }
}
