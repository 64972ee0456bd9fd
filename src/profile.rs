use serde::{Deserialize, Deserializer};

use crate::catalog::Catalog;
use crate::error::Error;

const ED300_PROFILE: &str = include_str!("../profiles/ed300.json");

/// Which Modbus read operation a register needs. Only holding registers
/// are writable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    Holding,
    Input,
}

/// One addressable value on the device, as declared in a profile document.
///
/// Addresses are not unique; the climate setpoint and a plain number entry
/// may sit on the same register.
#[derive(Clone, Debug, Deserialize)]
pub struct RegisterDef {
    pub key: String,
    name: Option<String>,
    #[serde(rename = "register_type", default = "RegisterDef::default_kind")]
    pub kind: RegisterKind,
    pub address: u16,
    #[serde(default, deserialize_with = "lenient_scale")]
    pub scale: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub options: Option<Vec<(String, u16)>>,
}

impl RegisterDef {
    fn default_kind() -> RegisterKind {
        RegisterKind::Holding
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    pub fn scale(&self) -> f64 {
        self.scale.unwrap_or(1.0)
    }

    /// Scaled value as read from the wire.
    pub fn scaled(&self, raw: u16) -> f64 {
        f64::from(raw) * self.scale()
    }

    /// Raw wire value for a displayed value; the inverse of [`scaled`],
    /// up to rounding.
    ///
    /// [`scaled`]: RegisterDef::scaled
    pub fn raw_for(&self, value: f64) -> u16 {
        (value / self.scale()).round() as u16
    }

    pub fn options(&self) -> &[(String, u16)] {
        self.options.as_deref().unwrap_or(&[])
    }

    pub fn is_enumerated(&self) -> bool {
        !self.options().is_empty()
    }

    pub fn option_code(&self, label: &str) -> Option<u16> {
        self.options()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, code)| *code)
    }

    pub fn option_label(&self, code: u16) -> Option<&str> {
        self.options()
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(label, _)| label.as_str())
    }
}

/// A scale that is not a usable number is treated as absent rather than
/// failing the whole profile load. Zero would make every read collapse to
/// zero, so it counts as unusable too.
fn lenient_scale<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|s| s.is_finite() && *s != 0.0))
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
}

/// The composite hot-water entry. It carries no key of its own in the
/// snapshot; the setpoint register usually aliases a number entry.
#[derive(Clone, Debug, Deserialize)]
pub struct ClimateProfile {
    #[serde(default = "ClimateProfile::default_key")]
    pub key: String,
    #[serde(default = "ClimateProfile::default_name")]
    pub name: String,
    pub setpoint_register: u16,
    #[serde(default = "ClimateProfile::default_current_temp_key")]
    pub current_temp_key: String,
    #[serde(default = "ClimateProfile::default_min_temp")]
    pub min_temp: f64,
    #[serde(default = "ClimateProfile::default_max_temp")]
    pub max_temp: f64,
    #[serde(default = "ClimateProfile::default_precision")]
    pub precision: f64,
}

impl ClimateProfile {
    fn default_key() -> String {
        "wh".to_string()
    }

    fn default_name() -> String {
        "Warmwasser".to_string()
    }

    fn default_current_temp_key() -> String {
        "ww_temp".to_string()
    }

    fn default_min_temp() -> f64 {
        5.0
    }

    fn default_max_temp() -> f64 {
        62.0
    }

    fn default_precision() -> f64 {
        1.0
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterGroups {
    #[serde(default)]
    pub sensors: Vec<RegisterDef>,
    #[serde(default)]
    pub numbers: Vec<RegisterDef>,
    #[serde(default)]
    pub selects: Vec<RegisterDef>,
    #[serde(default)]
    pub switches: Vec<RegisterDef>,
    #[serde(default)]
    pub climate: Option<ClimateProfile>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProfileDocument {
    pub device: DeviceInfo,
    pub registers: RegisterGroups,
}

/// Load and index the register profile for a device model.
pub fn load(model: &str) -> Result<Catalog, Error> {
    let raw = match model {
        "ED300" => ED300_PROFILE,
        _ => return Err(Error::ProfileNotFound(model.to_string())),
    };

    parse(model, raw)
}

pub fn parse(model: &str, raw: &str) -> Result<Catalog, Error> {
    let document: ProfileDocument =
        serde_json::from_str(raw).map_err(|err| Error::ProfileMalformed {
            model: model.to_string(),
            reason: err.to_string(),
        })?;

    Catalog::new(model, document)
}
