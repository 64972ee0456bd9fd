use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::Error;
use crate::profile::{ClimateProfile, DeviceInfo, ProfileDocument, RegisterDef, RegisterKind};

/// A loaded profile indexed by category and by address.
///
/// Built once per coordinator and read-only afterwards; changing the
/// profile means reloading the whole thing.
pub struct Catalog {
    device: DeviceInfo,
    sensors: Vec<Arc<RegisterDef>>,
    numbers: Vec<Arc<RegisterDef>>,
    selects: Vec<Arc<RegisterDef>>,
    switches: Vec<Arc<RegisterDef>>,
    climate: Option<ClimateProfile>,
    by_address: HashMap<u16, Vec<Arc<RegisterDef>>>,
}

impl Catalog {
    pub fn new(model: &str, document: ProfileDocument) -> Result<Self, Error> {
        let groups = document.registers;

        validate_group(model, &groups.sensors, false, false)?;
        validate_group(model, &groups.numbers, false, true)?;
        validate_group(model, &groups.selects, true, true)?;
        validate_group(model, &groups.switches, false, true)?;

        let sensors: Vec<_> = groups.sensors.into_iter().map(Arc::new).collect();
        let numbers: Vec<_> = groups.numbers.into_iter().map(Arc::new).collect();
        let selects: Vec<_> = groups.selects.into_iter().map(Arc::new).collect();
        let switches: Vec<_> = groups.switches.into_iter().map(Arc::new).collect();

        let mut keys = HashSet::new();
        let mut by_address: HashMap<u16, Vec<Arc<RegisterDef>>> = HashMap::new();
        for register in sensors
            .iter()
            .chain(&numbers)
            .chain(&selects)
            .chain(&switches)
        {
            if !keys.insert(register.key.as_str()) {
                return Err(malformed(
                    model,
                    format!("duplicate register key {:?}", register.key),
                ));
            }
            by_address
                .entry(register.address)
                .or_default()
                .push(register.clone());
        }

        Ok(Self {
            device: document.device,
            sensors,
            numbers,
            selects,
            switches,
            climate: groups.climate,
            by_address,
        })
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn sensors(&self) -> &[Arc<RegisterDef>] {
        &self.sensors
    }

    pub fn numbers(&self) -> &[Arc<RegisterDef>] {
        &self.numbers
    }

    pub fn selects(&self) -> &[Arc<RegisterDef>] {
        &self.selects
    }

    pub fn switches(&self) -> &[Arc<RegisterDef>] {
        &self.switches
    }

    pub fn climate(&self) -> Option<&ClimateProfile> {
        self.climate.as_ref()
    }

    /// Every register in the fixed poll order: sensors, numbers, selects,
    /// switches.
    pub fn poll_order(&self) -> impl Iterator<Item = &Arc<RegisterDef>> {
        self.sensors
            .iter()
            .chain(&self.numbers)
            .chain(&self.selects)
            .chain(&self.switches)
    }

    pub fn register_count(&self) -> usize {
        self.sensors.len() + self.numbers.len() + self.selects.len() + self.switches.len()
    }

    /// Every register sharing an address, for write-time reverse lookup.
    pub fn registers_at(&self, address: u16) -> &[Arc<RegisterDef>] {
        self.by_address.get(&address).map_or(&[], Vec::as_slice)
    }

    pub fn register(&self, key: &str) -> Option<&Arc<RegisterDef>> {
        self.poll_order().find(|register| register.key == key)
    }
}

fn malformed(model: &str, reason: String) -> Error {
    Error::ProfileMalformed {
        model: model.to_string(),
        reason,
    }
}

fn validate_group(
    model: &str,
    registers: &[RegisterDef],
    enumerated: bool,
    writable: bool,
) -> Result<(), Error> {
    for register in registers {
        if register.key.is_empty() {
            return Err(malformed(model, "register with empty key".to_string()));
        }

        if enumerated {
            let options = register.options();
            if options.is_empty() {
                return Err(malformed(
                    model,
                    format!("select {:?} has no options", register.key),
                ));
            }
            let mut codes = HashSet::new();
            for (label, code) in options {
                if !codes.insert(code) {
                    return Err(malformed(
                        model,
                        format!(
                            "select {:?} has duplicate option code {} ({:?})",
                            register.key, code, label
                        ),
                    ));
                }
            }
        } else if register.options.is_some() {
            // A register is either enumerated or numeric, never both.
            return Err(malformed(
                model,
                format!("register {:?} is not a select but carries options", register.key),
            ));
        }

        if writable && register.kind != RegisterKind::Holding {
            return Err(malformed(
                model,
                format!(
                    "writable register {:?} must be a holding register",
                    register.key
                ),
            ));
        }
    }

    Ok(())
}
