use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::prelude::*;
use crate::profile::ClimateProfile;

/// Write the hot-water setpoint of the composite climate entry. The
/// device reads a setpoint below 5 degrees as "off", so an off request
/// writes 0.
pub struct WriteSetpoint {
    coordinator: Arc<Coordinator>,
    climate: ClimateProfile,
    temperature: f64,
}

impl WriteSetpoint {
    pub fn new(coordinator: Arc<Coordinator>, climate: ClimateProfile, temperature: f64) -> Self {
        Self {
            coordinator,
            climate,
            temperature,
        }
    }

    pub fn off(coordinator: Arc<Coordinator>, climate: ClimateProfile) -> Self {
        Self::new(coordinator, climate, 0.0)
    }

    pub async fn run(&self) -> Result<(), crate::error::Error> {
        let raw = self.temperature.round() as u16;

        info!("setting {} setpoint to {}", self.climate.key, raw);

        self.coordinator
            .write_register(self.climate.setpoint_register, raw)
            .await
    }
}
