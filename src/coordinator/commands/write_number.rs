use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::prelude::*;
use crate::profile::RegisterDef;

/// Write a numeric register from its displayed value: the raw wire value
/// is `round(value / scale)`. Bounds from the profile are advisory
/// metadata for the host layer, not enforced here.
pub struct WriteNumber {
    coordinator: Arc<Coordinator>,
    register: Arc<RegisterDef>,
    value: f64,
}

impl WriteNumber {
    pub fn new(coordinator: Arc<Coordinator>, register: Arc<RegisterDef>, value: f64) -> Self {
        Self {
            coordinator,
            register,
            value,
        }
    }

    pub async fn run(&self) -> Result<(), crate::error::Error> {
        let raw = self.register.raw_for(self.value);

        info!(
            "setting {} to {} (raw {})",
            self.register.key, self.value, raw
        );

        self.coordinator
            .write_register(self.register.address, raw)
            .await
    }
}
