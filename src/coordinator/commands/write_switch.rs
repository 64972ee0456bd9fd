use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::prelude::*;
use crate::profile::RegisterDef;

/// Write a boolean register: 1 for on, 0 for off, no scaling.
pub struct WriteSwitch {
    coordinator: Arc<Coordinator>,
    register: Arc<RegisterDef>,
    on: bool,
}

impl WriteSwitch {
    pub fn new(coordinator: Arc<Coordinator>, register: Arc<RegisterDef>, on: bool) -> Self {
        Self {
            coordinator,
            register,
            on,
        }
    }

    pub async fn run(&self) -> Result<(), crate::error::Error> {
        let raw = u16::from(self.on);

        info!(
            "turning {} {}",
            self.register.key,
            if self.on { "on" } else { "off" }
        );

        self.coordinator
            .write_register(self.register.address, raw)
            .await
    }
}
