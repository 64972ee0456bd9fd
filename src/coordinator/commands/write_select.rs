use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::prelude::*;
use crate::profile::RegisterDef;

/// Write an enumerated register from its option label.
pub struct WriteSelect {
    coordinator: Arc<Coordinator>,
    register: Arc<RegisterDef>,
    label: String,
}

impl WriteSelect {
    pub fn new(coordinator: Arc<Coordinator>, register: Arc<RegisterDef>, label: String) -> Self {
        Self {
            coordinator,
            register,
            label,
        }
    }

    pub async fn run(&self) -> Result<(), crate::error::Error> {
        // Resolve before touching the transport; an unknown label must
        // not cost a round-trip.
        let raw = self.register.option_code(&self.label).ok_or_else(|| {
            crate::error::Error::InvalidOption {
                key: self.register.key.clone(),
                label: self.label.clone(),
            }
        })?;

        info!(
            "setting {} to {:?} (raw {})",
            self.register.key, self.label, raw
        );

        self.coordinator
            .write_register(self.register.address, raw)
            .await
    }
}
