#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ed300_bridge::prelude::*;
use ed300_bridge::profile;
use ed300_bridge::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Connect,
    ReadHolding(u16),
    ReadInput(u16),
    WriteSingle(u16, u16),
    Close,
}

#[derive(Debug, Default)]
pub struct DeviceState {
    pub holding: HashMap<u16, u16>,
    pub input: HashMap<u16, u16>,
    pub fail_reads: HashSet<u16>,
    pub fail_connect: bool,
    pub reject_writes: bool,
    pub apply_writes: bool,
    pub read_delay_ms: u64,
    pub calls: Vec<Call>,
}

/// Shared handle onto a fake device, so tests can keep inspecting and
/// steering it after handing its transport to a coordinator.
#[derive(Debug, Clone, Default)]
pub struct FakeDevice(Arc<Mutex<DeviceState>>);

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(FakeTransport {
            device: self.clone(),
            live: false,
        })
    }

    pub fn set_holding(&self, address: u16, value: u16) {
        self.0.lock().unwrap().holding.insert(address, value);
    }

    pub fn set_input(&self, address: u16, value: u16) {
        self.0.lock().unwrap().input.insert(address, value);
    }

    pub fn fail_read(&self, address: u16) {
        self.0.lock().unwrap().fail_reads.insert(address);
    }

    pub fn heal_read(&self, address: u16) {
        self.0.lock().unwrap().fail_reads.remove(&address);
    }

    pub fn fail_connect(&self, fail: bool) {
        self.0.lock().unwrap().fail_connect = fail;
    }

    pub fn reject_writes(&self, reject: bool) {
        self.0.lock().unwrap().reject_writes = reject;
    }

    /// When set, successful writes land in the holding map, like a device
    /// that accepts the value as-is.
    pub fn apply_writes(&self, apply: bool) {
        self.0.lock().unwrap().apply_writes = apply;
    }

    pub fn set_read_delay(&self, millis: u64) {
        self.0.lock().unwrap().read_delay_ms = millis;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::WriteSingle(address, value) => Some((address, value)),
                _ => None,
            })
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.calls()
            .into_iter()
            .filter(|call| *call == Call::Connect)
            .count()
    }
}

pub struct FakeTransport {
    device: FakeDevice,
    live: bool,
}

impl FakeTransport {
    async fn read(&mut self, address: u16, holding: bool) -> Result<u16, TransportError> {
        let delay = {
            let mut state = self.device.0.lock().unwrap();
            state.calls.push(if holding {
                Call::ReadHolding(address)
            } else {
                Call::ReadInput(address)
            });
            state.read_delay_ms
        };

        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let state = self.device.0.lock().unwrap();
        if state.fail_reads.contains(&address) {
            return Err(TransportError::Timeout(6));
        }
        let table = if holding { &state.holding } else { &state.input };
        table
            .get(&address)
            .copied()
            .ok_or(TransportError::EmptyResponse(address))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.device.0.lock().unwrap();
        state.calls.push(Call::Connect);
        if state.fail_connect {
            return Err(TransportError::Timeout(5));
        }
        drop(state);
        self.live = true;
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live
    }

    async fn read_holding(&mut self, address: u16) -> Result<u16, TransportError> {
        self.read(address, true).await
    }

    async fn read_input(&mut self, address: u16) -> Result<u16, TransportError> {
        self.read(address, false).await
    }

    async fn write_single(&mut self, address: u16, value: u16) -> Result<(), TransportError> {
        let mut state = self.device.0.lock().unwrap();
        state.calls.push(Call::WriteSingle(address, value));
        if state.reject_writes {
            return Err(TransportError::Exception(
                tokio_modbus::Exception::IllegalDataValue,
            ));
        }
        if state.apply_writes {
            state.holding.insert(address, value);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.device.0.lock().unwrap().calls.push(Call::Close);
        self.live = false;
        Ok(())
    }
}

pub struct Factory;

impl Factory {
    pub fn device() -> config::Device {
        config::Device {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 502,
            unit_id: 3,
            scan_interval: 30,
            model: "ED300".to_string(),
            empty_poll_warning: Some(false),
        }
    }

    pub fn catalog() -> Arc<Catalog> {
        Arc::new(profile::load("ED300").unwrap())
    }

    /// Two-register catalog: one input sensor, one holding number.
    pub fn mini_catalog() -> Arc<Catalog> {
        let raw = r#"{
            "device": { "manufacturer": "EcoDesign", "model": "ED 300 WT" },
            "registers": {
                "sensors": [
                    { "key": "ww_temp", "register_type": "input", "address": 40 }
                ],
                "numbers": [
                    { "key": "setpoint", "register_type": "holding", "address": 41,
                      "scale": 1, "min": 5, "max": 62, "step": 1 }
                ]
            }
        }"#;
        Arc::new(profile::parse("ED300", raw).unwrap())
    }

    pub fn coordinator(device: &FakeDevice) -> (Arc<Coordinator>, Channels) {
        Self::coordinator_with(Self::catalog(), device)
    }

    pub fn coordinator_with(
        catalog: Arc<Catalog>,
        device: &FakeDevice,
    ) -> (Arc<Coordinator>, Channels) {
        let channels = Channels::new();
        let coordinator = Arc::new(Coordinator::new(
            Self::device(),
            catalog,
            device.transport(),
            channels.clone(),
        ));
        (coordinator, channels)
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
