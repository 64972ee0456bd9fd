use std::time::Duration;

use async_trait::async_trait;
use tokio_modbus::client::{tcp::connect_slave, Client, Context, Reader, Writer};
use tokio_modbus::slave::Slave;

use crate::error::TransportError;
use crate::prelude::*;

pub const CONNECT_TIMEOUT_SECS: u64 = 5;
pub const CALL_TIMEOUT_SECS: u64 = 6;

/// The wire-protocol session as the coordinator sees it: single-register
/// reads and writes over one stateful connection. Implementations report
/// a connectivity fault distinctly from a device exception response.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self) -> Result<(), TransportError>;

    fn is_live(&self) -> bool;

    async fn read_holding(&mut self, address: u16) -> Result<u16, TransportError>;

    async fn read_input(&mut self, address: u16) -> Result<u16, TransportError>;

    async fn write_single(&mut self, address: u16, value: u16) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Modbus TCP session for one device. Every call is bounded by a timeout
/// so a wedged gateway degrades to a failed operation, never a stuck poll
/// loop.
pub struct ModbusTransport {
    host: String,
    port: u16,
    unit_id: u8,
    context: Option<Context>,
    live: bool,
}

impl ModbusTransport {
    pub fn new(host: &str, port: u16, unit_id: u8) -> Self {
        Self {
            host: host.to_string(),
            port,
            unit_id,
            context: None,
            live: false,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn session(&mut self) -> Result<&mut Context, TransportError> {
        self.context.as_mut().ok_or(TransportError::NotConnected)
    }

    fn fail(&mut self, err: TransportError) -> TransportError {
        if err.is_connectivity() {
            self.live = false;
        }
        err
    }

    fn unpack_read(
        &mut self,
        address: u16,
        response: Result<tokio_modbus::Result<Vec<u16>>, tokio::time::error::Elapsed>,
    ) -> Result<u16, TransportError> {
        match response {
            Ok(Ok(Ok(words))) => words
                .first()
                .copied()
                .ok_or(TransportError::EmptyResponse(address)),
            Ok(Ok(Err(exception))) => Err(TransportError::Exception(exception)),
            Ok(Err(err)) => Err(self.fail(TransportError::Io(err))),
            Err(_) => Err(self.fail(TransportError::Timeout(CALL_TIMEOUT_SECS))),
        }
    }
}

#[async_trait]
impl Transport for ModbusTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        // Drop any stale session before reopening.
        if let Some(mut old) = self.context.take() {
            let _ = old.disconnect().await;
        }
        self.live = false;

        let addr = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|source| TransportError::Connect {
                addr: self.endpoint(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::Connect {
                addr: self.endpoint(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "hostname resolved to no addresses",
                ),
            })?;

        let connected = tokio::time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            connect_slave(addr, Slave(self.unit_id)),
        )
        .await;

        match connected {
            Ok(Ok(context)) => {
                debug!("connected to {} (unit {})", self.endpoint(), self.unit_id);
                self.context = Some(context);
                self.live = true;
                Ok(())
            }
            Ok(Err(source)) => Err(TransportError::Connect {
                addr: self.endpoint(),
                source,
            }),
            Err(_) => Err(TransportError::Timeout(CONNECT_TIMEOUT_SECS)),
        }
    }

    fn is_live(&self) -> bool {
        self.live && self.context.is_some()
    }

    async fn read_holding(&mut self, address: u16) -> Result<u16, TransportError> {
        let context = self.session()?;
        let response = tokio::time::timeout(
            Duration::from_secs(CALL_TIMEOUT_SECS),
            context.read_holding_registers(address, 1),
        )
        .await;
        self.unpack_read(address, response)
    }

    async fn read_input(&mut self, address: u16) -> Result<u16, TransportError> {
        let context = self.session()?;
        let response = tokio::time::timeout(
            Duration::from_secs(CALL_TIMEOUT_SECS),
            context.read_input_registers(address, 1),
        )
        .await;
        self.unpack_read(address, response)
    }

    async fn write_single(&mut self, address: u16, value: u16) -> Result<(), TransportError> {
        let context = self.session()?;
        let response = tokio::time::timeout(
            Duration::from_secs(CALL_TIMEOUT_SECS),
            context.write_single_register(address, value),
        )
        .await;

        match response {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(exception))) => Err(TransportError::Exception(exception)),
            Ok(Err(err)) => Err(self.fail(TransportError::Io(err))),
            Err(_) => Err(self.fail(TransportError::Timeout(CALL_TIMEOUT_SECS))),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.live = false;
        if let Some(mut context) = self.context.take() {
            if let Err(err) = context.disconnect().await {
                debug!("{}: disconnect reported: {}", self.endpoint(), err);
            }
        }
        Ok(())
    }
}
