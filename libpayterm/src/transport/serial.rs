// libpayterm/src/transport/serial.rs

#![cfg(feature = "serial")]

use std::io::Read;
use std::time::Duration;

use crate::transport::traits::Transport;
use crate::types::{DataBits, FlowControl, LineSettings, Parity, StopBits};
use crate::{Error, Result};

/// Blocking RS-232 transport over the `serialport` crate.
///
/// The port is opened exclusively with the protocol's fixed line
/// parameters. An open or configure failure maps to
/// `Error::PortNotAvailable` and is never retried here - the discovery
/// layer decides whether to try another port.
pub struct SerialTransport {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
}

impl SerialTransport {
    /// Open `name` with the given line settings.
    pub fn open(name: &str, settings: &LineSettings) -> Result<Self> {
        let data_bits = match settings.data_bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        };
        let parity = match settings.parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
        };
        let stop_bits = match settings.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        };
        let flow = match settings.flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        };

        let port = serialport::new(name, settings.baud)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(flow)
            .timeout(Duration::from_millis(crate::utils::DEFAULT_READ_TIMEOUT_MS))
            .open()
            .map_err(|e| Error::PortNotAvailable(format!("{}: {}", name, e)))?;

        Ok(Self {
            port: Some(port),
            name: name.to_string(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.name
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        let name = self.name.clone();
        self.port
            .as_mut()
            .ok_or(Error::PortNotAvailable(format!("{}: port closed", name)))
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        use std::io::Write;
        let port = self.port_mut()?;
        port.write_all(data)?;
        Ok(())
    }

    fn read_timeout(&mut self, max_len: usize, timeout_ms: u64) -> Result<Vec<u8>> {
        let port = self.port_mut()?;
        port.set_timeout(Duration::from_millis(timeout_ms))
            .map_err(|e| Error::PortNotAvailable(e.to_string()))?;

        let mut buf = vec![0u8; max_len];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            // An expired read window is silence, not a failure.
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        let port = self.port_mut()?;
        port.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        self.port = None;
    }
}
