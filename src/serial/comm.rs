// Serial port abstraction for the radio's programming link
// Wraps the serialport crate with tokio-driven timeouts

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("Serial port error: {0}")]
    Port(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Port not open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, SerialError>;

/// USB vendor/product IDs of known programming cables.
/// CH340 USB to serial adapter: the Radioddity cable.
pub const CABLE_USB_IDS: &[(u16, u16)] = &[(0x1A86, 0x7523)];

/// Serial port configuration.
///
/// The radio requires exactly these link parameters; with anything else
/// the handshake never completes.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,

    /// Data bits
    pub data_bits: serialport::DataBits,

    /// Stop bits
    pub stop_bits: serialport::StopBits,

    /// Parity
    pub parity: serialport::Parity,

    /// Flow control (hardware RTS/CTS; no software flow control)
    pub flow_control: serialport::FlowControl,

    /// Per-read timeout
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 57600,
            data_bits: serialport::DataBits::Eight,
            stop_bits: serialport::StopBits::One,
            parity: serialport::Parity::None,
            flow_control: serialport::FlowControl::Hardware,
            timeout: Duration::from_secs(1),
        }
    }
}

impl SerialConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The byte-oriented link the protocol layer runs over.
///
/// Implemented by the real serial port and by the test replay transport.
pub trait Transport: Send {
    /// Write all bytes.
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush the output buffer.
    async fn flush(&mut self) -> Result<()>;

    /// Read up to `buf.len()` bytes, returning however many arrived
    /// before the configured timeout. Zero means no response at all.
    async fn read_upto(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Discard any unread input.
    fn clear_input(&mut self) -> Result<()>;

    /// Discard any unsent output.
    fn clear_output(&mut self) -> Result<()>;
}

/// Serial port wrapper configured for the radio link.
pub struct SerialPort {
    port: Option<Box<dyn serialport::SerialPort>>,
    config: SerialConfig,
    port_name: String,
}

impl SerialPort {
    /// Open a serial port with the given configuration, asserting both
    /// DTR and RTS as the radio expects.
    pub fn open(port_name: &str, config: SerialConfig) -> Result<Self> {
        let mut port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| SerialError::Port(e.to_string()))?;

        port.write_data_terminal_ready(true)
            .map_err(|e| SerialError::Port(e.to_string()))?;
        port.write_request_to_send(true)
            .map_err(|e| SerialError::Port(e.to_string()))?;

        Ok(Self {
            port: Some(port),
            config,
            port_name: port_name.to_string(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Close the port, flushing pending output first.
    pub fn close(mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            port.flush()?;
        }
        Ok(())
    }
}

impl Transport for SerialPort {
    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.write_all(buf).map_err(SerialError::Io)
    }

    async fn flush(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.flush().map_err(SerialError::Io)
    }

    async fn read_upto(&mut self, buf: &mut [u8]) -> Result<usize> {
        let deadline = Instant::now() + self.config.timeout;
        let mut total = 0;

        while total < buf.len() {
            let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
            match port.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(e) => return Err(SerialError::Io(e)),
            }
        }

        Ok(total)
    }

    fn clear_input(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.clear(serialport::ClearBuffer::Input)
            .map_err(|e| SerialError::Port(e.to_string()))
    }

    fn clear_output(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.clear(serialport::ClearBuffer::Output)
            .map_err(|e| SerialError::Port(e.to_string()))
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<String>> {
    serialport::available_ports()
        .map_err(|e| SerialError::Port(e.to_string()))?
        .into_iter()
        .map(|p| Ok(p.port_name))
        .collect()
}

/// Detect a programming cable by its USB vendor and product IDs.
///
/// Returns the first matching port. Useful with a single cable connected;
/// with several this may not pick the right one.
pub fn detect_programming_cable() -> Result<Option<String>> {
    let ports = serialport::available_ports().map_err(|e| SerialError::Port(e.to_string()))?;

    for info in ports {
        if let serialport::SerialPortType::UsbPort(usb) = info.port_type {
            if CABLE_USB_IDS.contains(&(usb.vid, usb.pid)) {
                return Ok(Some(info.port_name));
            }
        }
    }

    Ok(None)
}
