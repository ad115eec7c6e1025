// Serial communication module for radio I/O
pub mod comm;
pub mod protocol;

#[cfg(test)]
pub mod mock;

pub use comm::{detect_programming_cable, list_ports, SerialConfig, SerialError, SerialPort, Transport};
pub use protocol::{HandshakeOptions, Protocol, ProtocolError, DEFAULT_CHUNK_SIZE};
