// GM30-RS: Radioddity GM-30 radio programming tool
// Copyright 2026 - Licensed under GPLv3

pub mod codec;
pub mod config;
pub mod memory;
pub mod serial;
pub mod settings;

// Re-export commonly used types
pub use codec::{Block, CodecError, Frequency};
pub use config::{
    ConfigError, RadioConfig, SegmentRole, SegmentState, CONFIG_FILE_SIZE, SEGMENT_COUNT,
    SEGMENT_SIZE,
};
pub use serial::{
    detect_programming_cable, HandshakeOptions, Protocol, ProtocolError, SerialConfig, SerialPort,
    Transport,
};
pub use settings::SETTINGS;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
