// Segment orchestration: maps physical device segments to schema roles
// and drives the configuration image through the protocol

use crate::codec::{Block, CodecError};
use crate::memory::{
    CalibrationMemory, ChannelMemory, FrequencyMemory, GeneralMemory, PhoneMemory,
};
use crate::serial::{HandshakeOptions, Protocol, ProtocolError, Transport, DEFAULT_CHUNK_SIZE};
use std::fmt;
use thiserror::Error;

/// Number of physical memory segments.
pub const SEGMENT_COUNT: usize = 15;

/// Size of one physical memory segment.
pub const SEGMENT_SIZE: usize = 0x1000;

/// Exact size of a configuration image file.
pub const CONFIG_FILE_SIZE: usize = 0x7000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unexpected config file length: {0:#06x} bytes")]
    InvalidFileSize(usize),

    #[error("Memory segment not found: {0}")]
    SegmentNotFound(SegmentRole),

    #[error("Multiple memory segments found: {0}")]
    SegmentAmbiguous(SegmentRole),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Classification of a segment's trailing marker byte.
///
/// The `Observed` markers appear on real radios but are never read or
/// written by the vendor CPS; whatever they hold is left untouched.
/// Known observed values: 0x17, 0x18, 0x19, 0x25, 0x26 (repeating test
/// patterns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// Filled with 0x00, free for assignment.
    Available,
    Calibration,
    General,
    Phone,
    Frequency,
    Channel,
    /// Filled with 0xFF.
    Unavailable,
    Observed(u8),
}

impl SegmentState {
    pub fn from_marker(marker: u8) -> Self {
        match marker {
            0x00 => SegmentState::Available,
            0x02 => SegmentState::Calibration,
            0x04 => SegmentState::General,
            0x06 => SegmentState::Phone,
            0x16 => SegmentState::Frequency,
            0x24 => SegmentState::Channel,
            0xFF => SegmentState::Unavailable,
            other => SegmentState::Observed(other),
        }
    }

    pub fn marker(self) -> u8 {
        match self {
            SegmentState::Available => 0x00,
            SegmentState::Calibration => 0x02,
            SegmentState::General => 0x04,
            SegmentState::Phone => 0x06,
            SegmentState::Frequency => 0x16,
            SegmentState::Channel => 0x24,
            SegmentState::Unavailable => 0xFF,
            SegmentState::Observed(other) => other,
        }
    }
}

/// The five CPS-managed segment roles.
///
/// Each role must be backed by exactly one physical segment at any time
/// and owns a fixed region of the configuration image file, decoupling
/// the on-disk layout from the device's runtime segment assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    Calibration,
    Frequency,
    Channel,
    General,
    Phone,
}

impl SegmentRole {
    pub const ALL: [SegmentRole; 5] = [
        SegmentRole::Calibration,
        SegmentRole::Frequency,
        SegmentRole::Channel,
        SegmentRole::General,
        SegmentRole::Phone,
    ];

    pub fn state(self) -> SegmentState {
        match self {
            SegmentRole::Calibration => SegmentState::Calibration,
            SegmentRole::Frequency => SegmentState::Frequency,
            SegmentRole::Channel => SegmentState::Channel,
            SegmentRole::General => SegmentState::General,
            SegmentRole::Phone => SegmentState::Phone,
        }
    }

    /// Fixed offset of this role's region in the configuration image.
    pub fn file_offset(self) -> usize {
        match self {
            SegmentRole::Calibration => 0x0000,
            SegmentRole::Frequency => 0x1000,
            SegmentRole::Channel => 0x2000,
            SegmentRole::General => 0x3000,
            SegmentRole::Phone => 0x4000,
        }
    }
}

impl fmt::Display for SegmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentRole::Calibration => "calibration",
            SegmentRole::Frequency => "frequency",
            SegmentRole::Channel => "channel",
            SegmentRole::General => "general",
            SegmentRole::Phone => "phone",
        };
        write!(f, "{}", name)
    }
}

/// Base device address of segment `index` (0x1000 through 0xF000).
pub fn segment_base_address(index: usize) -> u16 {
    ((index + 1) * SEGMENT_SIZE) as u16
}

/// Device address of the marker byte: the last byte of the segment.
pub fn segment_marker_address(index: usize) -> u16 {
    segment_base_address(index) + 0x0FFF
}

/// The complete radio configuration across all five schema roles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadioConfig {
    pub calibration: CalibrationMemory,
    pub frequency: FrequencyMemory,
    pub channel: ChannelMemory,
    pub general: GeneralMemory,
    pub phone: PhoneMemory,
}

impl RadioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration image, rejecting any file that is not
    /// exactly [`CONFIG_FILE_SIZE`] bytes before decoding anything.
    pub fn load_image(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != CONFIG_FILE_SIZE {
            return Err(ConfigError::InvalidFileSize(data.len()));
        }

        self.calibration =
            CalibrationMemory::import_data(&data[SegmentRole::Calibration.file_offset()..])?;
        self.frequency =
            FrequencyMemory::import_data(&data[SegmentRole::Frequency.file_offset()..])?;
        self.channel = ChannelMemory::import_data(&data[SegmentRole::Channel.file_offset()..])?;
        self.general = GeneralMemory::import_data(&data[SegmentRole::General.file_offset()..])?;
        self.phone = PhoneMemory::import_data(&data[SegmentRole::Phone.file_offset()..])?;
        Ok(())
    }

    /// Serialize the configuration image.
    pub fn save_image(&self) -> Result<Vec<u8>> {
        let mut data = vec![0x00; CONFIG_FILE_SIZE];

        for (role, exported) in [
            (SegmentRole::Calibration, self.calibration.export_data()?),
            (SegmentRole::Frequency, self.frequency.export_data()?),
            (SegmentRole::Channel, self.channel.export_data()?),
            (SegmentRole::General, self.general.export_data()?),
            (SegmentRole::Phone, self.phone.export_data()?),
        ] {
            let offset = role.file_offset();
            data[offset..offset + exported.len()].copy_from_slice(&exported);
        }

        Ok(data)
    }

    /// Read the marker byte of every physical segment.
    pub async fn detect_segments<T: Transport>(
        protocol: &mut Protocol<T>,
    ) -> Result<[SegmentState; SEGMENT_COUNT]> {
        let mut states = [SegmentState::Available; SEGMENT_COUNT];
        for (index, state) in states.iter_mut().enumerate() {
            let raw = protocol
                .read_memory(segment_marker_address(index), 0x01)
                .await?;
            *state = SegmentState::from_marker(raw[0]);
        }

        tracing::debug!("Segment states: {:?}", states);
        Ok(states)
    }

    /// Resolve the one segment backing `role`.
    ///
    /// Zero or multiple matches indicate a corrupted configuration and
    /// are never silently resolved by taking the first hit.
    pub fn locate_segment(
        states: &[SegmentState; SEGMENT_COUNT],
        role: SegmentRole,
    ) -> Result<usize> {
        let mut matches = states
            .iter()
            .enumerate()
            .filter(|(_, &state)| state == role.state())
            .map(|(index, _)| index);

        match (matches.next(), matches.next()) {
            (Some(index), None) => Ok(index),
            (None, _) => Err(ConfigError::SegmentNotFound(role)),
            (Some(_), Some(_)) => Err(ConfigError::SegmentAmbiguous(role)),
        }
    }

    async fn read_segment<T: Transport, B: Block>(
        protocol: &mut Protocol<T>,
        states: &[SegmentState; SEGMENT_COUNT],
        role: SegmentRole,
    ) -> Result<B> {
        let index = Self::locate_segment(states, role)?;
        let base = segment_base_address(index);

        tracing::info!(
            "Reading {} memory from segment {:#x} @ {:#06x}",
            role,
            index,
            base
        );

        let data = protocol
            .read_memory_range(base, B::SIZE, DEFAULT_CHUNK_SIZE)
            .await?;
        Ok(B::import_data(&data)?)
    }

    async fn write_segment<T: Transport, B: Block>(
        protocol: &mut Protocol<T>,
        states: &[SegmentState; SEGMENT_COUNT],
        role: SegmentRole,
        block: &B,
    ) -> Result<()> {
        let index = Self::locate_segment(states, role)?;
        let base = segment_base_address(index);

        tracing::info!(
            "Writing {} memory to segment {:#x} @ {:#06x}",
            role,
            index,
            base
        );

        protocol
            .write_memory_range(base, &block.export_data()?, DEFAULT_CHUNK_SIZE)
            .await?;
        Ok(())
    }

    /// Read the full configuration from the radio.
    pub async fn read_radio<T: Transport>(&mut self, protocol: &mut Protocol<T>) -> Result<()> {
        if !protocol.in_programming_mode() {
            tracing::info!("Entering programming mode");
            protocol
                .enter_programming_mode(&HandshakeOptions::default())
                .await?;
        }

        tracing::info!("Detecting memory segments");
        let states = Self::detect_segments(protocol).await?;

        self.calibration =
            Self::read_segment(protocol, &states, SegmentRole::Calibration).await?;
        self.frequency = Self::read_segment(protocol, &states, SegmentRole::Frequency).await?;
        self.channel = Self::read_segment(protocol, &states, SegmentRole::Channel).await?;
        self.general = Self::read_segment(protocol, &states, SegmentRole::General).await?;
        self.phone = Self::read_segment(protocol, &states, SegmentRole::Phone).await?;
        Ok(())
    }

    /// Write the configuration to the radio.
    ///
    /// The calibration segment is never written: its structure is not
    /// understood and overwriting it has bricked a radio before. The
    /// skip stays until that segment is fully characterized.
    pub async fn write_radio<T: Transport>(&self, protocol: &mut Protocol<T>) -> Result<()> {
        if !protocol.in_programming_mode() {
            tracing::info!("Entering programming mode");
            protocol
                .enter_programming_mode(&HandshakeOptions::default())
                .await?;
        }

        tracing::info!("Detecting memory segments");
        let states = Self::detect_segments(protocol).await?;

        let skipped = Self::locate_segment(&states, SegmentRole::Calibration)?;
        tracing::info!(
            "Skipping calibration memory at segment {:#x} @ {:#06x}",
            skipped,
            segment_base_address(skipped)
        );

        Self::write_segment(protocol, &states, SegmentRole::Frequency, &self.frequency).await?;
        Self::write_segment(protocol, &states, SegmentRole::Channel, &self.channel).await?;
        Self::write_segment(protocol, &states, SegmentRole::General, &self.general).await?;
        Self::write_segment(protocol, &states, SegmentRole::Phone, &self.phone).await?;
        Ok(())
    }

    /// Render every schema's meaningful prefix for operators.
    pub fn hexdump(&self) -> Result<String> {
        let mut output = String::new();

        for (name, dump) in [
            ("Calibration", self.calibration.hexdump()?),
            ("Frequency", self.frequency.hexdump()?),
            ("Channel", self.channel.hexdump()?),
            ("General", self.general.hexdump()?),
            ("Phone", self.phone.hexdump()?),
        ] {
            output.push_str(&format!("\n{} Memory:\n", name));
            output.push_str(&"-".repeat(86));
            output.push('\n');
            output.push_str(&dump);
            output.push_str(&"-".repeat(86));
            output.push('\n');
        }

        Ok(output)
    }
}
