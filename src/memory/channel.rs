// Channel name table segment: 250 entries plus two GMRS special slots

use crate::codec::{Block, BytesField, CodecError, Result, StringField};

/// One 11-byte channel entry: a 6-character name and five flag bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEntry {
    pub name: String,
    // 0x00 for built-in channels, 0xFF for custom ones; not interpreted
    pub unknown: Vec<u8>,
}

impl ChannelEntry {
    const NAME: StringField = StringField::new(0x00, 6);
    const UNKNOWN: BytesField = BytesField::new(0x06, 5);

    /// Wire image used to fabricate array slots with no populated entry.
    pub const SLOT_FILL: [u8; 11] = [0xFF; 11];
}

impl Default for ChannelEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            unknown: vec![0x00; Self::UNKNOWN.length],
        }
    }
}

impl Block for ChannelEntry {
    const SIZE: usize = 0xB;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            name: Self::NAME.decode(data)?,
            unknown: Self::UNKNOWN.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        let mut data = vec![Self::FILL; Self::SIZE];
        Self::NAME.encode(&mut data, &self.name)?;
        Self::UNKNOWN.encode(&mut data, &self.unknown)?;
        Ok(data)
    }
}

/// The channel segment: the full name table and the GMRS special slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMemory {
    pub entries: Vec<ChannelEntry>,
    pub special_channels: Vec<ChannelEntry>,
    pub trailing_space: Vec<u8>,
}

impl ChannelMemory {
    const ENTRIES: usize = 0x000;
    const ENTRY_COUNT: usize = 250;
    const SPECIAL_CHANNELS: usize = 0xABE;
    const SPECIAL_COUNT: usize = 2;
    const TRAILING_SPACE: BytesField = BytesField::new(0xAD3, 0x4ED);

    fn import_array(data: &[u8], base: usize, count: usize) -> Result<Vec<ChannelEntry>> {
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let offset = base + i * ChannelEntry::SIZE;
            entries.push(ChannelEntry::import_data(&data[offset..])?);
        }
        Ok(entries)
    }

    fn export_array(
        data: &mut [u8],
        base: usize,
        count: usize,
        entries: &[ChannelEntry],
    ) -> Result<()> {
        if entries.len() > count {
            return Err(CodecError::TooManyElements {
                len: entries.len(),
                max: count,
            });
        }

        for i in 0..count {
            let offset = base + i * ChannelEntry::SIZE;
            let span = &mut data[offset..offset + ChannelEntry::SIZE];
            match entries.get(i) {
                Some(entry) => span.copy_from_slice(&entry.export_data()?),
                None => span.copy_from_slice(&ChannelEntry::SLOT_FILL),
            }
        }
        Ok(())
    }
}

impl Default for ChannelMemory {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            special_channels: Vec::new(),
            trailing_space: vec![0x00; Self::TRAILING_SPACE.length],
        }
    }
}

impl Block for ChannelMemory {
    const SIZE: usize = 0xFC0;
    const DUMP_LEN: usize = 0xAD3;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            entries: Self::import_array(data, Self::ENTRIES, Self::ENTRY_COUNT)?,
            special_channels: Self::import_array(
                data,
                Self::SPECIAL_CHANNELS,
                Self::SPECIAL_COUNT,
            )?,
            trailing_space: Self::TRAILING_SPACE.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        let mut data = vec![Self::FILL; Self::SIZE];
        Self::export_array(&mut data, Self::ENTRIES, Self::ENTRY_COUNT, &self.entries)?;
        Self::export_array(
            &mut data,
            Self::SPECIAL_CHANNELS,
            Self::SPECIAL_COUNT,
            &self.special_channels,
        )?;
        Self::TRAILING_SPACE.encode(&mut data, &self.trailing_space)?;
        Ok(data)
    }
}
