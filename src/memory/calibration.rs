// Opaque calibration segment
//
// Educated guess: overwriting this segment with garbage leaves the radio
// erratic and unresponsive, showing impossible frequencies and battery
// levels, so it is treated as per-unit calibration data. Nothing in here
// is interpreted; the bytes are preserved verbatim and the segment is
// never written back to the radio.

use crate::codec::{Block, BytesField, CodecError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationMemory {
    pub data: Vec<u8>,
    pub trailing_space: Vec<u8>,
}

impl CalibrationMemory {
    const DATA: BytesField = BytesField::new(0x000, 0x201);
    const TRAILING_SPACE: BytesField = BytesField::new(0x202, 0xDBE);
}

impl Default for CalibrationMemory {
    fn default() -> Self {
        Self {
            data: vec![0x00; Self::DATA.length],
            trailing_space: vec![0x00; Self::TRAILING_SPACE.length],
        }
    }
}

impl Block for CalibrationMemory {
    const SIZE: usize = 0xFC0;
    const DUMP_LEN: usize = 0x202;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            data: Self::DATA.decode(data)?,
            trailing_space: Self::TRAILING_SPACE.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        let mut data = vec![Self::FILL; Self::SIZE];
        Self::DATA.encode(&mut data, &self.data)?;
        Self::TRAILING_SPACE.encode(&mut data, &self.trailing_space)?;
        Ok(data)
    }
}
