// Phone / DTMF settings segment

use crate::codec::{Block, BitsField, BytesField, CodecError, ConstField, Result, UInt8Field};
use crate::field_enum;

field_enum!(PttReleaseSend {
    Off = 0,
    On = 1,
});

field_enum!(PttPressSend {
    Off = 0,
    On = 1,
});

/// A 5-byte DTMF code slot.
///
/// Digits use the 0x01..0x0D byte alphabet and the slot is right-padded
/// with 0xFF; the digit mapping itself is not interpreted here.
#[derive(Debug, Clone, PartialEq)]
pub struct DtmfCode {
    pub value: Vec<u8>,
}

impl DtmfCode {
    const VALUE: BytesField = BytesField::new(0x0, 5);

    pub const SLOT_FILL: [u8; 5] = [0xFF; 5];
}

impl Default for DtmfCode {
    fn default() -> Self {
        Self {
            value: vec![0xFF; Self::VALUE.length],
        }
    }
}

impl Block for DtmfCode {
    const SIZE: usize = 0x5;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }
        Ok(Self {
            value: Self::VALUE.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        let mut data = vec![Self::FILL; Self::SIZE];
        Self::VALUE.encode(&mut data, &self.value)?;
        Ok(data)
    }
}

/// The phone segment: DTMF code slots, the radio's ID code, and key timing.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneMemory {
    pub dtmf_codes: Vec<DtmfCode>,
    pub id_code: DtmfCode,
    pub ptt_release_send: PttReleaseSend,
    pub ptt_press_send: PttPressSend,
    /// Raw DTMF transmit delay; see
    /// [`dtmf_delay_time_seconds`](Self::dtmf_delay_time_seconds).
    pub dtmf_delay_time: u8,
    /// Raw per-digit tone duration.
    pub dtmf_digit_duration: u8,
    /// Raw inter-digit pause duration.
    pub dtmf_interval_duration: u8,
    pub trailing_space: Vec<u8>,
}

impl PhoneMemory {
    const DTMF_CODES: usize = 0x00;
    const DTMF_CODE_COUNT: usize = 15;
    const ID_CODE: usize = 0x50;
    // seems unused
    const CONST_56: ConstField = ConstField::new(0x56, &[0x00; 9]);
    const PTT_RELEASE_SEND: BitsField = BitsField::new(0x60, 0b0000_0010);
    const PTT_PRESS_SEND: BitsField = BitsField::new(0x60, 0b0000_0001);
    const DTMF_DELAY_TIME: UInt8Field = UInt8Field::with_range(0x61, 0x00, 0x12);
    const DTMF_DIGIT_DURATION: UInt8Field = UInt8Field::with_range(0x62, 0x00, 0xC0);
    const DTMF_INTERVAL_DURATION: UInt8Field = UInt8Field::with_range(0x63, 0x00, 0xC0);
    const TRAILING_SPACE: BytesField = BytesField::new(0x70, 0xF50);

    /// DTMF transmit delay as seconds; the raw byte stays authoritative.
    pub fn dtmf_delay_time_seconds(&self) -> f32 {
        0.1 + self.dtmf_delay_time as f32 * 0.05
    }

    pub fn set_dtmf_delay_time_seconds(&mut self, seconds: f32) {
        self.dtmf_delay_time = ((seconds - 0.1) / 0.05).round() as u8;
    }

    pub fn dtmf_digit_duration_seconds(&self) -> f32 {
        0.08 + self.dtmf_digit_duration as f32 * 0.01
    }

    pub fn set_dtmf_digit_duration_seconds(&mut self, seconds: f32) {
        self.dtmf_digit_duration = ((seconds - 0.08) / 0.01).round() as u8;
    }

    pub fn dtmf_interval_duration_seconds(&self) -> f32 {
        0.08 + self.dtmf_interval_duration as f32 * 0.01
    }

    pub fn set_dtmf_interval_duration_seconds(&mut self, seconds: f32) {
        self.dtmf_interval_duration = ((seconds - 0.08) / 0.01).round() as u8;
    }
}

impl Default for PhoneMemory {
    fn default() -> Self {
        Self {
            dtmf_codes: Vec::new(),
            id_code: DtmfCode::default(),
            ptt_release_send: PttReleaseSend::Off,
            ptt_press_send: PttPressSend::Off,
            dtmf_delay_time: 0x00,
            dtmf_digit_duration: 0x00,
            dtmf_interval_duration: 0x00,
            trailing_space: vec![0x00; Self::TRAILING_SPACE.length],
        }
    }
}

impl Block for PhoneMemory {
    const SIZE: usize = 0xFC0;
    const DUMP_LEN: usize = 0x70;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Self::CONST_56.check(data)?;

        let mut dtmf_codes = Vec::with_capacity(Self::DTMF_CODE_COUNT);
        for i in 0..Self::DTMF_CODE_COUNT {
            let offset = Self::DTMF_CODES + i * DtmfCode::SIZE;
            dtmf_codes.push(DtmfCode::import_data(&data[offset..])?);
        }

        Ok(Self {
            dtmf_codes,
            id_code: DtmfCode::import_data(&data[Self::ID_CODE..])?,
            ptt_release_send: PttReleaseSend::from_raw(Self::PTT_RELEASE_SEND.decode(data)?)?,
            ptt_press_send: PttPressSend::from_raw(Self::PTT_PRESS_SEND.decode(data)?)?,
            dtmf_delay_time: Self::DTMF_DELAY_TIME.decode(data)?,
            dtmf_digit_duration: Self::DTMF_DIGIT_DURATION.decode(data)?,
            dtmf_interval_duration: Self::DTMF_INTERVAL_DURATION.decode(data)?,
            trailing_space: Self::TRAILING_SPACE.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        if self.dtmf_codes.len() > Self::DTMF_CODE_COUNT {
            return Err(CodecError::TooManyElements {
                len: self.dtmf_codes.len(),
                max: Self::DTMF_CODE_COUNT,
            });
        }

        let mut data = vec![Self::FILL; Self::SIZE];

        for i in 0..Self::DTMF_CODE_COUNT {
            let offset = Self::DTMF_CODES + i * DtmfCode::SIZE;
            let span = &mut data[offset..offset + DtmfCode::SIZE];
            match self.dtmf_codes.get(i) {
                Some(code) => span.copy_from_slice(&code.export_data()?),
                None => span.copy_from_slice(&DtmfCode::SLOT_FILL),
            }
        }

        data[Self::ID_CODE..Self::ID_CODE + DtmfCode::SIZE]
            .copy_from_slice(&self.id_code.export_data()?);
        Self::CONST_56.write(&mut data)?;
        Self::PTT_RELEASE_SEND.encode(&mut data, self.ptt_release_send.raw())?;
        Self::PTT_PRESS_SEND.encode(&mut data, self.ptt_press_send.raw())?;
        Self::DTMF_DELAY_TIME.encode(&mut data, self.dtmf_delay_time)?;
        Self::DTMF_DIGIT_DURATION.encode(&mut data, self.dtmf_digit_duration)?;
        Self::DTMF_INTERVAL_DURATION.encode(&mut data, self.dtmf_interval_duration)?;
        Self::TRAILING_SPACE.encode(&mut data, &self.trailing_space)?;

        Ok(data)
    }
}
