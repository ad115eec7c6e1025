// Frequency table segment: VFO A/B plus 249 channel-associated entries
//
// Annotated dump of a stock entry, 16 bytes:
//   50 62 25 46 | 50 62 25 46 | 00 ff ff ff ff | 06 | 11 00
//   RX          | TX          | ?? ?? ?? ?? ?? | BW + Power | ?? ??
// CH1, RX: 462.56250, TX: 462.56250, Bw: Wide, Power: High

use crate::codec::{
    Block, BitsField, BytesField, CodecError, ConstField, Frequency, Result, UInt8Field,
};
use crate::field_enum;

field_enum!(Bandwidth {
    Narrow = 0,
    Wide = 1,
});

field_enum!(Power {
    Low = 0,
    High = 1,
});

field_enum!(PttId {
    Off = 0b00,
    Bot = 0b01,
    Eot = 0b10,
    Both = 0b11,
});

field_enum!(BusyLock {
    Off = 0,
    On = 1,
});

field_enum!(
    /// Which DTMF signaling code slot the channel uses.
    Signal {
        None = 0x0,
        One = 0x1,
        Two = 0x2,
        Three = 0x3,
        Four = 0x4,
        Five = 0x5,
        Six = 0x6,
        Seven = 0x7,
        Eight = 0x8,
        Nine = 0x9,
        Ten = 0xA,
        Eleven = 0xB,
        Twelve = 0xC,
        Thirteen = 0xD,
        Fourteen = 0xE,
        Fifteen = 0xF,
    }
);

field_enum!(Scan {
    No = 0,
    Yes = 1,
});

/// One 16-byte frequency table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyEntry {
    pub receive_frequency: Frequency,
    pub transmit_frequency: Frequency,
    // sometimes 0x00 but mostly 0xFF; meaning unknown
    pub unknown_flag: u8,
    // holds CTCSS code digits when squelch codes are configured; preserved
    // verbatim until the encoding is characterized
    pub unknown_codes: Vec<u8>,
    pub bandwidth: Bandwidth,
    pub power: Power,
    pub ptt_id: PttId,
    pub busy_lock: BusyLock,
    pub signal: Signal,
    pub scan: Scan,
    // 0x00 in every observed dump; possibly the frequency hopping code
    pub unused_data: u8,
}

impl FrequencyEntry {
    const RECEIVE_FREQUENCY: usize = 0x0;
    const TRANSMIT_FREQUENCY: usize = 0x4;
    const UNKNOWN_FLAG: UInt8Field = UInt8Field::new(0x8);
    const UNKNOWN_CODES: BytesField = BytesField::new(0x9, 4);
    const BANDWIDTH: BitsField = BitsField::new(0xD, 0b0000_0100);
    const POWER: BitsField = BitsField::new(0xD, 0b0000_0010);
    const PTT_ID: BitsField = BitsField::new(0xD, 0b0011_0000);
    const BUSY_LOCK: BitsField = BitsField::new(0xD, 0b0100_0000);
    const SIGNAL: BitsField = BitsField::new(0xE, 0b1111_0000);
    const SCAN: BitsField = BitsField::new(0xE, 0b0000_1000);
    const UNUSED_DATA: UInt8Field = UInt8Field::new(0xF);

    /// Wire image used to fabricate array slots with no populated entry.
    pub const SLOT_FILL: [u8; 16] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x06, 0x11,
        0x00,
    ];
}

impl Default for FrequencyEntry {
    fn default() -> Self {
        Self {
            receive_frequency: Frequency::Unset,
            transmit_frequency: Frequency::Unset,
            unknown_flag: 0xFF,
            unknown_codes: vec![0xFF; 4],
            bandwidth: Bandwidth::Wide,
            power: Power::High,
            ptt_id: PttId::Off,
            busy_lock: BusyLock::Off,
            signal: Signal::One,
            scan: Scan::No,
            unused_data: 0x00,
        }
    }
}

impl Block for FrequencyEntry {
    const SIZE: usize = 0x10;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            receive_frequency: Frequency::decode(&data[Self::RECEIVE_FREQUENCY..])?,
            transmit_frequency: Frequency::decode(&data[Self::TRANSMIT_FREQUENCY..])?,
            unknown_flag: Self::UNKNOWN_FLAG.decode(data)?,
            unknown_codes: Self::UNKNOWN_CODES.decode(data)?,
            bandwidth: Bandwidth::from_raw(Self::BANDWIDTH.decode(data)?)?,
            power: Power::from_raw(Self::POWER.decode(data)?)?,
            ptt_id: PttId::from_raw(Self::PTT_ID.decode(data)?)?,
            busy_lock: BusyLock::from_raw(Self::BUSY_LOCK.decode(data)?)?,
            signal: Signal::from_raw(Self::SIGNAL.decode(data)?)?,
            scan: Scan::from_raw(Self::SCAN.decode(data)?)?,
            unused_data: Self::UNUSED_DATA.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        let mut data = vec![Self::FILL; Self::SIZE];

        data[Self::RECEIVE_FREQUENCY..Self::RECEIVE_FREQUENCY + 4]
            .copy_from_slice(&self.receive_frequency.encode());
        data[Self::TRANSMIT_FREQUENCY..Self::TRANSMIT_FREQUENCY + 4]
            .copy_from_slice(&self.transmit_frequency.encode());
        Self::UNKNOWN_FLAG.encode(&mut data, self.unknown_flag)?;
        Self::UNKNOWN_CODES.encode(&mut data, &self.unknown_codes)?;
        Self::BANDWIDTH.encode(&mut data, self.bandwidth.raw())?;
        Self::POWER.encode(&mut data, self.power.raw())?;
        Self::PTT_ID.encode(&mut data, self.ptt_id.raw())?;
        Self::BUSY_LOCK.encode(&mut data, self.busy_lock.raw())?;
        Self::SIGNAL.encode(&mut data, self.signal.raw())?;
        Self::SCAN.encode(&mut data, self.scan.raw())?;
        Self::UNUSED_DATA.encode(&mut data, self.unused_data)?;

        Ok(data)
    }
}

/// The frequency segment: header, both VFOs, and the channel entry table.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyMemory {
    // 0xFF 0xFF stock but often 0xFA 0x00 after a CPS write
    pub unknown_data1: Vec<u8>,
    /// 1-based index of the active channel on side A.
    pub channel_a: u8,
    /// 1-based index of the active channel on side B.
    pub channel_b: u8,
    // 0x00 or 0xFF; meaning unknown
    pub unknown_data4: Vec<u8>,
    pub vfo_a: FrequencyEntry,
    pub vfo_b: FrequencyEntry,
    pub entries: Vec<FrequencyEntry>,
    pub trailing_space: Vec<u8>,
}

impl FrequencyMemory {
    const UNKNOWN_DATA1: BytesField = BytesField::new(0x00, 2);
    const CHANNEL_A: UInt8Field = UInt8Field::with_range(0x02, 1, 249);
    const CONST_03: ConstField = ConstField::new(0x03, &[0x00]);
    const CHANNEL_B: UInt8Field = UInt8Field::with_range(0x04, 1, 249);
    const CONST_05: ConstField = ConstField::new(0x05, &[0x00]);
    const UNKNOWN_DATA4: BytesField = BytesField::new(0x06, 0x0A);
    const VFO_A: usize = 0x10;
    const VFO_B: usize = 0x20;
    const ENTRIES: usize = 0x30;
    const ENTRY_COUNT: usize = 249;
    const TRAILING_SPACE: BytesField = BytesField::new(0xFC0, 0x20);
}

impl Default for FrequencyMemory {
    fn default() -> Self {
        Self {
            unknown_data1: vec![0xFA, 0x00],
            channel_a: 1,
            channel_b: 1,
            unknown_data4: vec![0x00; Self::UNKNOWN_DATA4.length],
            vfo_a: FrequencyEntry::default(),
            vfo_b: FrequencyEntry::default(),
            entries: Vec::new(),
            trailing_space: vec![0x00; Self::TRAILING_SPACE.length],
        }
    }
}

impl Block for FrequencyMemory {
    const SIZE: usize = 0xFE0;
    const DUMP_LEN: usize = 0xFC0;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Self::CONST_03.check(data)?;
        Self::CONST_05.check(data)?;

        let mut entries = Vec::with_capacity(Self::ENTRY_COUNT);
        for i in 0..Self::ENTRY_COUNT {
            let offset = Self::ENTRIES + i * FrequencyEntry::SIZE;
            entries.push(FrequencyEntry::import_data(&data[offset..])?);
        }

        Ok(Self {
            unknown_data1: Self::UNKNOWN_DATA1.decode(data)?,
            channel_a: Self::CHANNEL_A.decode(data)?,
            channel_b: Self::CHANNEL_B.decode(data)?,
            unknown_data4: Self::UNKNOWN_DATA4.decode(data)?,
            vfo_a: FrequencyEntry::import_data(&data[Self::VFO_A..])?,
            vfo_b: FrequencyEntry::import_data(&data[Self::VFO_B..])?,
            entries,
            trailing_space: Self::TRAILING_SPACE.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        if self.entries.len() > Self::ENTRY_COUNT {
            return Err(CodecError::TooManyElements {
                len: self.entries.len(),
                max: Self::ENTRY_COUNT,
            });
        }

        let mut data = vec![Self::FILL; Self::SIZE];

        Self::UNKNOWN_DATA1.encode(&mut data, &self.unknown_data1)?;
        Self::CHANNEL_A.encode(&mut data, self.channel_a)?;
        Self::CONST_03.write(&mut data)?;
        Self::CHANNEL_B.encode(&mut data, self.channel_b)?;
        Self::CONST_05.write(&mut data)?;
        Self::UNKNOWN_DATA4.encode(&mut data, &self.unknown_data4)?;

        data[Self::VFO_A..Self::VFO_A + FrequencyEntry::SIZE]
            .copy_from_slice(&self.vfo_a.export_data()?);
        data[Self::VFO_B..Self::VFO_B + FrequencyEntry::SIZE]
            .copy_from_slice(&self.vfo_b.export_data()?);

        for i in 0..Self::ENTRY_COUNT {
            let offset = Self::ENTRIES + i * FrequencyEntry::SIZE;
            let span = &mut data[offset..offset + FrequencyEntry::SIZE];
            match self.entries.get(i) {
                Some(entry) => span.copy_from_slice(&entry.export_data()?),
                None => span.copy_from_slice(&FrequencyEntry::SLOT_FILL),
            }
        }

        Self::TRAILING_SPACE.encode(&mut data, &self.trailing_space)?;
        Ok(data)
    }
}
