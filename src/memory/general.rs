// General settings segment: boot screen, timeouts, squelch, alarm, display

use crate::codec::{
    Block, BitsField, BytesField, CodecError, ConstBitsField, ConstField, Result, StringField,
    UInt8Field,
};
use crate::field_enum;

field_enum!(BootscreenMode {
    Logo = 0,
    Message = 1,
    Voltage = 2,
});

field_enum!(BatterySaver {
    Off = 0,
    OneToOne = 1,
    OneToTwo = 2,
    OneToThree = 3,
    OneToFour = 4,
});

field_enum!(WorkMode {
    Frequency = 0,
    Channel = 1,
});

field_enum!(VoiceAlert {
    Off = 0,
    On = 1,
});

field_enum!(BeepTone {
    Off = 0,
    On = 1,
});

field_enum!(AutoKeyLock {
    Off = 0,
    On = 1,
});

field_enum!(CtcssTailRevert {
    Off = 0,
    On = 1,
});

field_enum!(ScanType {
    Time = 0b00,
    Carrier = 0b01,
    Search = 0b10,
});

field_enum!(DtmfSideTone {
    Off = 0b00,
    DtOnly = 0b01,
    AniOnly = 0b10,
    DtAniBoth = 0b11,
});

field_enum!(DualStandby {
    Off = 0,
    On = 1,
});

field_enum!(RogerBeep {
    Off = 0,
    On = 1,
});

field_enum!(AlarmMode {
    OnSite = 0b00,
    SendSound = 0b01,
    SendCode = 0b10,
});

field_enum!(AlarmSound {
    Off = 0,
    On = 1,
});

field_enum!(FmRadio {
    Disabled = 0,
    Enabled = 1,
});

field_enum!(ToneBurst {
    Freq1000Hz = 0,
    Freq1450Hz = 1,
    Freq1750Hz = 2,
    Freq2100Hz = 3,
});

field_enum!(ChannelDisplay {
    NameNumber = 0,
    FrequencyNumber = 1,
});

/// The general settings segment.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralMemory {
    pub bootscreen_mode: BootscreenMode,
    pub bootscreen_line1: String,
    pub bootscreen_line2: String,
    /// Raw transmit timeout in 15-second units; see
    /// [`transmit_timeout_seconds`](Self::transmit_timeout_seconds).
    pub transmit_timeout: u8,
    pub squelch_level: u8,
    pub vox_level: u8,
    pub battery_saver: BatterySaver,
    pub work_mode: WorkMode,
    pub voice_alert: VoiceAlert,
    pub backlight_timeout_seconds: u8,
    pub beep_tone: BeepTone,
    pub auto_key_lock: AutoKeyLock,
    pub ctcss_tail_revert: CtcssTailRevert,
    pub scan_type: ScanType,
    pub dtmf_side_tone: DtmfSideTone,
    pub dual_standby: DualStandby,
    pub roger_beep: RogerBeep,
    pub alarm_mode: AlarmMode,
    pub alarm_sound: AlarmSound,
    pub fm_radio: FmRadio,
    /// Raw repeater tail revert time in 100 ms units.
    pub repeat_tail_revert: u8,
    /// Raw repeater tail delay time in 100 ms units.
    pub repeat_tail_delay: u8,
    pub tone_burst: ToneBurst,
    pub channel_display_a: ChannelDisplay,
    pub channel_display_b: ChannelDisplay,
    // 0x00 stock, 0x07 observed after saving a custom profile
    pub unknown_value1: u8,
    // 0x00 stock, 0x01 observed after saving a custom profile
    pub unknown_value2: u8,
    pub trailing_space: Vec<u8>,
}

impl GeneralMemory {
    const BOOTSCREEN_MODE: UInt8Field = UInt8Field::new(0x00);
    const BOOTSCREEN_LINE1: StringField = StringField::new(0x10, 10);
    const BOOTSCREEN_LINE2: StringField = StringField::new(0x20, 10);
    // meaning unknown; identical across observed dumps
    const CONST_30: ConstField = ConstField::new(
        0x30,
        &[
            0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x52, 0x00, 0x00, 0x60, 0x13, 0x00, 0x00,
            0x40, 0x17,
        ],
    );
    const TRANSMIT_TIMEOUT: UInt8Field = UInt8Field::with_range(0x40, 0x00, 0x28);
    const SQUELCH_LEVEL: UInt8Field = UInt8Field::with_range(0x41, 0x00, 0x09);
    const VOX_LEVEL: UInt8Field = UInt8Field::with_range(0x42, 0x00, 0x09);
    const BATTERY_SAVER: BitsField = BitsField::new(0x43, 0b1111_0000);
    const CONST_BIT_43: ConstBitsField = ConstBitsField::new(0x43, 0b0000_0010, 0x1);
    const WORK_MODE: BitsField = BitsField::new(0x43, 0b0000_0100);
    const VOICE_ALERT: BitsField = BitsField::new(0x43, 0b0000_0001);
    const BACKLIGHT_TIMEOUT: UInt8Field = UInt8Field::with_range(0x44, 0x00, 0x0A);
    const BEEP_TONE: BitsField = BitsField::new(0x45, 0b1000_0000);
    const AUTO_KEY_LOCK: BitsField = BitsField::new(0x45, 0b0100_0000);
    const CTCSS_TAIL_REVERT: BitsField = BitsField::new(0x45, 0b0001_0000);
    const SCAN_TYPE: BitsField = BitsField::new(0x45, 0b0000_1100);
    const DTMF_SIDE_TONE: BitsField = BitsField::new(0x45, 0b0000_0011);
    const DUAL_STANDBY: BitsField = BitsField::new(0x46, 0b0100_0000);
    const ROGER_BEEP: BitsField = BitsField::new(0x46, 0b0010_0000);
    const ALARM_MODE: BitsField = BitsField::new(0x46, 0b0001_1000);
    const ALARM_SOUND: BitsField = BitsField::new(0x46, 0b0000_0100);
    const FM_RADIO: BitsField = BitsField::new(0x46, 0b0000_0010);
    const REPEAT_TAIL_REVERT: UInt8Field = UInt8Field::with_range(0x47, 0x00, 0x0A);
    const REPEAT_TAIL_DELAY: UInt8Field = UInt8Field::with_range(0x48, 0x00, 0x0A);
    const TONE_BURST: UInt8Field = UInt8Field::new(0x49);
    const CHANNEL_DISPLAY_A: BitsField = BitsField::new(0x50, 0b0000_0001);
    const CHANNEL_DISPLAY_B: BitsField = BitsField::new(0x50, 0b0000_0010);
    // meaning unknown; identical across observed dumps
    const CONST_60: ConstField = ConstField::new(
        0x60,
        &[
            0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ],
    );
    const CONST_80: ConstField = ConstField::new(0x80, &[0x00; 0x285]);
    const UNKNOWN_VALUE1: UInt8Field = UInt8Field::new(0x305);
    const UNKNOWN_VALUE2: UInt8Field = UInt8Field::new(0x306);
    const TRAILING_SPACE: BytesField = BytesField::new(0x307, 0xCB9);

    /// Transmit timeout as seconds; the raw 15-second-unit byte stays
    /// authoritative.
    pub fn transmit_timeout_seconds(&self) -> u16 {
        self.transmit_timeout as u16 * 15
    }

    pub fn set_transmit_timeout_seconds(&mut self, seconds: u16) {
        self.transmit_timeout = (seconds / 15) as u8;
    }

    pub fn repeat_tail_revert_seconds(&self) -> f32 {
        self.repeat_tail_revert as f32 * 0.100
    }

    pub fn set_repeat_tail_revert_seconds(&mut self, seconds: f32) {
        self.repeat_tail_revert = (seconds / 0.100).round() as u8;
    }

    pub fn repeat_tail_delay_seconds(&self) -> f32 {
        self.repeat_tail_delay as f32 * 0.100
    }

    pub fn set_repeat_tail_delay_seconds(&mut self, seconds: f32) {
        self.repeat_tail_delay = (seconds / 0.100).round() as u8;
    }
}

impl Default for GeneralMemory {
    fn default() -> Self {
        Self {
            bootscreen_mode: BootscreenMode::Logo,
            bootscreen_line1: "WELCOME".to_string(),
            bootscreen_line2: "Radioddity".to_string(),
            transmit_timeout: 0x07,
            squelch_level: 0x03,
            vox_level: 0x00,
            battery_saver: BatterySaver::OneToTwo,
            work_mode: WorkMode::Channel,
            voice_alert: VoiceAlert::On,
            backlight_timeout_seconds: 0x05,
            beep_tone: BeepTone::On,
            auto_key_lock: AutoKeyLock::Off,
            ctcss_tail_revert: CtcssTailRevert::On,
            scan_type: ScanType::Carrier,
            dtmf_side_tone: DtmfSideTone::Off,
            dual_standby: DualStandby::Off,
            roger_beep: RogerBeep::On,
            alarm_mode: AlarmMode::OnSite,
            alarm_sound: AlarmSound::On,
            fm_radio: FmRadio::Enabled,
            repeat_tail_revert: 0x02,
            repeat_tail_delay: 0x02,
            tone_burst: ToneBurst::Freq1750Hz,
            channel_display_a: ChannelDisplay::NameNumber,
            channel_display_b: ChannelDisplay::NameNumber,
            unknown_value1: 0x00,
            unknown_value2: 0x00,
            trailing_space: vec![0x00; Self::TRAILING_SPACE.length],
        }
    }
}

impl Block for GeneralMemory {
    const SIZE: usize = 0xFC0;
    const DUMP_LEN: usize = 0x307;

    fn import_data(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CodecError::TruncatedInput {
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Self::CONST_30.check(data)?;
        Self::CONST_BIT_43.check(data)?;
        Self::CONST_60.check(data)?;
        Self::CONST_80.check(data)?;

        Ok(Self {
            bootscreen_mode: BootscreenMode::from_raw(Self::BOOTSCREEN_MODE.decode(data)?)?,
            bootscreen_line1: Self::BOOTSCREEN_LINE1.decode(data)?,
            bootscreen_line2: Self::BOOTSCREEN_LINE2.decode(data)?,
            transmit_timeout: Self::TRANSMIT_TIMEOUT.decode(data)?,
            squelch_level: Self::SQUELCH_LEVEL.decode(data)?,
            vox_level: Self::VOX_LEVEL.decode(data)?,
            battery_saver: BatterySaver::from_raw(Self::BATTERY_SAVER.decode(data)?)?,
            work_mode: WorkMode::from_raw(Self::WORK_MODE.decode(data)?)?,
            voice_alert: VoiceAlert::from_raw(Self::VOICE_ALERT.decode(data)?)?,
            backlight_timeout_seconds: Self::BACKLIGHT_TIMEOUT.decode(data)?,
            beep_tone: BeepTone::from_raw(Self::BEEP_TONE.decode(data)?)?,
            auto_key_lock: AutoKeyLock::from_raw(Self::AUTO_KEY_LOCK.decode(data)?)?,
            ctcss_tail_revert: CtcssTailRevert::from_raw(Self::CTCSS_TAIL_REVERT.decode(data)?)?,
            scan_type: ScanType::from_raw(Self::SCAN_TYPE.decode(data)?)?,
            dtmf_side_tone: DtmfSideTone::from_raw(Self::DTMF_SIDE_TONE.decode(data)?)?,
            dual_standby: DualStandby::from_raw(Self::DUAL_STANDBY.decode(data)?)?,
            roger_beep: RogerBeep::from_raw(Self::ROGER_BEEP.decode(data)?)?,
            alarm_mode: AlarmMode::from_raw(Self::ALARM_MODE.decode(data)?)?,
            alarm_sound: AlarmSound::from_raw(Self::ALARM_SOUND.decode(data)?)?,
            fm_radio: FmRadio::from_raw(Self::FM_RADIO.decode(data)?)?,
            repeat_tail_revert: Self::REPEAT_TAIL_REVERT.decode(data)?,
            repeat_tail_delay: Self::REPEAT_TAIL_DELAY.decode(data)?,
            tone_burst: ToneBurst::from_raw(Self::TONE_BURST.decode(data)?)?,
            channel_display_a: ChannelDisplay::from_raw(Self::CHANNEL_DISPLAY_A.decode(data)?)?,
            channel_display_b: ChannelDisplay::from_raw(Self::CHANNEL_DISPLAY_B.decode(data)?)?,
            unknown_value1: Self::UNKNOWN_VALUE1.decode(data)?,
            unknown_value2: Self::UNKNOWN_VALUE2.decode(data)?,
            trailing_space: Self::TRAILING_SPACE.decode(data)?,
        })
    }

    fn export_data(&self) -> Result<Vec<u8>> {
        let mut data = vec![Self::FILL; Self::SIZE];

        Self::BOOTSCREEN_MODE.encode(&mut data, self.bootscreen_mode.raw())?;
        Self::BOOTSCREEN_LINE1.encode(&mut data, &self.bootscreen_line1)?;
        Self::BOOTSCREEN_LINE2.encode(&mut data, &self.bootscreen_line2)?;
        Self::CONST_30.write(&mut data)?;
        Self::TRANSMIT_TIMEOUT.encode(&mut data, self.transmit_timeout)?;
        Self::SQUELCH_LEVEL.encode(&mut data, self.squelch_level)?;
        Self::VOX_LEVEL.encode(&mut data, self.vox_level)?;
        Self::BATTERY_SAVER.encode(&mut data, self.battery_saver.raw())?;
        Self::CONST_BIT_43.write(&mut data)?;
        Self::WORK_MODE.encode(&mut data, self.work_mode.raw())?;
        Self::VOICE_ALERT.encode(&mut data, self.voice_alert.raw())?;
        Self::BACKLIGHT_TIMEOUT.encode(&mut data, self.backlight_timeout_seconds)?;
        Self::BEEP_TONE.encode(&mut data, self.beep_tone.raw())?;
        Self::AUTO_KEY_LOCK.encode(&mut data, self.auto_key_lock.raw())?;
        Self::CTCSS_TAIL_REVERT.encode(&mut data, self.ctcss_tail_revert.raw())?;
        Self::SCAN_TYPE.encode(&mut data, self.scan_type.raw())?;
        Self::DTMF_SIDE_TONE.encode(&mut data, self.dtmf_side_tone.raw())?;
        Self::DUAL_STANDBY.encode(&mut data, self.dual_standby.raw())?;
        Self::ROGER_BEEP.encode(&mut data, self.roger_beep.raw())?;
        Self::ALARM_MODE.encode(&mut data, self.alarm_mode.raw())?;
        Self::ALARM_SOUND.encode(&mut data, self.alarm_sound.raw())?;
        Self::FM_RADIO.encode(&mut data, self.fm_radio.raw())?;
        Self::REPEAT_TAIL_REVERT.encode(&mut data, self.repeat_tail_revert)?;
        Self::REPEAT_TAIL_DELAY.encode(&mut data, self.repeat_tail_delay)?;
        Self::TONE_BURST.encode(&mut data, self.tone_burst.raw())?;
        Self::CHANNEL_DISPLAY_A.encode(&mut data, self.channel_display_a.raw())?;
        Self::CHANNEL_DISPLAY_B.encode(&mut data, self.channel_display_b.raw())?;
        Self::CONST_60.write(&mut data)?;
        Self::CONST_80.write(&mut data)?;
        Self::UNKNOWN_VALUE1.encode(&mut data, self.unknown_value1)?;
        Self::UNKNOWN_VALUE2.encode(&mut data, self.unknown_value2)?;
        Self::TRAILING_SPACE.encode(&mut data, &self.trailing_space)?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export() {
        let memory = GeneralMemory::default();
        let data = memory.export_data().unwrap();

        assert_eq!(data.len(), 0xFC0);
        assert_eq!(data[0x00], 0x00); // boot logo
        assert_eq!(&data[0x10..0x17], b"WELCOME");
        assert_eq!(&data[0x20..0x2A], b"Radioddity");
        assert_eq!(data[0x40], 0x07);
        assert_eq!(data[0x41], 0x03);
        // battery saver 1:2, const flag, channel mode, voice alert
        assert_eq!(data[0x43], 0x27);
        assert_eq!(data[0x49], 0x02); // 1750 Hz tone burst
    }

    #[test]
    fn test_roundtrip() {
        let mut memory = GeneralMemory::default();
        memory.bootscreen_mode = BootscreenMode::Message;
        memory.bootscreen_line1 = "HELLO".to_string();
        memory.squelch_level = 7;
        memory.scan_type = ScanType::Search;
        memory.dtmf_side_tone = DtmfSideTone::DtAniBoth;
        memory.alarm_mode = AlarmMode::SendCode;
        memory.channel_display_b = ChannelDisplay::FrequencyNumber;

        let imported = GeneralMemory::import_data(&memory.export_data().unwrap()).unwrap();
        assert_eq!(imported, memory);
    }

    #[test]
    fn test_const_guard_detects_layout_drift() {
        let mut raw = GeneralMemory::default().export_data().unwrap();
        raw[0x33] = 0x41;
        assert!(matches!(
            GeneralMemory::import_data(&raw),
            Err(CodecError::UnexpectedLayout { offset: 0x30, .. })
        ));
    }

    #[test]
    fn test_const_bit_guard() {
        let mut raw = GeneralMemory::default().export_data().unwrap();
        raw[0x43] &= !0b0000_0010;
        assert!(matches!(
            GeneralMemory::import_data(&raw),
            Err(CodecError::UnexpectedLayout { offset: 0x43, .. })
        ));
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let mut raw = GeneralMemory::default().export_data().unwrap();
        raw[0x00] = 0x05; // no such boot screen mode
        assert!(matches!(
            GeneralMemory::import_data(&raw),
            Err(CodecError::UnknownEnumValue {
                field: "BootscreenMode",
                value: 0x05
            })
        ));
    }

    #[test]
    fn test_transmit_timeout_seconds_view() {
        let mut memory = GeneralMemory::default();
        assert_eq!(memory.transmit_timeout_seconds(), 105);

        memory.set_transmit_timeout_seconds(120);
        assert_eq!(memory.transmit_timeout, 8);
        assert_eq!(memory.transmit_timeout_seconds(), 120);
    }

    #[test]
    fn test_tail_seconds_views() {
        let mut memory = GeneralMemory::default();
        assert!((memory.repeat_tail_revert_seconds() - 0.2).abs() < 1e-6);

        memory.set_repeat_tail_delay_seconds(0.5);
        assert_eq!(memory.repeat_tail_delay, 5);
        assert!((memory.repeat_tail_delay_seconds() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_size_is_constant() {
        assert_eq!(GeneralMemory::default().size(), 0xFC0);
    }
}
