// Segment memory schemas for the radio's configuration data

pub mod calibration;
pub mod channel;
pub mod frequency;
pub mod general;
pub mod phone;

pub use calibration::CalibrationMemory;
pub use channel::{ChannelEntry, ChannelMemory};
pub use frequency::{
    Bandwidth, BusyLock, FrequencyEntry, FrequencyMemory, Power, PttId, Scan, Signal,
};
pub use general::{
    AlarmMode, AlarmSound, AutoKeyLock, BatterySaver, BeepTone, BootscreenMode, ChannelDisplay,
    CtcssTailRevert, DtmfSideTone, DualStandby, FmRadio, GeneralMemory, RogerBeep, ScanType,
    ToneBurst, VoiceAlert, WorkMode,
};
pub use phone::{DtmfCode, PhoneMemory, PttPressSend, PttReleaseSend};
