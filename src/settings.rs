// Typed settings registry
//
// Looks up a setting by a stable name without the caller knowing which
// memory segment owns it. The table is built once at startup; duplicate
// names are rejected when the registry is built, and unknown names fail
// the lookup rather than falling back to any runtime search.

use crate::config::{RadioConfig, SegmentRole};
use std::collections::HashMap;

type Getter = fn(&RadioConfig) -> u8;
type Setter = fn(&mut RadioConfig, u8);

/// One registered byte-valued setting.
#[derive(Clone, Copy)]
pub struct Setting {
    /// The schema role whose segment stores the raw byte.
    pub role: SegmentRole,
    get: Getter,
    set: Setter,
}

impl Setting {
    pub fn get(&self, config: &RadioConfig) -> u8 {
        (self.get)(config)
    }

    /// Assign the raw value. Range validation happens when the owning
    /// block is exported, where the field's advisory range applies.
    pub fn set(&self, config: &mut RadioConfig, value: u8) {
        (self.set)(config, value)
    }
}

/// Registry of byte-valued settings addressable by name.
pub struct SettingRegistry {
    entries: HashMap<&'static str, Setting>,
}

impl SettingRegistry {
    fn build(table: &[(&'static str, SegmentRole, Getter, Setter)]) -> Self {
        let mut entries = HashMap::with_capacity(table.len());
        for &(name, role, get, set) in table {
            let previous = entries.insert(name, Setting { role, get, set });
            if previous.is_some() {
                panic!("duplicate setting name: {}", name);
            }
        }
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&Setting> {
        self.entries.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

lazy_static::lazy_static! {
    /// The global settings table.
    pub static ref SETTINGS: SettingRegistry = SettingRegistry::build(&[
        (
            "active_channel_a",
            SegmentRole::Frequency,
            |c| c.frequency.channel_a,
            |c, v| c.frequency.channel_a = v,
        ),
        (
            "active_channel_b",
            SegmentRole::Frequency,
            |c| c.frequency.channel_b,
            |c, v| c.frequency.channel_b = v,
        ),
        (
            "transmit_timeout",
            SegmentRole::General,
            |c| c.general.transmit_timeout,
            |c, v| c.general.transmit_timeout = v,
        ),
        (
            "squelch_level",
            SegmentRole::General,
            |c| c.general.squelch_level,
            |c, v| c.general.squelch_level = v,
        ),
        (
            "vox_level",
            SegmentRole::General,
            |c| c.general.vox_level,
            |c, v| c.general.vox_level = v,
        ),
        (
            "backlight_timeout_seconds",
            SegmentRole::General,
            |c| c.general.backlight_timeout_seconds,
            |c, v| c.general.backlight_timeout_seconds = v,
        ),
        (
            "repeat_tail_revert",
            SegmentRole::General,
            |c| c.general.repeat_tail_revert,
            |c, v| c.general.repeat_tail_revert = v,
        ),
        (
            "repeat_tail_delay",
            SegmentRole::General,
            |c| c.general.repeat_tail_delay,
            |c, v| c.general.repeat_tail_delay = v,
        ),
        (
            "dtmf_delay_time",
            SegmentRole::Phone,
            |c| c.phone.dtmf_delay_time,
            |c, v| c.phone.dtmf_delay_time = v,
        ),
        (
            "dtmf_digit_duration",
            SegmentRole::Phone,
            |c| c.phone.dtmf_digit_duration,
            |c, v| c.phone.dtmf_digit_duration = v,
        ),
        (
            "dtmf_interval_duration",
            SegmentRole::Phone,
            |c| c.phone.dtmf_interval_duration,
            |c, v| c.phone.dtmf_interval_duration = v,
        ),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_roundtrip() {
        let mut config = RadioConfig::new();

        let setting = SETTINGS.lookup("squelch_level").unwrap();
        assert_eq!(setting.role, SegmentRole::General);
        assert_eq!(setting.get(&config), 0x03);

        setting.set(&mut config, 7);
        assert_eq!(config.general.squelch_level, 7);
    }

    #[test]
    fn test_settings_span_segments() {
        assert_eq!(
            SETTINGS.lookup("active_channel_a").unwrap().role,
            SegmentRole::Frequency
        );
        assert_eq!(
            SETTINGS.lookup("dtmf_delay_time").unwrap().role,
            SegmentRole::Phone
        );
    }

    #[test]
    fn test_unknown_name_fails_lookup() {
        assert!(SETTINGS.lookup("no_such_setting").is_none());
    }

    #[test]
    fn test_names_are_sorted_and_complete() {
        let names = SETTINGS.names();
        assert!(names.contains(&"transmit_timeout"));
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = std::panic::catch_unwind(|| {
            SettingRegistry::build(&[
                ("twice", SegmentRole::General, |c| c.general.vox_level, |c, v| {
                    c.general.vox_level = v
                }),
                ("twice", SegmentRole::General, |c| c.general.vox_level, |c, v| {
                    c.general.vox_level = v
                }),
            ])
        });
        assert!(result.is_err());
    }
}
