//! Command builders.
//!
//! Pure functions mapping a logical request to the exact outgoing byte
//! sequence: sentinel framing, fixed-width zero-padding, and batch
//! composition. Builders that take no argument are infallible and return
//! [`Bytes`]; builders with numeric arguments return an [`EncodeError`]
//! when a value does not fit its declared width — never a truncated frame.
//!
//! A batch is several sub-commands concatenated, each carrying its own
//! request sentinel, with nothing between or around them. The device
//! answers every sub-command independently.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Local, Utc};

use super::registry::{codes, REQUEST_SENTINEL};
use super::value::Slot;
use crate::error::EncodeError;

/// Intensity and color temperature for one slot of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLevels {
    /// Intensity, percent.
    pub intensity: u16,
    /// Color temperature step.
    pub temperature: u16,
}

/// A full three-slot scene, in wire-slot order (up, bio, down).
pub type Scene = [SlotLevels; 3];

/// Hardware buttons that can be pressed remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Coffee activity button.
    Coffee,
    /// Relax activity button.
    Relax,
    /// Right light button.
    Right,
    /// Left light button.
    Left,
    /// Bio light button.
    Bio,
    /// Power button.
    Power,
}

impl Button {
    /// Position of this button in the six-character simulate mask.
    fn mask_position(self) -> usize {
        match self {
            Button::Coffee => 0,
            Button::Relax => 1,
            Button::Right => 2,
            Button::Left => 3,
            Button::Bio => 4,
            Button::Power => 5,
        }
    }
}

fn command(code: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(1 + code.len());
    buf.put_u8(REQUEST_SENTINEL);
    buf.put_slice(code.as_bytes());
    buf
}

fn command_with(code: &str, args: &str) -> Bytes {
    let mut buf = command(code);
    buf.put_slice(args.as_bytes());
    buf.freeze()
}

/// Zero-pad `value` to `width` digits, rejecting values that do not fit.
fn pad_int(what: &'static str, value: i64, width: u32) -> Result<String, EncodeError> {
    let max = 10i64.pow(width) - 1;
    if value < 0 || value > max {
        return Err(EncodeError::ValueOutOfRange { what, value, max });
    }
    Ok(format!("{:0>width$}", value, width = width as usize))
}

// ---------------------------------------------------------------------------
// Identity / bring-up
// ---------------------------------------------------------------------------

/// Request the firmware version.
pub fn req_version() -> Bytes {
    command(codes::GET_VERSION).freeze()
}

/// Request the device name.
pub fn req_name() -> Bytes {
    command(codes::GET_NAME).freeze()
}

/// Request the serial number.
pub fn req_serial_number() -> Bytes {
    command(codes::GET_SERIAL_NUMBER).freeze()
}

/// Request the main PCB firmware version.
pub fn req_pcb_version() -> Bytes {
    command(codes::GET_PCB_VERSION).freeze()
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Request the device RTC time.
pub fn req_utc_time() -> Bytes {
    command(codes::GET_UTC_TIME).freeze()
}

/// Set the device RTC to the given UTC instant (`HHMMSS`).
pub fn set_utc_time(at: DateTime<Utc>) -> Bytes {
    command_with(codes::SET_UTC_TIME, &at.format("%H%M%S").to_string())
}

/// Request the configured UTC offset.
pub fn req_utc_offset() -> Bytes {
    command(codes::GET_UTC_OFFSET).freeze()
}

/// Set the UTC offset in whole hours.
///
/// The wire field is two unsigned digits; negative offsets are wrapped by
/// +24, so `-2` goes out as `22`.
pub fn set_utc_offset(offset_hours: i32) -> Result<Bytes, EncodeError> {
    if !(-23..=23).contains(&offset_hours) {
        return Err(EncodeError::ValueOutOfRange {
            what: "utc offset",
            value: offset_hours as i64,
            max: 23,
        });
    }
    let wrapped = if offset_hours < 0 {
        offset_hours + 24
    } else {
        offset_hours
    };
    let padded = pad_int("utc offset", wrapped as i64, 2)?;
    Ok(command_with(codes::SET_UTC_OFFSET, &padded))
}

/// Set the sun-cycle reference time (`HHMMSSDDMMYY`).
///
/// This is the one clock command the device wants in local time.
pub fn set_sun_cycle_time(at: DateTime<Local>) -> Bytes {
    command_with(codes::SET_SUN_CYCLE_TIME, &at.format("%H%M%S%d%m%y").to_string())
}

/// Request the sun-cycle time.
pub fn req_sun_cycle_time() -> Bytes {
    command(codes::GET_SUN_CYCLE_TIME).freeze()
}

/// Request the local sun dawn and dusk times.
pub fn req_sun_times() -> Bytes {
    command(codes::GET_SUN_TIMES).freeze()
}

// ---------------------------------------------------------------------------
// Environment sensors
// ---------------------------------------------------------------------------

/// Request the CO2 reading.
pub fn req_co2() -> Bytes {
    command(codes::GET_CO2).freeze()
}

/// Request the CO2 sensor accuracy.
pub fn req_co2_accuracy() -> Bytes {
    command(codes::GET_CO2_ACCURACY).freeze()
}

/// Request the temperature reading.
pub fn req_temperature() -> Bytes {
    command(codes::GET_TEMPERATURE).freeze()
}

/// Request the air pressure reading.
pub fn req_pressure() -> Bytes {
    command(codes::GET_PRESSURE).freeze()
}

/// Request the relative humidity reading.
pub fn req_humidity() -> Bytes {
    command(codes::GET_HUMIDITY).freeze()
}

/// Request the ambient light sensor reading.
pub fn req_light_sensor() -> Bytes {
    command(codes::GET_LIGHT_SENSOR).freeze()
}

/// Request the air-quality LED state.
pub fn req_air_quality_led() -> Bytes {
    command(codes::GET_AIR_QUALITY_LED).freeze()
}

/// Request every metrics-batch datapoint in one write.
///
/// Order matches the device's queue layout: CO2, accuracy, temperature,
/// pressure, humidity, timestamp. Each sub-command is answered by its own
/// response frame, unordered relative to the batch.
pub fn req_metrics() -> Bytes {
    let mut buf = BytesMut::new();
    for code in [
        codes::METRICS_CO2,
        codes::METRICS_CO2_ACCURACY,
        codes::METRICS_TEMPERATURE,
        codes::METRICS_PRESSURE,
        codes::METRICS_HUMIDITY,
        codes::METRICS_TIMESTAMP,
    ] {
        buf.put_u8(REQUEST_SENTINEL);
        buf.put_slice(code.as_bytes());
    }
    buf.freeze()
}

/// Request the presence detection state.
pub fn req_presence() -> Bytes {
    command(codes::GET_PRESENCE).freeze()
}

/// Request the coffee/relax activity state.
pub fn req_activity() -> Bytes {
    command(codes::GET_ACTIVITY).freeze()
}

/// Request the configured latitude.
pub fn req_latitude() -> Bytes {
    command(codes::GET_LATITUDE).freeze()
}

/// Request the configured longitude.
pub fn req_longitude() -> Bytes {
    command(codes::GET_LONGITUDE).freeze()
}

// ---------------------------------------------------------------------------
// Light state
// ---------------------------------------------------------------------------

/// Request the hardware button states.
pub fn req_button_states() -> Bytes {
    command(codes::GET_BUTTON_STATES).freeze()
}

/// Request a readback of one LED channel (0..=10).
pub fn req_channel(channel: u8) -> Result<Bytes, EncodeError> {
    if channel > 10 {
        return Err(EncodeError::ValueOutOfRange {
            what: "channel",
            value: channel as i64,
            max: 10,
        });
    }
    Ok(command_with(codes::GET_CHANNEL, &channel.to_string()))
}

/// Request a readback of every LED channel as one batch.
pub fn req_all_channels() -> Bytes {
    let mut buf = BytesMut::new();
    for channel in 0..=10u8 {
        buf.put_u8(REQUEST_SENTINEL);
        buf.put_slice(codes::GET_CHANNEL.as_bytes());
        buf.put_slice(channel.to_string().as_bytes());
    }
    buf.freeze()
}

/// Request the manual mode state.
pub fn req_manual_mode() -> Bytes {
    command(codes::GET_MANUAL_MODE).freeze()
}

/// Force manual mode on.
pub fn manual_mode_on() -> Bytes {
    command(codes::MANUAL_MODE).freeze()
}

/// Simulate a press on one of the hardware buttons.
pub fn press_button(button: Button) -> Bytes {
    let mut mask = [b'X'; 6];
    mask[button.mask_position()] = b'D';
    let mut buf = command(codes::SIMULATE_BUTTON);
    buf.put_slice(&mask);
    buf.freeze()
}

/// Apply a three-slot scene in manual mode.
///
/// Each slot contributes one sub-command
/// `@^D{slot:02}{intensity:03}{temperature:03}`; the batch ends with a
/// manual-mode-on sub-command because scenes only take visible effect in
/// manual mode.
pub fn manual_scene(scene: &Scene) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::new();
    for (slot, levels) in Slot::ALL.iter().zip(scene) {
        buf.put_u8(REQUEST_SENTINEL);
        buf.put_slice(codes::SET_SLOT_MANUAL.as_bytes());
        buf.put_slice(pad_int("slot", slot.index() as i64, 2)?.as_bytes());
        buf.put_slice(pad_int("intensity", levels.intensity as i64, 3)?.as_bytes());
        buf.put_slice(pad_int("temperature", levels.temperature as i64, 3)?.as_bytes());
    }
    buf.put_slice(&manual_mode_on());
    Ok(buf.freeze())
}

/// The built-in video-call scene.
pub fn video_mode() -> Bytes {
    let scene = [
        SlotLevels { intensity: 100, temperature: 60 },
        SlotLevels { intensity: 30, temperature: 15 },
        SlotLevels { intensity: 100, temperature: 65 },
    ];
    manual_scene(&scene).expect("built-in scene is within range")
}

/// Store a three-slot scene as preset data (bank 1).
///
/// Sub-frame layout per slot: fixed marker `1`, one slot digit, 3-digit
/// intensity, 3-digit temperature. Ends with manual-mode-on like
/// [`manual_scene`].
pub fn store_preset(scene: &Scene) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::new();
    for (slot, levels) in Slot::ALL.iter().zip(scene) {
        buf.put_u8(REQUEST_SENTINEL);
        buf.put_slice(codes::SET_PRESET_DATA.as_bytes());
        buf.put_u8(b'1');
        buf.put_slice(slot.index().to_string().as_bytes());
        buf.put_slice(pad_int("intensity", levels.intensity as i64, 3)?.as_bytes());
        buf.put_slice(pad_int("temperature", levels.temperature as i64, 3)?.as_bytes());
    }
    buf.put_slice(&manual_mode_on());
    Ok(buf.freeze())
}

/// Store a preset name (bank 1). The wire field is exactly 10 characters,
/// space-padded; longer names are truncated with a warning.
pub fn store_preset_name(name: &str) -> Bytes {
    // TODO: reject non-ASCII names before they hit the wire.
    let mut name = name.to_string();
    if name.len() > 10 {
        tracing::warn!(name = %name, "preset name too long, truncating to 10 characters");
        name.truncate(10);
    }
    let mut buf = command(codes::SET_PRESET_NAME);
    buf.put_u8(b'1');
    buf.put_slice(format!("{:<10}", name).as_bytes());
    buf.freeze()
}

/// Request stored preset data for all three slots (bank 1).
pub fn req_preset_data() -> Bytes {
    let mut buf = BytesMut::new();
    for slot in Slot::ALL {
        buf.put_u8(REQUEST_SENTINEL);
        buf.put_slice(codes::GET_PRESET_DATA.as_bytes());
        buf.put_u8(b'1');
        buf.put_slice(slot.index().to_string().as_bytes());
    }
    buf.freeze()
}

/// Request the stored preset name (bank 1).
pub fn req_preset_name() -> Bytes {
    command_with(codes::GET_PRESET_NAME, "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_simple_requests_are_sentinel_plus_code() {
        assert_eq!(&req_version()[..], b"@V");
        assert_eq!(&req_name()[..], b"@gN");
        assert_eq!(&req_serial_number()[..], b"@u");
        assert_eq!(&req_pcb_version()[..], b"@qf");
        assert_eq!(&req_utc_time()[..], b"@h");
        assert_eq!(&req_sun_times()[..], b"@X");
        assert_eq!(&req_light_sensor()[..], b"@qL");
        assert_eq!(&manual_mode_on()[..], b"@C");
    }

    #[test]
    fn test_set_utc_time_layout() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(&set_utc_time(at)[..], b"@H070503");
    }

    #[test]
    fn test_set_utc_offset_wraps_negative() {
        assert_eq!(&set_utc_offset(-2).unwrap()[..], b"@D22");
        assert_eq!(&set_utc_offset(0).unwrap()[..], b"@D00");
        assert_eq!(&set_utc_offset(2).unwrap()[..], b"@D02");
        assert_eq!(&set_utc_offset(14).unwrap()[..], b"@D14");
    }

    #[test]
    fn test_set_utc_offset_rejects_out_of_range() {
        assert!(set_utc_offset(24).is_err());
        assert!(set_utc_offset(-24).is_err());
    }

    #[test]
    fn test_set_sun_cycle_time_layout() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(&set_sun_cycle_time(at)[..], b"@T235958311224");
    }

    #[test]
    fn test_metrics_batch() {
        assert_eq!(&req_metrics()[..], b"@mgg@mga@mgt@mgp@mgh@mgs");
    }

    #[test]
    fn test_channel_requests() {
        assert_eq!(&req_channel(0).unwrap()[..], b"@c0");
        assert_eq!(&req_channel(10).unwrap()[..], b"@c10");
        assert!(req_channel(11).is_err());

        let batch = req_all_channels();
        assert!(batch.starts_with(b"@c0@c1"));
        assert!(batch.ends_with(b"@c10"));
        assert_eq!(batch.iter().filter(|&&b| b == b'@').count(), 11);
    }

    #[test]
    fn test_press_button_masks() {
        assert_eq!(&press_button(Button::Power)[..], b"@KXXXXXD");
        assert_eq!(&press_button(Button::Coffee)[..], b"@KDXXXXX");
        assert_eq!(&press_button(Button::Relax)[..], b"@KXDXXXX");
        assert_eq!(&press_button(Button::Left)[..], b"@KXXXDXX");
        assert_eq!(&press_button(Button::Right)[..], b"@KXXDXXX");
        assert_eq!(&press_button(Button::Bio)[..], b"@KXXXXDX");
    }

    #[test]
    fn test_manual_scene_batch_layout() {
        let scene = [
            SlotLevels { intensity: 100, temperature: 60 },
            SlotLevels { intensity: 30, temperature: 15 },
            SlotLevels { intensity: 100, temperature: 65 },
        ];
        let frame = manual_scene(&scene).unwrap();
        assert_eq!(&frame[..], b"@^D00100060@^D01030015@^D02100065@C");
        assert_eq!(frame, video_mode());
    }

    #[test]
    fn test_manual_scene_rejects_oversized_values() {
        let scene = [
            SlotLevels { intensity: 1000, temperature: 60 },
            SlotLevels { intensity: 30, temperature: 15 },
            SlotLevels { intensity: 100, temperature: 65 },
        ];
        assert_eq!(
            manual_scene(&scene),
            Err(EncodeError::ValueOutOfRange {
                what: "intensity",
                value: 1000,
                max: 999,
            })
        );
    }

    #[test]
    fn test_store_preset_layout() {
        let scene = [
            SlotLevels { intensity: 100, temperature: 60 },
            SlotLevels { intensity: 100, temperature: 60 },
            SlotLevels { intensity: 100, temperature: 60 },
        ];
        let frame = store_preset(&scene).unwrap();
        assert_eq!(&frame[..], b"@^S10100060@^S11100060@^S12100060@C");
    }

    #[test]
    fn test_store_preset_name_pads_and_truncates() {
        assert_eq!(&store_preset_name("Focus")[..], b"@^N1Focus     ");
        assert_eq!(
            &store_preset_name("EveningWindDown")[..],
            b"@^N1EveningWin"
        );
    }

    #[test]
    fn test_preset_readback_requests() {
        assert_eq!(&req_preset_data()[..], b"@^s10@^s11@^s12");
        assert_eq!(&req_preset_name()[..], b"@^n1");
    }

    #[test]
    fn test_pad_int_boundaries() {
        assert_eq!(pad_int("x", 0, 3).unwrap(), "000");
        assert_eq!(pad_int("x", 999, 3).unwrap(), "999");
        assert!(pad_int("x", 1000, 3).is_err());
        assert!(pad_int("x", -1, 3).is_err());
    }
}
