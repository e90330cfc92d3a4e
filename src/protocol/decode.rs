//! Response decoder.
//!
//! Classifies one inbound frame against the command registry and parses
//! its payload into a [`DecodedValue`]. Decoding is purely functional: no
//! session state is touched here; identity updates and callback fan-out
//! belong to the session.
//!
//! Every failure is a non-fatal [`DecodeError`] — the caller logs and
//! moves on. Only transport-level failures terminate a session, and those
//! never originate here.

use chrono::NaiveTime;

use super::registry::{CommandRegistry, CommandSpec, PayloadShape, RESPONSE_SENTINEL};
use super::value::{DecodedValue, Slot, Value};
use crate::error::DecodeError;

/// Classify and parse one inbound frame.
pub fn decode(registry: &CommandRegistry, frame: &[u8]) -> Result<DecodedValue, DecodeError> {
    let Some((&leading, body)) = frame.split_first() else {
        return Err(DecodeError::Empty);
    };
    if leading != RESPONSE_SENTINEL {
        return Err(DecodeError::NotAResponse { leading });
    }

    let cmd = registry
        .longest_match(body)
        .ok_or_else(|| DecodeError::UnknownMnemonic(String::from_utf8_lossy(body).into_owned()))?;

    let payload = std::str::from_utf8(&body[cmd.code.len()..])
        .map_err(|_| malformed(cmd, &body[cmd.code.len()..]))?;

    let shape = cmd
        .response
        .expect("longest_match only yields response-bearing commands");
    let value = parse_payload(shape, payload).ok_or_else(|| malformed(cmd, payload.as_bytes()))?;

    Ok(DecodedValue::new(cmd.code, value))
}

fn malformed(cmd: &CommandSpec, raw: &[u8]) -> DecodeError {
    DecodeError::MalformedPayload {
        mnemonic: cmd.code,
        raw: String::from_utf8_lossy(raw).into_owned(),
    }
}

fn parse_payload(shape: PayloadShape, payload: &str) -> Option<Value> {
    match shape {
        PayloadShape::Text => Some(Value::Text(payload.to_string())),
        PayloadShape::Integer => payload.parse().ok().map(Value::Integer),
        PayloadShape::Float => payload.parse().ok().map(Value::Float),
        PayloadShape::BoolDigit => parse_flag(payload).map(Value::Bool),
        PayloadShape::ClockTime => {
            // Device RTC readback, e.g. "20:29.06".
            NaiveTime::parse_from_str(payload, "%H:%M.%S")
                .ok()
                .map(Value::ClockTime)
        }
        PayloadShape::PercentTriplet => {
            // Three percentages, e.g. "100.030.095"; wire order down, bio, up.
            let mut parts = payload.split('.');
            let down = parts.next()?.parse().ok()?;
            let bio = parts.next()?.parse().ok()?;
            let up = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Some(Value::Intensity { down, bio, up })
        }
        PayloadShape::FlagSeconds => {
            // e.g. "1:120" — enabled plus timeout seconds.
            let (flag, seconds) = payload.split_once(':')?;
            Some(Value::Presence {
                enabled: parse_flag(flag)?,
                timeout_secs: seconds.parse().ok()?,
            })
        }
        PayloadShape::DawnDusk => {
            // e.g. "06:48,21:13" — local dawn, local dusk.
            let (dawn, dusk) = payload.split_once(',')?;
            Some(Value::SunTimes {
                dawn: NaiveTime::parse_from_str(dawn, "%H:%M").ok()?,
                dusk: NaiveTime::parse_from_str(dusk, "%H:%M").ok()?,
            })
        }
        PayloadShape::ButtonBits => {
            let bits = payload.as_bytes();
            if bits.len() < 3 || bits[..3].iter().any(|b| !matches!(b, b'0' | b'1')) {
                return None;
            }
            Some(Value::Buttons {
                up: bits[0] == b'1',
                bio: bits[1] == b'1',
                down: bits[2] == b'1',
            })
        }
        PayloadShape::IndexedInteger => {
            // One channel digit (0..=8) followed by the raw level.
            let index: u8 = payload.get(..1)?.parse().ok()?;
            if index > 8 {
                return None;
            }
            Some(Value::Channel {
                index,
                level: payload.get(1..)?.parse().ok()?,
            })
        }
        PayloadShape::Activity => {
            // Step digit, separator, bio intensity, e.g. "4:080".
            // Steps 1..=3 drive the coffee light, 4..=6 the relax light.
            let step: u8 = payload.get(..1)?.parse().ok()?;
            let intensity = payload.get(2..)?.parse().ok()?;
            let (coffee_step, relax_step) = match step {
                1..=3 => (step, 0),
                4..=6 => (0, step - 3),
                _ => (0, 0),
            };
            Some(Value::Activity {
                coffee_step,
                relax_step,
                intensity,
            })
        }
        PayloadShape::PresetData => {
            // e.g. "10100060": marker, slot digit, intensity, temperature.
            let bytes = payload.as_bytes();
            if bytes.len() < 8 {
                return None;
            }
            let slot = Slot::from_index(payload.get(1..2)?.parse().ok()?)?;
            Some(Value::Preset {
                slot,
                intensity: payload.get(2..5)?.parse().ok()?,
                temperature: payload.get(5..8)?.parse().ok()?,
            })
        }
        PayloadShape::SkipFirstFloat => {
            // Signed coordinate with a leading sign/marker byte.
            payload.get(1..)?.parse().ok().map(Value::Float)
        }
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::registry::codes;

    fn reg() -> CommandRegistry {
        CommandRegistry::new()
    }

    fn decode_ok(frame: &[u8]) -> DecodedValue {
        decode(&reg(), frame).expect("frame should decode")
    }

    #[test]
    fn test_empty_frame() {
        assert_eq!(decode(&reg(), b""), Err(DecodeError::Empty));
    }

    #[test]
    fn test_missing_sentinel() {
        assert_eq!(
            decode(&reg(), b"@V1.2.3"),
            Err(DecodeError::NotAResponse { leading: b'@' })
        );
    }

    #[test]
    fn test_unknown_mnemonic() {
        match decode(&reg(), b"$zz99") {
            Err(DecodeError::UnknownMnemonic(raw)) => assert_eq!(raw, "zz99"),
            other => panic!("expected UnknownMnemonic, got {other:?}"),
        }
    }

    #[test]
    fn test_identity_strings() {
        let v = decode_ok(b"$V2.4.1");
        assert_eq!(v.mnemonic, codes::GET_VERSION);
        assert_eq!(v.as_text(), Some("2.4.1"));

        let v = decode_ok(b"$gNStudio lamp");
        assert_eq!(v.mnemonic, codes::GET_NAME);
        assert_eq!(v.as_text(), Some("Studio lamp"));

        let v = decode_ok(b"$uHL1-00412");
        assert_eq!(v.mnemonic, codes::GET_SERIAL_NUMBER);

        let v = decode_ok(b"$qf1.0.9");
        assert_eq!(v.mnemonic, codes::GET_PCB_VERSION);
    }

    #[test]
    fn test_longer_mnemonic_wins_over_prefix() {
        // "g" alone is the CO2 notification; "$gN..." must never parse as it.
        let v = decode_ok(b"$gN12");
        assert_eq!(v.mnemonic, codes::GET_NAME);
        assert_eq!(v.as_text(), Some("12"));

        let v = decode_ok(b"$g030.46");
        assert_eq!(v.mnemonic, codes::CO2);
        assert_eq!(v.as_f64(), Some(30.46));
    }

    #[test]
    fn test_intensity_triplet() {
        let v = decode_ok(b"$I100.030.095");
        assert_eq!(
            v.value,
            Value::Intensity {
                down: 100,
                bio: 30,
                up: 95
            }
        );
    }

    #[test]
    fn test_intensity_triplet_malformed() {
        assert!(matches!(
            decode(&reg(), b"$I100.030"),
            Err(DecodeError::MalformedPayload { mnemonic: "I", .. })
        ));
        assert!(matches!(
            decode(&reg(), b"$I100.030.095.001"),
            Err(DecodeError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_presence_pair() {
        let v = decode_ok(b"$o1:120");
        assert_eq!(
            v.value,
            Value::Presence {
                enabled: true,
                timeout_secs: 120
            }
        );

        let v = decode_ok(b"$O0:45");
        assert_eq!(
            v.value,
            Value::Presence {
                enabled: false,
                timeout_secs: 45
            }
        );

        assert!(decode(&reg(), b"$o2:120").is_err());
        assert!(decode(&reg(), b"$o1;120").is_err());
    }

    #[test]
    fn test_clock_time() {
        let v = decode_ok(b"$H20:29.06");
        assert_eq!(
            v.value,
            Value::ClockTime(NaiveTime::from_hms_opt(20, 29, 6).unwrap())
        );

        // sun-cycle readback uses the same layout
        let v = decode_ok(b"$Y07:15.59");
        assert_eq!(
            v.value,
            Value::ClockTime(NaiveTime::from_hms_opt(7, 15, 59).unwrap())
        );
    }

    #[test]
    fn test_dawn_dusk_pair() {
        let v = decode_ok(b"$X06:48,21:13");
        assert_eq!(
            v.value,
            Value::SunTimes {
                dawn: NaiveTime::from_hms_opt(6, 48, 0).unwrap(),
                dusk: NaiveTime::from_hms_opt(21, 13, 0).unwrap(),
            }
        );
        assert!(decode(&reg(), b"$X06:48").is_err());
    }

    #[test]
    fn test_button_bits() {
        let v = decode_ok(b"$s1011");
        assert_eq!(
            v.value,
            Value::Buttons {
                up: true,
                bio: false,
                down: true
            }
        );
        assert!(decode(&reg(), b"$s10").is_err());
        assert!(decode(&reg(), b"$s1x1").is_err());
    }

    #[test]
    fn test_channel_readback() {
        let v = decode_ok(b"$C3042");
        assert_eq!(
            v.value,
            Value::Channel {
                index: 3,
                level: 42
            }
        );
    }

    #[test]
    fn test_channel_index_out_of_range_is_nonfatal() {
        assert!(matches!(
            decode(&reg(), b"$C9042"),
            Err(DecodeError::MalformedPayload { mnemonic: "C", .. })
        ));
    }

    #[test]
    fn test_metrics_readings() {
        assert_eq!(decode_ok(b"$mgg030.46").as_f64(), Some(30.46));
        assert_eq!(decode_ok(b"$mga2").as_i64(), Some(2));
        assert_eq!(decode_ok(b"$mgt021.50").as_f64(), Some(21.5));
        assert_eq!(decode_ok(b"$mgp097796").as_i64(), Some(97796));
        assert_eq!(decode_ok(b"$mgh040.00").as_f64(), Some(40.0));
        assert_eq!(decode_ok(b"$mgs1709251200").as_i64(), Some(1709251200));
        assert_eq!(decode_ok(b"$qg030.46").as_f64(), Some(30.46));
        assert_eq!(decode_ok(b"$qL150.25").as_f64(), Some(150.25));
    }

    #[test]
    fn test_coordinates_skip_leading_byte() {
        assert_eq!(decode_ok(b"$b+52.52").as_f64(), Some(52.52));
        assert_eq!(decode_ok(b"$l+13.40").as_f64(), Some(13.40));
    }

    #[test]
    fn test_manual_mode_flag() {
        assert_eq!(decode_ok(b"$e1").as_bool(), Some(true));
        assert_eq!(decode_ok(b"$e0").as_bool(), Some(false));
        assert!(decode(&reg(), b"$e2").is_err());
    }

    #[test]
    fn test_activity_steps() {
        let v = decode_ok(b"$W2:080");
        assert_eq!(
            v.value,
            Value::Activity {
                coffee_step: 2,
                relax_step: 0,
                intensity: 80
            }
        );

        let v = decode_ok(b"$W5:060");
        assert_eq!(
            v.value,
            Value::Activity {
                coffee_step: 0,
                relax_step: 2,
                intensity: 60
            }
        );

        let v = decode_ok(b"$W0:000");
        assert_eq!(
            v.value,
            Value::Activity {
                coffee_step: 0,
                relax_step: 0,
                intensity: 0
            }
        );
    }

    #[test]
    fn test_preset_data() {
        let v = decode_ok(b"$^S10100060");
        assert_eq!(
            v.value,
            Value::Preset {
                slot: Slot::Bio,
                intensity: 100,
                temperature: 60
            }
        );

        let v = decode_ok(b"$^S10099001");
        assert_eq!(
            v.value,
            Value::Preset {
                slot: Slot::Up,
                intensity: 99,
                temperature: 1
            }
        );
    }

    #[test]
    fn test_preset_data_bad_slot() {
        assert!(matches!(
            decode(&reg(), b"$^S13100060"),
            Err(DecodeError::MalformedPayload { mnemonic: "^S", .. })
        ));
        assert!(decode(&reg(), b"$^S1010").is_err());
    }

    #[test]
    fn test_boundary_widths_roundtrip() {
        let v = decode_ok(b"$^S10000000");
        assert_eq!(
            v.value,
            Value::Preset {
                slot: Slot::Up,
                intensity: 0,
                temperature: 0
            }
        );
        let v = decode_ok(b"$^S12999999");
        assert_eq!(
            v.value,
            Value::Preset {
                slot: Slot::Down,
                intensity: 999,
                temperature: 999
            }
        );
    }

    #[test]
    fn test_utc_offset_integer() {
        assert_eq!(decode_ok(b"$d2").as_i64(), Some(2));
        assert_eq!(decode_ok(b"$d22").as_i64(), Some(22));
    }

    #[test]
    fn test_non_utf8_payload_is_malformed() {
        assert!(matches!(
            decode(&reg(), b"$V\xff\xfe"),
            Err(DecodeError::MalformedPayload { mnemonic: "V", .. })
        ));
    }
}
