//! Command registry: the static table of every known mnemonic.
//!
//! The registry is the single source of truth both the encoder and the
//! decoder consult. Each entry carries the wire code, the direction the
//! code travels, and the payload shape of its response (if the device
//! answers it). Decoding resolves a candidate against the table via
//! longest-prefix matching: some codes are strict prefixes of others
//! (`g`/`gN`, `^`-family), so length buckets are scanned from longest to
//! shortest, each exactly once.

use std::collections::HashMap;

/// Leading byte of every outgoing request frame.
pub const REQUEST_SENTINEL: u8 = b'@';

/// Leading byte of every incoming response frame.
pub const RESPONSE_SENTINEL: u8 = b'$';

/// Wire codes of the command language.
///
/// Codes are case-sensitive ASCII, one to three characters. By rough
/// convention lowercase asks, uppercase sets, but the device is not
/// consistent about it.
pub mod codes {
    /// Firmware version readback.
    pub const GET_VERSION: &str = "V";
    /// Device name readback.
    pub const GET_NAME: &str = "gN";
    /// Serial number readback.
    pub const GET_SERIAL_NUMBER: &str = "u";
    /// Main PCB firmware version readback.
    pub const GET_PCB_VERSION: &str = "qf";

    /// Ask for the device RTC time.
    pub const GET_UTC_TIME: &str = "h";
    /// Set the device RTC time; the device answers with its RTC readback.
    pub const SET_UTC_TIME: &str = "H";
    /// UTC offset readback.
    pub const GET_UTC_OFFSET: &str = "d";
    /// Set the UTC offset (two digits, negatives wrapped by +24).
    pub const SET_UTC_OFFSET: &str = "D";
    /// Set the sun-cycle reference time (local wall clock).
    pub const SET_SUN_CYCLE_TIME: &str = "T";
    /// Sun-cycle time readback.
    pub const GET_SUN_CYCLE_TIME: &str = "Y";
    /// Sun dawn/dusk readback.
    pub const GET_SUN_TIMES: &str = "X";

    /// CO2 reading (request form).
    pub const GET_CO2: &str = "qg";
    /// CO2 reading (metrics-batch form).
    pub const METRICS_CO2: &str = "mgg";
    /// CO2 sensor accuracy (request form).
    pub const GET_CO2_ACCURACY: &str = "qa";
    /// CO2 sensor accuracy (metrics-batch form).
    pub const METRICS_CO2_ACCURACY: &str = "mga";
    /// Temperature (request form).
    pub const GET_TEMPERATURE: &str = "qt";
    /// Temperature (metrics-batch form).
    pub const METRICS_TEMPERATURE: &str = "mgt";
    /// Air pressure (request form).
    pub const GET_PRESSURE: &str = "qp";
    /// Air pressure (metrics-batch form).
    pub const METRICS_PRESSURE: &str = "mgp";
    /// Relative humidity (request form).
    pub const GET_HUMIDITY: &str = "qh";
    /// Relative humidity (metrics-batch form).
    pub const METRICS_HUMIDITY: &str = "mgh";
    /// Timestamp of the current metrics datapoint.
    pub const METRICS_TIMESTAMP: &str = "mgs";
    /// Ambient light sensor reading.
    pub const GET_LIGHT_SENSOR: &str = "qL";
    /// Air-quality LED state.
    pub const GET_AIR_QUALITY_LED: &str = "gA";
    /// Spontaneous CO2 notification.
    pub const CO2: &str = "g";
    /// Spontaneous CO2 accuracy notification.
    pub const CO2_ACCURACY: &str = "a";

    /// Presence detection readback.
    pub const GET_PRESENCE: &str = "o";
    /// Presence detection set; answered like the readback.
    pub const SET_PRESENCE: &str = "O";
    /// Coffee/relax activity readback.
    pub const GET_ACTIVITY: &str = "W";
    /// Latitude readback.
    pub const GET_LATITUDE: &str = "b";
    /// Longitude readback.
    pub const GET_LONGITUDE: &str = "l";

    /// Spontaneous slot intensity notification.
    pub const INTENSITY: &str = "I";
    /// Hardware button states readback.
    pub const GET_BUTTON_STATES: &str = "s";
    /// Single LED channel readback request; answered under [`MANUAL_MODE`].
    pub const GET_CHANNEL: &str = "c";
    /// Force manual mode on; also the code channel readbacks arrive under.
    pub const MANUAL_MODE: &str = "C";
    /// Manual mode state readback.
    pub const GET_MANUAL_MODE: &str = "e";
    /// Set one slot's manual intensity and temperature.
    pub const SET_SLOT_MANUAL: &str = "^D";
    /// Store preset data for one slot; also the preset readback answer code.
    pub const SET_PRESET_DATA: &str = "^S";
    /// Ask for stored preset data.
    pub const GET_PRESET_DATA: &str = "^s";
    /// Store a preset name.
    pub const SET_PRESET_NAME: &str = "^N";
    /// Ask for a stored preset name.
    pub const GET_PRESET_NAME: &str = "^n";
    /// Simulate a press on one of the hardware buttons.
    pub const SIMULATE_BUTTON: &str = "K";
}

/// Which way a code travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the host; the device may answer it.
    Request,
    /// Pushed by the device on its own.
    Notification,
}

/// Declared parse rule for a response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Remainder taken verbatim.
    Text,
    /// Whole remainder as a base-10 integer.
    Integer,
    /// Whole remainder as a float.
    Float,
    /// Single `0`/`1` digit.
    BoolDigit,
    /// `HH:MM.SS` device clock readback.
    ClockTime,
    /// `NNN.NNN.NNN` percent triplet (down, bio, up).
    PercentTriplet,
    /// `flag:seconds` pair.
    FlagSeconds,
    /// `HH:MM,HH:MM` dawn/dusk pair.
    DawnDusk,
    /// Run of `0`/`1` digits, first three used (up, bio, down).
    ButtonBits,
    /// One channel digit followed by an integer level.
    IndexedInteger,
    /// Activity step digit, separator, intensity integer.
    Activity,
    /// Marker, slot digit, 3-digit intensity, 3-digit temperature.
    PresetData,
    /// Float with one leading byte to skip (signed coordinate).
    SkipFirstFloat,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Wire code (1..=3 printable ASCII characters).
    pub code: &'static str,
    /// What the command does.
    pub name: &'static str,
    /// Which way the code travels.
    pub direction: Direction,
    /// How to parse a response carrying this code, if the device sends one.
    pub response: Option<PayloadShape>,
}

use Direction::{Notification, Request};
use PayloadShape::*;

/// The full command table. Within one length no two codes collide;
/// cross-length prefix collisions are resolved by longest-match-first.
static COMMANDS: &[CommandSpec] = &[
    // identity
    spec(codes::GET_VERSION, "firmware version", Request, Some(Text)),
    spec(codes::GET_NAME, "device name", Request, Some(Text)),
    spec(codes::GET_SERIAL_NUMBER, "serial number", Request, Some(Text)),
    spec(codes::GET_PCB_VERSION, "main PCB version", Request, Some(Text)),
    // clock
    spec(codes::GET_UTC_TIME, "get RTC time", Request, None),
    spec(codes::SET_UTC_TIME, "set RTC time", Request, Some(ClockTime)),
    spec(codes::GET_UTC_OFFSET, "get UTC offset", Request, Some(Integer)),
    spec(codes::SET_UTC_OFFSET, "set UTC offset", Request, None),
    spec(codes::SET_SUN_CYCLE_TIME, "set sun-cycle time", Request, Some(ClockTime)),
    spec(codes::GET_SUN_CYCLE_TIME, "get sun-cycle time", Request, Some(ClockTime)),
    spec(codes::GET_SUN_TIMES, "sun dawn/dusk", Request, Some(DawnDusk)),
    // environment sensors
    spec(codes::GET_CO2, "CO2", Request, Some(Float)),
    spec(codes::METRICS_CO2, "CO2 (metrics)", Request, Some(Float)),
    spec(codes::GET_CO2_ACCURACY, "CO2 accuracy", Request, Some(Integer)),
    spec(codes::METRICS_CO2_ACCURACY, "CO2 accuracy (metrics)", Request, Some(Integer)),
    spec(codes::GET_TEMPERATURE, "temperature", Request, Some(Float)),
    spec(codes::METRICS_TEMPERATURE, "temperature (metrics)", Request, Some(Float)),
    spec(codes::GET_PRESSURE, "pressure", Request, Some(Integer)),
    spec(codes::METRICS_PRESSURE, "pressure (metrics)", Request, Some(Integer)),
    spec(codes::GET_HUMIDITY, "humidity", Request, Some(Float)),
    spec(codes::METRICS_HUMIDITY, "humidity (metrics)", Request, Some(Float)),
    spec(codes::METRICS_TIMESTAMP, "metrics timestamp", Request, Some(Integer)),
    spec(codes::GET_LIGHT_SENSOR, "light sensor", Request, Some(Float)),
    spec(codes::GET_AIR_QUALITY_LED, "air-quality LED", Request, Some(Integer)),
    spec(codes::CO2, "CO2 (notification)", Notification, Some(Float)),
    spec(codes::CO2_ACCURACY, "CO2 accuracy (notification)", Notification, Some(Integer)),
    // presence & location
    spec(codes::GET_PRESENCE, "get presence", Request, Some(FlagSeconds)),
    spec(codes::SET_PRESENCE, "set presence", Request, Some(FlagSeconds)),
    spec(codes::GET_ACTIVITY, "coffee/relax activity", Request, Some(Activity)),
    spec(codes::GET_LATITUDE, "latitude", Request, Some(SkipFirstFloat)),
    spec(codes::GET_LONGITUDE, "longitude", Request, Some(SkipFirstFloat)),
    // light state
    spec(codes::INTENSITY, "slot intensities", Notification, Some(PercentTriplet)),
    spec(codes::GET_BUTTON_STATES, "button states", Request, Some(ButtonBits)),
    spec(codes::GET_CHANNEL, "channel readback", Request, None),
    spec(codes::MANUAL_MODE, "manual mode on", Request, Some(IndexedInteger)),
    spec(codes::GET_MANUAL_MODE, "manual mode state", Request, Some(BoolDigit)),
    spec(codes::SET_SLOT_MANUAL, "set slot manual", Request, None),
    spec(codes::SET_PRESET_DATA, "set preset data", Request, Some(PresetData)),
    spec(codes::GET_PRESET_DATA, "get preset data", Request, None),
    spec(codes::SET_PRESET_NAME, "set preset name", Request, None),
    spec(codes::GET_PRESET_NAME, "get preset name", Request, None),
    spec(codes::SIMULATE_BUTTON, "simulate button", Request, None),
];

const fn spec(
    code: &'static str,
    name: &'static str,
    direction: Direction,
    response: Option<PayloadShape>,
) -> CommandSpec {
    CommandSpec {
        code,
        name,
        direction,
        response,
    }
}

/// The command table indexed for lookup.
///
/// Built once per session. `by_code` answers "what is this code";
/// `decode_lengths` holds every mnemonic length that carries a response
/// shape, longest first, so [`CommandRegistry::longest_match`] tries each
/// length bucket exactly once in descending order.
pub struct CommandRegistry {
    by_code: HashMap<&'static str, &'static CommandSpec>,
    decodable: HashMap<&'static str, &'static CommandSpec>,
    decode_lengths: Vec<usize>,
}

impl CommandRegistry {
    /// Build the registry from the static command table.
    pub fn new() -> Self {
        let mut by_code = HashMap::new();
        let mut decodable = HashMap::new();
        let mut decode_lengths: Vec<usize> = Vec::new();

        for cmd in COMMANDS {
            let prev = by_code.insert(cmd.code, cmd);
            debug_assert!(prev.is_none(), "duplicate code {:?}", cmd.code);
            if cmd.response.is_some() {
                decodable.insert(cmd.code, cmd);
                if !decode_lengths.contains(&cmd.code.len()) {
                    decode_lengths.push(cmd.code.len());
                }
            }
        }
        decode_lengths.sort_unstable_by(|a, b| b.cmp(a));

        Self {
            by_code,
            decodable,
            decode_lengths,
        }
    }

    /// Look up a code exactly.
    pub fn get(&self, code: &str) -> Option<&'static CommandSpec> {
        self.by_code.get(code).copied()
    }

    /// Resolve the leading bytes of a response body (sentinel already
    /// stripped) to the longest registered response-bearing mnemonic.
    ///
    /// Deterministic and total: every length bucket is tried exactly once,
    /// longest first. Returns `None` if no mnemonic is a prefix of
    /// `candidate`.
    pub fn longest_match(&self, candidate: &[u8]) -> Option<&'static CommandSpec> {
        for &len in &self.decode_lengths {
            if candidate.len() < len {
                continue;
            }
            let Ok(prefix) = std::str::from_utf8(&candidate[..len]) else {
                continue;
            };
            if let Some(&cmd) = self.decodable.get(prefix) {
                return Some(cmd);
            }
        }
        None
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the registry is empty (it never is).
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
