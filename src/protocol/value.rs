//! Typed decoded values.
//!
//! A [`DecodedValue`] is the result of classifying and parsing one inbound
//! frame: the mnemonic it answered plus a typed payload. Values are
//! immutable once produced and owned by whichever callback consumes them.

use chrono::NaiveTime;

/// One of the three light slots of the lamp head.
///
/// The wire protocol indexes slots `0`, `1`, `2`; the device documentation
/// names them "up", "bio" and "down".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Indirect uplight (index 0).
    Up,
    /// Biologically-effective mid light (index 1).
    Bio,
    /// Direct downlight (index 2).
    Down,
}

impl Slot {
    /// All slots in wire-index order.
    pub const ALL: [Slot; 3] = [Slot::Up, Slot::Bio, Slot::Down];

    /// Map a wire index to a slot. Returns `None` for indexes outside 0..=2.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Slot::Up),
            1 => Some(Slot::Bio),
            2 => Some(Slot::Down),
            _ => None,
        }
    }

    /// The wire index of this slot.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Slot::Up => 0,
            Slot::Bio => 1,
            Slot::Down => 2,
        }
    }

    /// Human-readable slot name.
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Slot::Up => "up",
            Slot::Bio => "bio",
            Slot::Down => "down",
        }
    }
}

/// Broad classification of a decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free-form text (names, version strings).
    Text,
    /// Whole number.
    Integer,
    /// Floating-point reading.
    Float,
    /// On/off flag.
    Boolean,
    /// Wall-clock time of day.
    Timestamp,
    /// Multi-field payload.
    Composite,
}

/// Typed payload of one decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text payload.
    Text(String),
    /// Integer payload.
    Integer(i64),
    /// Float payload.
    Float(f64),
    /// Boolean payload (`0`/`1` on the wire).
    Bool(bool),
    /// Time-of-day payload (device RTC and sun-cycle readbacks).
    ClockTime(NaiveTime),
    /// Current slot intensities in percent. Wire order is down, bio, up.
    Intensity {
        /// Downlight intensity, percent.
        down: u8,
        /// Bio light intensity, percent.
        bio: u8,
        /// Uplight intensity, percent.
        up: u8,
    },
    /// Hardware button states.
    Buttons {
        /// Up button lit.
        up: bool,
        /// Bio button lit.
        bio: bool,
        /// Down button lit.
        down: bool,
    },
    /// Presence detection configuration.
    Presence {
        /// Detection enabled.
        enabled: bool,
        /// Auto-off timeout in seconds.
        timeout_secs: u32,
    },
    /// Local sun dawn and dusk times.
    SunTimes {
        /// Dawn, local time.
        dawn: NaiveTime,
        /// Dusk, local time.
        dusk: NaiveTime,
    },
    /// Raw reading of one LED channel.
    Channel {
        /// Channel index (0..=8).
        index: u8,
        /// Raw channel level.
        level: i64,
    },
    /// Stored preset data for one slot.
    Preset {
        /// Which slot the data belongs to.
        slot: Slot,
        /// Intensity, percent.
        intensity: u16,
        /// Color temperature step.
        temperature: u16,
    },
    /// Coffee/relax activity state.
    Activity {
        /// Coffee light step (0 = off, 1..=3).
        coffee_step: u8,
        /// Relax light step (0 = off, 1..=3).
        relax_step: u8,
        /// Bio light intensity, percent.
        intensity: u16,
    },
}

impl Value {
    /// The broad kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Boolean,
            Value::ClockTime(_) => ValueKind::Timestamp,
            _ => ValueKind::Composite,
        }
    }
}

/// One decoded response: the mnemonic it belongs to plus its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedValue {
    /// Registered mnemonic this response matched (longest match).
    pub mnemonic: &'static str,
    /// Parsed payload.
    pub value: Value,
}

impl DecodedValue {
    /// Create a decoded value.
    pub fn new(mnemonic: &'static str, value: Value) -> Self {
        Self { mnemonic, value }
    }

    /// The broad kind of the payload.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Payload as text, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Payload as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            Value::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Payload as a float, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self.value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Payload as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}
