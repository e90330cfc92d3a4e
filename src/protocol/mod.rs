//! Wire protocol: command registry, encoder and decoder.
//!
//! The command language is line-oriented ASCII. Every request starts with
//! `@`, every response with `$`, followed by a short mnemonic and an
//! optional positional fixed-width payload. The registry is the single
//! source of truth for the command space; [`encode`] renders requests from
//! it and [`decode`] resolves responses against it via longest-prefix
//! matching.

pub mod decode;
pub mod encode;
pub mod registry;
pub mod value;

pub use decode::decode;
pub use registry::{codes, CommandRegistry, CommandSpec, Direction, PayloadShape};
pub use registry::{REQUEST_SENTINEL, RESPONSE_SENTINEL};
pub use value::{DecodedValue, Slot, Value, ValueKind};
