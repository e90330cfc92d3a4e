//! # helion-ble
//!
//! Protocol engine for the Helion One BLE ambient light.
//!
//! The device speaks a line-oriented ASCII command language over a single
//! write/notify characteristic pair: requests are `@` + mnemonic +
//! fixed-width arguments, responses are `$` + mnemonic + payload. This
//! crate provides the codec, the longest-match response dispatch and the
//! session layer that multiplexes logical queries over the one half-duplex
//! channel.
//!
//! ## Architecture
//!
//! - **protocol**: command registry, encoder, decoder
//! - **sender**: outbound FIFO drained one write at a time
//! - **session**: bring-up handshake, identity, callback fan-out, run loop
//! - **transport**: the boundary to the BLE stack (bring your own link)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use helion_ble::{encode, Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> helion_ble::Result<()> {
//!     let transport = Arc::new(my_ble_link());
//!     let session = Session::connect(transport, SessionConfig::default()).await?;
//!
//!     session.register_callback("qt", |value| {
//!         println!("temperature: {:?}", value.value);
//!     });
//!     session.enqueue(encode::req_temperature());
//!
//!     session.run().await
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod sender;
pub mod session;
pub mod transport;

pub use error::{DecodeError, EncodeError, Result, SessionError, TransportError};
pub use protocol::encode;
pub use protocol::{codes, CommandRegistry, DecodedValue, Slot, Value, ValueKind};
pub use session::{Identity, Session, SessionConfig, SessionState};
pub use transport::Transport;
