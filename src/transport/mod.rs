//! Transport boundary.
//!
//! The engine never talks to a radio directly: it consumes a connected
//! byte-stream duplex — one write path, one notification stream — behind
//! the [`Transport`] trait. Frame segmentation is the transport's job;
//! every inbound [`Bytes`] is one complete frame. Chunking outgoing writes
//! to the radio MTU, if needed, also belongs below this boundary.

pub mod loopback;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Stream of inbound notification frames, already segmented.
pub type InboundFrames = mpsc::UnboundedReceiver<Bytes>;

/// A connected byte-stream duplex to one device.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Write one outgoing frame. The transport accepts arbitrary-length
    /// ASCII payloads; only one write is ever in flight.
    async fn write(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Subscribe to inbound notifications. Frames arrive in delivery
    /// order, one per channel message.
    fn subscribe(&self) -> Result<InboundFrames, TransportError>;

    /// Tear the connection down.
    async fn disconnect(&self) -> Result<(), TransportError>;
}
