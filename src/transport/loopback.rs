//! In-memory loopback transport.
//!
//! Stands in for a real BLE link in tests and demos: one side implements
//! [`Transport`] for the engine, the other side is a [`DeviceHandle`] that
//! plays the device — it observes every write and injects notification
//! frames. Dropping the handle (or calling [`DeviceHandle::drop_link`])
//! simulates the device going away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::{InboundFrames, Transport};
use crate::error::TransportError;

/// Engine side of the loopback pair.
pub struct LoopbackTransport {
    connected: Arc<AtomicBool>,
    writes_tx: mpsc::UnboundedSender<Bytes>,
    inbound_rx: Mutex<Option<InboundFrames>>,
}

/// Device side of the loopback pair.
pub struct DeviceHandle {
    connected: Arc<AtomicBool>,
    writes_rx: mpsc::UnboundedReceiver<Bytes>,
    notify_tx: mpsc::UnboundedSender<Bytes>,
}

impl LoopbackTransport {
    /// Create a connected transport/device pair.
    pub fn pair() -> (Self, DeviceHandle) {
        let (writes_tx, writes_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let transport = Self {
            connected: connected.clone(),
            writes_tx,
            inbound_rx: Mutex::new(Some(notify_rx)),
        };
        let device = DeviceHandle {
            connected,
            writes_rx,
            notify_tx,
        };
        (transport, device)
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(TransportError::Disconnected);
        }
        self.writes_tx
            .send(Bytes::copy_from_slice(frame))
            .map_err(|_| TransportError::Disconnected)
    }

    fn subscribe(&self) -> Result<InboundFrames, TransportError> {
        self.inbound_rx
            .lock()
            .expect("loopback subscribe lock")
            .take()
            .ok_or(TransportError::NotifySetupFailed)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl DeviceHandle {
    /// Wait for the next frame the engine wrote.
    pub async fn next_write(&mut self) -> Option<Bytes> {
        self.writes_rx.recv().await
    }

    /// Take the next written frame if one is already queued.
    pub fn try_next_write(&mut self) -> Option<Bytes> {
        self.writes_rx.try_recv().ok()
    }

    /// Push one notification frame to the engine.
    ///
    /// Silently dropped once the link is down, like a radio would.
    pub fn notify(&self, frame: &[u8]) {
        if !self.connected.load(Ordering::Acquire) {
            return;
        }
        let _ = self.notify_tx.send(Bytes::copy_from_slice(frame));
    }

    /// Simulate the device dropping the connection.
    pub fn drop_link(self) {
        self.connected.store(false, Ordering::Release);
        // dropping self closes the notification stream
    }
}
