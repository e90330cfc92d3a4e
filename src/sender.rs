//! Dedicated sender task draining the outbound queue.
//!
//! The transport accepts one write at a time, so every producer of
//! commands goes through a single FIFO:
//!
//! ```text
//! bring-up  ─┐
//! poller    ─┼─► mpsc (unbounded) ─► drain task ─► transport.write
//! callers   ─┘
//! ```
//!
//! `enqueue` is non-blocking and never rejects — producers are trusted
//! internal code, so the queue is deliberately unbounded. The drain task
//! ends on an internal stop marker (never written to the wire) or on a
//! write error, which the session treats as connection-lost.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::transport::Transport;

/// One queue entry.
enum Outbound {
    /// A frame to put on the wire.
    Frame(Bytes),
    /// Internal stop marker; ends the drain loop cleanly.
    Stop,
}

/// Handle for queueing outbound frames.
///
/// Cheaply cloneable; order is FIFO per the underlying channel, which is
/// the only ordering guarantee the engine makes.
#[derive(Clone)]
pub struct SenderHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SenderHandle {
    /// Append one frame to the outbound queue.
    ///
    /// A no-op once the drain task has stopped; frames queued after
    /// shutdown are dropped, matching a link that is already gone.
    pub fn enqueue(&self, frame: Bytes) {
        let _ = self.tx.send(Outbound::Frame(frame));
    }

    /// Ask the drain task to stop after the frames queued so far.
    pub fn stop(&self) {
        let _ = self.tx.send(Outbound::Stop);
    }
}

/// Spawn the drain task for `transport`.
///
/// Returns the queue handle and the task handle; the task resolves with
/// `Ok(())` after a stop marker (or when every `SenderHandle` is dropped)
/// and with the write error if the transport fails.
pub fn spawn_sender(
    transport: Arc<dyn Transport>,
) -> (SenderHandle, JoinHandle<Result<(), TransportError>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(drain_loop(rx, transport));
    (SenderHandle { tx }, task)
}

async fn drain_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    transport: Arc<dyn Transport>,
) -> Result<(), TransportError> {
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Stop => {
                tracing::debug!("sender received stop marker");
                return Ok(());
            }
            Outbound::Frame(frame) => {
                tracing::trace!(frame = %String::from_utf8_lossy(&frame), "sending");
                transport.write(&frame).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::loopback::LoopbackTransport;

    #[tokio::test]
    async fn test_frames_drain_in_fifo_order() {
        let (transport, mut device) = LoopbackTransport::pair();
        let (sender, _task) = spawn_sender(Arc::new(transport));

        sender.enqueue(Bytes::from_static(b"@V"));
        sender.enqueue(Bytes::from_static(b"@gN"));
        sender.enqueue(Bytes::from_static(b"@u"));

        assert_eq!(&device.next_write().await.unwrap()[..], b"@V");
        assert_eq!(&device.next_write().await.unwrap()[..], b"@gN");
        assert_eq!(&device.next_write().await.unwrap()[..], b"@u");
    }

    #[tokio::test]
    async fn test_fifo_under_concurrent_producers() {
        let (transport, mut device) = LoopbackTransport::pair();
        let (sender, _task) = spawn_sender(Arc::new(transport));

        let mut join = Vec::new();
        for producer in 0..4u8 {
            let sender = sender.clone();
            join.push(tokio::spawn(async move {
                for i in 0..25u8 {
                    let frame = format!("@c{}", producer as u32 * 100 + i as u32);
                    sender.enqueue(Bytes::from(frame.into_bytes()));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in join {
            handle.await.unwrap();
        }

        // per-producer order must survive the merge
        let mut last_seen = [None::<u32>; 4];
        for _ in 0..100 {
            let frame = device.next_write().await.unwrap();
            let id: u32 = std::str::from_utf8(&frame[2..]).unwrap().parse().unwrap();
            let producer = (id / 100) as usize;
            if let Some(prev) = last_seen[producer] {
                assert!(id > prev, "producer {producer} reordered: {prev} then {id}");
            }
            last_seen[producer] = Some(id);
        }
    }

    #[tokio::test]
    async fn test_stop_marker_ends_loop_without_writing() {
        let (transport, mut device) = LoopbackTransport::pair();
        let (sender, task) = spawn_sender(Arc::new(transport));

        sender.enqueue(Bytes::from_static(b"@V"));
        sender.stop();
        sender.enqueue(Bytes::from_static(b"@u"));

        assert!(task.await.unwrap().is_ok());
        assert_eq!(&device.next_write().await.unwrap()[..], b"@V");
        // the stop marker itself never hits the wire, nor does anything after it
        assert!(device.try_next_write().is_none());
    }

    #[tokio::test]
    async fn test_write_error_terminates_with_error() {
        let (transport, _device) = LoopbackTransport::pair();
        let transport = Arc::new(transport);
        transport.disconnect().await.unwrap();

        let (sender, task) = spawn_sender(transport);
        sender.enqueue(Bytes::from_static(b"@V"));

        assert!(matches!(
            task.await.unwrap(),
            Err(TransportError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_dropping_all_handles_ends_loop_cleanly() {
        let (transport, _device) = LoopbackTransport::pair();
        let (sender, task) = spawn_sender(Arc::new(transport));

        drop(sender);
        assert!(task.await.unwrap().is_ok());
    }
}
