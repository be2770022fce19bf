//! Client-side transport session.
//!
//! Owns one reconnecting duplex channel for live frame delivery plus
//! the one-shot store/retrieve exchanges. The channel task connects,
//! pumps queued frames into a [`Framed`] sink, and on any failure
//! drops to `Closed`, waits out a fixed backoff, and tries again —
//! indefinitely. Frames queued while the link is down are discarded;
//! nothing is replayed across reconnects.
//!
//! Every operation publishes a short human-readable status line on a
//! `watch` channel for UI feedback. The strings are advisory, not part
//! of the data contract.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::bitmap::PackedBitmap;
use crate::error::SketchError;
use crate::rle;
use crate::state::ChannelState;
use crate::wire::{Message, MessageKind, WireCodec};

// ── SessionConfig ────────────────────────────────────────────────

/// Configuration for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device address (`ip:port`).
    pub device_addr: String,
    /// Delay between a channel loss and the next connect attempt.
    pub reconnect_backoff: Duration,
    /// Deadline for connects and one-shot request/response exchanges.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_addr: "127.0.0.1:7411".into(),
            reconnect_backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────

/// A handle to the live channel and the device's bitmap storage.
///
/// Created with [`connect`](Self::connect); the background channel
/// task keeps reconnecting until [`shutdown`](Self::shutdown) or drop.
pub struct Session {
    config: SessionConfig,
    /// Queue into the channel task's writer loop.
    frame_tx: mpsc::Sender<Message>,
    state_rx: watch::Receiver<ChannelState>,
    status_tx: watch::Sender<String>,
    running: Arc<AtomicBool>,
}

impl Session {
    /// Spawn the channel task and return the session handle.
    ///
    /// Returns immediately; the channel starts in `Connecting` and
    /// becomes `Open` once the device accepts.
    pub fn connect(config: SessionConfig) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(ChannelState::default());
        let (status_tx, _) = watch::channel(String::new());
        let running = Arc::new(AtomicBool::new(true));

        tokio::spawn(channel_task(
            config.clone(),
            frame_rx,
            state_tx,
            status_tx.clone(),
            Arc::clone(&running),
        ));

        Self {
            config,
            frame_tx,
            state_rx,
            status_tx,
            running,
        }
    }

    // ── Observability ────────────────────────────────────────────

    /// Current channel state.
    pub fn state(&self) -> ChannelState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to channel state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Subscribe to human-readable status lines.
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status_tx.subscribe()
    }

    fn report(&self, status: impl Into<String>) {
        let _ = self.status_tx.send(status.into());
    }

    // ── Live channel ─────────────────────────────────────────────

    /// Run-length encode `bitmap` and hand it to the live channel.
    ///
    /// Fails immediately with [`SketchError::NotReady`] unless the
    /// channel is `Open`; the caller must wait for the next `Open`
    /// transition — there is no queueing across reconnects. A
    /// successful return means the frame was queued in order, not
    /// that the device applied it.
    pub fn send_bitmap(&self, bitmap: &PackedBitmap) -> Result<usize, SketchError> {
        if !self.state_rx.borrow().is_open() {
            self.report("channel not ready");
            return Err(SketchError::NotReady);
        }

        let encoded = rle::encode(bitmap.as_bytes());
        let len = encoded.len();
        self.frame_tx
            .try_send(Message::frame(encoded))
            .map_err(|_| SketchError::NotReady)?;

        self.report(format!("sent {len} bytes"));
        Ok(len)
    }

    // ── Store / retrieve (one-shot, independent of the channel) ──

    /// Upload the raw bitmap to the device's persistent storage.
    pub async fn store(&self, bitmap: &PackedBitmap) -> Result<(), SketchError> {
        let reply = self.request(Message::store(bitmap)).await?;
        match reply.kind() {
            MessageKind::StoreAck => {
                self.report("saved to device");
                Ok(())
            }
            MessageKind::Error => {
                let reason = reply.payload_text();
                self.report(format!("save failed: {reason}"));
                Err(SketchError::StoreRejected(reason))
            }
            other => Err(SketchError::ProtocolViolation(unexpected_reply(other))),
        }
    }

    /// Fetch the previously stored raw bitmap.
    ///
    /// The reply length is validated; a device that has never stored
    /// anything answers `Missing`, surfaced as
    /// [`SketchError::NotStored`].
    pub async fn retrieve(&self) -> Result<PackedBitmap, SketchError> {
        let reply = self.request(Message::load()).await?;
        match reply.kind() {
            MessageKind::Bitmap => {
                let bitmap = PackedBitmap::from_bytes(reply.payload())?;
                self.report("loaded from device");
                Ok(bitmap)
            }
            MessageKind::Missing => {
                self.report("no saved drawing");
                Err(SketchError::NotStored)
            }
            MessageKind::Error => {
                let reason = reply.payload_text();
                self.report(format!("load failed: {reason}"));
                Err(SketchError::Other(reason))
            }
            other => Err(SketchError::ProtocolViolation(unexpected_reply(other))),
        }
    }

    /// One-shot request/response exchange over a fresh connection.
    async fn request(&self, request: Message) -> Result<Message, SketchError> {
        let deadline = self.config.request_timeout;
        let stream = tokio::time::timeout(deadline, TcpStream::connect(&self.config.device_addr))
            .await
            .map_err(|_| SketchError::Timeout(deadline))??;

        let mut framed = Framed::new(stream, WireCodec::new());
        framed.send(request).await?;

        match tokio::time::timeout(deadline, framed.next()).await {
            Ok(Some(reply)) => reply,
            Ok(None) => Err(SketchError::ChannelClosed),
            Err(_) => Err(SketchError::Timeout(deadline)),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop the channel task. The session cannot be reused afterwards.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn unexpected_reply(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Frame => "unexpected Frame reply",
        MessageKind::Store => "unexpected Store reply",
        MessageKind::Load => "unexpected Load reply",
        MessageKind::StoreAck => "unexpected StoreAck reply",
        MessageKind::Bitmap => "unexpected Bitmap reply",
        MessageKind::Missing => "unexpected Missing reply",
        MessageKind::Error => "unexpected Error reply",
    }
}

// ── Channel task ─────────────────────────────────────────────────

/// Reconnect-forever loop: `Connecting → Open → Closed → (backoff) →
/// Connecting …`, until `running` flips false.
async fn channel_task(
    config: SessionConfig,
    mut frame_rx: mpsc::Receiver<Message>,
    state_tx: watch::Sender<ChannelState>,
    status_tx: watch::Sender<String>,
    running: Arc<AtomicBool>,
) {
    let mut state = ChannelState::default();

    while running.load(Ordering::SeqCst) {
        let _ = status_tx.send(format!("connecting to {}", config.device_addr));

        let connect = tokio::time::timeout(
            config.request_timeout,
            TcpStream::connect(&config.device_addr),
        )
        .await;

        match connect {
            Ok(Ok(stream)) => {
                if state.opened().is_ok() {
                    let _ = state_tx.send(state.clone());
                }
                let _ = status_tx.send("connected".into());
                info!(addr = %config.device_addr, "live channel open");

                pump_frames(stream, &mut frame_rx, &running).await;

                let _ = status_tx.send("disconnected".into());
            }
            Ok(Err(e)) => {
                debug!(error = %e, "connect failed");
                let _ = status_tx.send("connection error".into());
            }
            Err(_) => {
                debug!("connect timed out");
                let _ = status_tx.send("connection error".into());
            }
        }

        state.lost();
        let _ = state_tx.send(state.clone());

        // A dropped channel discards everything not yet flushed.
        while frame_rx.try_recv().is_ok() {}

        if !running.load(Ordering::SeqCst) {
            break;
        }

        tokio::time::sleep(config.reconnect_backoff).await;

        if state.retry().is_ok() {
            let _ = state_tx.send(state.clone());
        }
    }
}

/// Writer/reader loop for one established connection. Returns when the
/// link fails, the peer closes, or the session shuts down.
async fn pump_frames(
    stream: TcpStream,
    frame_rx: &mut mpsc::Receiver<Message>,
    running: &AtomicBool,
) {
    let mut framed = Framed::new(stream, WireCodec::new());

    loop {
        if !running.load(Ordering::SeqCst) {
            return;
        }

        tokio::select! {
            queued = frame_rx.recv() => match queued {
                Some(message) => {
                    if let Err(e) = framed.send(message).await {
                        warn!(error = %e, "frame send failed");
                        return;
                    }
                }
                // Session handle dropped.
                None => return,
            },
            inbound = framed.next() => match inbound {
                // Inbound live-channel traffic is not consumed by the
                // pipeline; log and move on.
                Some(Ok(message)) => debug!(kind = %message.kind(), "unsolicited message"),
                Some(Err(e)) => {
                    warn!(error = %e, "live channel read error");
                    return;
                }
                None => {
                    info!("live channel closed by device");
                    return;
                }
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
