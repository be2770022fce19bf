//! Device-side display service.
//!
//! The counterpart of [`Session`](crate::session::Session): accepts
//! connections, decodes live run-length frames into the latest
//! display bitmap, and answers the store/retrieve exchanges against a
//! [`BitmapStore`]. One task per connection; the most recent good
//! frame is published on a `watch` channel for the render layer.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::bitmap::{BITMAP_SIZE, PackedBitmap};
use crate::error::SketchError;
use crate::rle;
use crate::storage::BitmapStore;
use crate::wire::{Message, MessageKind, WireCodec};

// ── DisplayService ───────────────────────────────────────────────

/// Accept loop plus per-connection protocol handling.
pub struct DisplayService<S: BitmapStore> {
    listener: TcpListener,
    store: Arc<S>,
    frame_tx: watch::Sender<Option<PackedBitmap>>,
}

impl<S: BitmapStore> DisplayService<S> {
    /// Bind the listener and wrap the storage backend.
    pub async fn bind(addr: &str, store: S) -> Result<Self, SketchError> {
        let listener = TcpListener::bind(addr).await?;
        let (frame_tx, _) = watch::channel(None);
        Ok(Self {
            listener,
            store: Arc::new(store),
            frame_tx,
        })
    }

    /// The bound address (useful with an OS-assigned port).
    pub fn local_addr(&self) -> Result<SocketAddr, SketchError> {
        Ok(self.listener.local_addr()?)
    }

    /// Subscribe to the latest decoded frame. `None` until the first
    /// good frame arrives or a saved drawing is preloaded.
    pub fn frame_receiver(&self) -> watch::Receiver<Option<PackedBitmap>> {
        self.frame_tx.subscribe()
    }

    /// Publish the saved drawing (if any) as the current frame, as the
    /// device does on boot.
    pub async fn preload_saved(&self) -> Result<bool, SketchError> {
        match self.store.load().await? {
            Some(bitmap) => {
                let _ = self.frame_tx.send(Some(bitmap));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the accept loop. Each connection is served on its own task
    /// until the peer disconnects.
    pub async fn run(&self) -> Result<(), SketchError> {
        info!(addr = %self.local_addr()?, "display service listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "client connected");

            let store = Arc::clone(&self.store);
            let frame_tx = self.frame_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, store, frame_tx).await {
                    warn!(%peer, error = %e, "connection ended with error");
                }
                debug!(%peer, "client disconnected");
            });
        }
    }
}

/// Read messages off one connection and answer them until EOF.
async fn serve_connection<S: BitmapStore>(
    stream: TcpStream,
    store: Arc<S>,
    frame_tx: watch::Sender<Option<PackedBitmap>>,
) -> Result<(), SketchError> {
    let mut framed = Framed::new(stream, WireCodec::new());

    while let Some(message) = framed.next().await {
        let message = message?;
        if let Some(reply) = handle_message(message, store.as_ref(), &frame_tx).await {
            framed.send(reply).await?;
        }
    }

    Ok(())
}

/// Protocol dispatch for a single message. Returns the reply to send,
/// if the message kind expects one.
///
/// Errors are fatal for the triggering operation only: a malformed
/// frame is dropped without touching the current display state, and a
/// rejected store leaves the previously saved drawing intact.
async fn handle_message<S: BitmapStore>(
    message: Message,
    store: &S,
    frame_tx: &watch::Sender<Option<PackedBitmap>>,
) -> Option<Message> {
    match message.kind() {
        MessageKind::Frame => {
            match decode_frame(message.payload()) {
                Ok(bitmap) => {
                    let _ = frame_tx.send(Some(bitmap));
                }
                Err(e) => warn!(error = %e, "dropping bad frame"),
            }
            // Live frames are best effort; no acknowledgment.
            None
        }

        MessageKind::Store => {
            if message.payload().len() != BITMAP_SIZE {
                return Some(Message::error("invalid bitmap size"));
            }
            let bitmap = match PackedBitmap::from_bytes(message.payload()) {
                Ok(b) => b,
                Err(_) => return Some(Message::error("invalid bitmap size")),
            };
            match store.save(&bitmap).await {
                Ok(()) => Some(Message::store_ack()),
                Err(e) => {
                    warn!(error = %e, "bitmap save failed");
                    Some(Message::error("write error"))
                }
            }
        }

        MessageKind::Load => match store.load().await {
            Ok(Some(bitmap)) => Some(Message::bitmap(&bitmap)),
            Ok(None) => Some(Message::missing()),
            Err(e) => {
                warn!(error = %e, "bitmap load failed");
                Some(Message::error("read error"))
            }
        },

        // Reply kinds have no business arriving here.
        other => {
            warn!(kind = %other, "unexpected message from client");
            Some(Message::error("unexpected message"))
        }
    }
}

/// Expand and validate a live frame payload.
fn decode_frame(payload: &[u8]) -> Result<PackedBitmap, SketchError> {
    let bytes = rle::decode(payload)?;
    PackedBitmap::from_bytes(&bytes)
}

// ── Tests ────────────────────────────────────────────────────────
