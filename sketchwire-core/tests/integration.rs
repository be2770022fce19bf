//! Integration tests — live frame delivery, store/retrieve exchanges,
//! reconnect behavior, and error scenarios over real TCP connections
//! on localhost.

use std::time::Duration;

use sketchwire_core::{
    BITMAP_SIZE, BrushMode, CanvasPoint, ChannelState, DisplayService, MemoryStore, PackedBitmap,
    Rasterizer, Session, SessionConfig, SketchError,
};

// ── Helpers ──────────────────────────────────────────────────────

/// Bind a display service on an OS-assigned port, spawn its accept
/// loop, and return the service address plus a session config with
/// test-friendly timings.
async fn start_device() -> (DisplayService<MemoryStore>, SessionConfig) {
    let service = DisplayService::bind("127.0.0.1:0", MemoryStore::new())
        .await
        .unwrap();
    let addr = service.local_addr().unwrap();
    let config = SessionConfig {
        device_addr: addr.to_string(),
        reconnect_backoff: Duration::from_millis(50),
        request_timeout: Duration::from_secs(2),
    };
    (service, config)
}

/// Wait until the session's channel reaches `Open`.
async fn wait_for_open(session: &Session) {
    let mut state_rx = session.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), async {
        state_rx
            .wait_for(|s: &ChannelState| s.is_open())
            .await
            .unwrap();
    })
    .await
    .expect("channel never opened");
}

/// A bitmap with a recognizable drawing on it.
fn sketch_bitmap() -> PackedBitmap {
    let mut raster = Rasterizer::new();
    raster.set_brush_size(3);
    raster.begin(CanvasPoint::clamped(5, 5));
    raster.extend(CanvasPoint::clamped(100, 50));
    raster.end();
    PackedBitmap::pack(raster.canvas())
}

// ── Live frame delivery ──────────────────────────────────────────

#[tokio::test]
async fn live_frame_reaches_device() {
    let (service, config) = start_device().await;
    let mut frames = service.frame_receiver();
    tokio::spawn(async move { service.run().await });

    let session = Session::connect(config);
    wait_for_open(&session).await;

    let bitmap = sketch_bitmap();
    let wire_len = session.send_bitmap(&bitmap).unwrap();
    assert!(wire_len > 0 && wire_len <= 2 * BITMAP_SIZE);

    tokio::time::timeout(Duration::from_secs(5), async {
        frames
            .wait_for(|f: &Option<PackedBitmap>| f.is_some())
            .await
            .unwrap();
    })
    .await
    .expect("frame never arrived");

    assert_eq!(frames.borrow().as_ref(), Some(&bitmap));
}

#[tokio::test]
async fn frames_arrive_in_send_order() {
    let (service, config) = start_device().await;
    let mut frames = service.frame_receiver();
    tokio::spawn(async move { service.run().await });

    let session = Session::connect(config);
    wait_for_open(&session).await;

    let first = PackedBitmap::blank();
    let last = PackedBitmap::from_bytes(&[0xFFu8; BITMAP_SIZE]).unwrap();
    session.send_bitmap(&first).unwrap();
    session.send_bitmap(&last).unwrap();

    // The watch channel keeps only the latest value; once the final
    // frame shows up it must be the last one sent.
    tokio::time::timeout(Duration::from_secs(5), async {
        frames
            .wait_for(|f: &Option<PackedBitmap>| f.as_ref() == Some(&last))
            .await
            .unwrap();
    })
    .await
    .expect("final frame never arrived");
}

// ── Store / retrieve ─────────────────────────────────────────────

#[tokio::test]
async fn store_retrieve_roundtrip_empty_canvas() {
    let (service, config) = start_device().await;
    tokio::spawn(async move { service.run().await });

    let session = Session::connect(config);

    // One-shot exchanges work regardless of the live channel state.
    let blank = PackedBitmap::blank();
    session.store(&blank).await.unwrap();

    let retrieved = session.retrieve().await.unwrap();
    assert_eq!(retrieved, blank);
    assert!(retrieved.as_bytes().iter().all(|&b| b == 0));
}

#[tokio::test]
async fn store_retrieve_roundtrip_drawing() {
    let (service, config) = start_device().await;
    tokio::spawn(async move { service.run().await });

    let session = Session::connect(config);
    let bitmap = sketch_bitmap();
    session.store(&bitmap).await.unwrap();
    assert_eq!(session.retrieve().await.unwrap(), bitmap);

    // The retrieved bitmap restores the canvas (no codec on this path).
    let mut raster = Rasterizer::new();
    raster.load_bitmap(&bitmap);
    assert_eq!(PackedBitmap::pack(raster.canvas()), bitmap);
}

#[tokio::test]
async fn retrieve_without_store_is_not_found() {
    let (service, config) = start_device().await;
    tokio::spawn(async move { service.run().await });

    let session = Session::connect(config);
    let err = session.retrieve().await.unwrap_err();
    assert!(matches!(err, SketchError::NotStored));
}

#[tokio::test]
async fn erase_then_store_persists_erasure() {
    let (service, config) = start_device().await;
    tokio::spawn(async move { service.run().await });

    let mut raster = Rasterizer::new();
    raster.set_brush_size(10);
    raster.begin(CanvasPoint::clamped(64, 32));
    raster.end();
    raster.set_brush_mode(BrushMode::Erase);
    raster.begin(CanvasPoint::clamped(64, 32));
    raster.end();

    let session = Session::connect(config);
    session.store(&PackedBitmap::pack(raster.canvas())).await.unwrap();
    assert_eq!(session.retrieve().await.unwrap(), PackedBitmap::blank());
}

// ── Channel state machine ────────────────────────────────────────

#[tokio::test]
async fn send_on_closed_channel_fails_fast() {
    // No device at all: the channel cycles Connecting/Closed forever.
    let session = Session::connect(SessionConfig {
        device_addr: "127.0.0.1:1".into(),
        reconnect_backoff: Duration::from_millis(50),
        request_timeout: Duration::from_millis(200),
    });

    let started = std::time::Instant::now();
    let err = session.send_bitmap(&PackedBitmap::blank()).unwrap_err();
    assert!(matches!(err, SketchError::NotReady));
    // Fails immediately, no blocking on the reconnect cycle.
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn session_reconnects_when_device_restarts() {
    // Stand up a device, let the session connect, then kill the device
    // and start a new one on the same port. The session must heal.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // First incarnation: accept one connection, then drop everything.
    let first = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(stream);
        // Listener dropped here — the port is free again.
    });

    let session = Session::connect(SessionConfig {
        device_addr: addr.to_string(),
        reconnect_backoff: Duration::from_millis(50),
        request_timeout: Duration::from_secs(2),
    });
    wait_for_open(&session).await;
    first.await.unwrap();

    // Wait for the session to notice the loss.
    let mut state_rx = session.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), async {
        state_rx
            .wait_for(|s: &ChannelState| !s.is_open())
            .await
            .unwrap();
    })
    .await
    .expect("channel never closed");

    // Second incarnation on the same port.
    let service = loop {
        match DisplayService::bind(&addr.to_string(), MemoryStore::new()).await {
            Ok(s) => break s,
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    };
    let mut frames = service.frame_receiver();
    tokio::spawn(async move { service.run().await });

    wait_for_open(&session).await;

    // The healed channel carries frames again.
    let bitmap = sketch_bitmap();
    session.send_bitmap(&bitmap).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        frames
            .wait_for(|f: &Option<PackedBitmap>| f.is_some())
            .await
            .unwrap();
    })
    .await
    .expect("frame never arrived after reconnect");
    assert_eq!(frames.borrow().as_ref(), Some(&bitmap));
}

// ── Status observer ──────────────────────────────────────────────

#[tokio::test]
async fn status_lines_track_operations() {
    let (service, config) = start_device().await;
    tokio::spawn(async move { service.run().await });

    let session = Session::connect(config);
    let status_rx = session.subscribe_status();

    wait_for_open(&session).await;

    session.store(&PackedBitmap::blank()).await.unwrap();
    assert_eq!(&*status_rx.borrow(), "saved to device");

    session.retrieve().await.unwrap();
    assert_eq!(&*status_rx.borrow(), "loaded from device");

    session.send_bitmap(&PackedBitmap::blank()).unwrap();
    assert!(status_rx.borrow().starts_with("sent "));
}
