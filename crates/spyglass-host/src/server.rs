//! Listener setup and per-session orchestration.
//!
//! One viewer at a time: the control connection is accepted first, then the
//! video connection, then the session runs until either channel ends or the
//! operator stops the host. Connection loss is routine: resources are torn
//! down and the host goes straight back to accepting.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{error, info, warn};

use spyglass_crypto::PresharedKey;
use spyglass_input::NativeBackend;
use spyglass_media::{FrameEncoder, FrameSource, PrimaryScreenSource, ScreenCapturer};
use spyglass_protocol::mapper::Dims;

use crate::config::HostConfig;
use crate::dispatch::{self, DispatchLimits, SessionGeometry};
use crate::pacer;

/// How often the accept loops wake to check the stop flag.
const ACCEPT_POLL: Duration = Duration::from_secs(1);

/// Bind both listeners and serve sessions until `stop` flips.
pub async fn run(
    config: HostConfig,
    key: PresharedKey,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let video_addr: SocketAddr = format!("{}:{}", config.host, config.video_port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.host))?;
    let control_addr: SocketAddr = format!("{}:{}", config.host, config.control_port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.host))?;

    let video_listener = bind_listener(video_addr)
        .with_context(|| format!("failed to bind video listener on {video_addr}"))?;
    let control_listener = bind_listener(control_addr)
        .with_context(|| format!("failed to bind control listener on {control_addr}"))?;

    info!(video = %video_addr, control = %control_addr, "listening");

    loop {
        // Control first, then video; the viewer connects in that order
        let Some((control_stream, peer)) = accept_until_stop(&control_listener, &mut stop).await
        else {
            break;
        };
        info!(peer = %peer, "control connection accepted");

        let Some((video_stream, peer)) = accept_until_stop(&video_listener, &mut stop).await
        else {
            break;
        };
        info!(peer = %peer, "video connection accepted");

        if let Err(e) = run_session(&config, &key, control_stream, video_stream, &mut stop).await {
            warn!("session failed: {e:#}");
        }

        if *stop.borrow() {
            break;
        }
        info!("session ended, waiting for the next viewer");
    }

    info!("host stopped");
    Ok(())
}

/// Bind a TCP listener with `SO_REUSEADDR` so a restarted host can rebind
/// immediately.
fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;
    socket.set_nonblocking(true)?;
    Ok(TcpListener::from_std(socket.into())?)
}

/// Accept one connection, polling the stop flag about once a second.
async fn accept_until_stop(
    listener: &TcpListener,
    stop: &mut watch::Receiver<bool>,
) -> Option<(TcpStream, SocketAddr)> {
    loop {
        if *stop.borrow_and_update() {
            return None;
        }
        match tokio::time::timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok(pair)) => return Some(pair),
            Ok(Err(e)) => error!("accept failed: {e}"),
            Err(_) => {} // poll timeout, re-check the flag
        }
    }
}

/// Drive one viewer session to completion.
async fn run_session(
    config: &HostConfig,
    key: &PresharedKey,
    control_stream: TcpStream,
    mut video_stream: TcpStream,
    stop: &mut watch::Receiver<bool>,
) -> Result<()> {
    // The capture handle is acquired only once the video connection is up,
    // and the session geometry is fixed from here on
    let capturer = ScreenCapturer::primary().context("screen capture unavailable")?;
    let encoder = FrameEncoder::new(config.scale, config.jpeg_quality);
    let source = PrimaryScreenSource::new(capturer, encoder);

    let (sw, sh) = source.native_dims();
    let (fw, fh) = source.frame_dims();
    let geometry = SessionGeometry {
        screen: Dims::new(sw, sh),
        frame: Dims::new(fw, fh),
    };
    info!(screen = ?(sw, sh), frame = ?(fw, fh), fps = config.fps, "session starting");

    let backend = NativeBackend::new().context("input injection unavailable")?;
    let limits = DispatchLimits {
        max_frame_bytes: config.max_frame_bytes,
        max_file_bytes: config.max_file_bytes,
        recv_dir: config.recv_dir.clone(),
    };

    let (sess_tx, sess_rx) = watch::channel(false);
    let mut dispatcher = tokio::spawn(dispatch::run(
        control_stream,
        key.clone(),
        geometry,
        limits,
        backend,
        sess_rx,
    ));

    // The pacer runs on this task; whichever side finishes first ends the
    // session for both
    tokio::select! {
        _ = pacer::run(&mut video_stream, source, key, config.fps, stop.clone()) => {}
        _ = &mut dispatcher => info!("control connection ended first"),
    }

    let _ = sess_tx.send(true);
    if !dispatcher.is_finished() {
        let _ = dispatcher.await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bound_listener_accepts_connections() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (_stop_tx, mut stop) = watch::channel(false);
        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });

        let accepted = accept_until_stop(&listener, &mut stop).await;
        assert!(accepted.is_some());
        client.await.unwrap();
    }

    #[tokio::test]
    async fn accept_loop_observes_stop() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let (stop_tx, mut stop) = watch::channel(false);

        let waiter = tokio::spawn(async move { accept_until_stop(&listener, &mut stop).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(true).unwrap();

        // The loop polls every second, so it must notice within ~2s
        let result = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("accept loop ignored stop")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn rebinding_after_drop_succeeds() {
        let first = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();
        drop(first);

        // SO_REUSEADDR lets a restarted host take the port straight back
        bind_listener(addr).unwrap();
    }
}
