//! Session lifecycle: connect both channels, pump frames, drain control.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use spyglass_crypto::PresharedKey;
use spyglass_media::encoder::{decode_jpeg, DecodedFrame};
use spyglass_protocol::codec::{recv_json, recv_open, AAD_VIDEO};
use spyglass_protocol::control::{self, ControlCommand};
use spyglass_protocol::files::{recv_file, DEFAULT_MAX_FILE_BYTES};
use spyglass_protocol::{ControlMsg, WireError, DEFAULT_MAX_FRAME_BYTES};

use crate::input::InputSender;
use crate::resolve::HostDirectory;
use crate::view::SharedView;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub video_port: u16,
    pub control_port: u16,
    /// Per-socket connect deadline; on expiry the attempt is surfaced to
    /// the user, never retried automatically.
    pub connect_timeout: Duration,
    pub max_frame_bytes: u32,
    pub max_file_bytes: u64,
    /// Where host-initiated file pushes are saved.
    pub download_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            video_port: 5000,
            control_port: 5001,
            connect_timeout: Duration::from_secs(10),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            download_dir: "downloads".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: SocketAddr, timeout: Duration },

    #[error("host '{0}' not found in the directory")]
    UnknownHost(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A live connection to a host: two sockets, three background tasks.
pub struct ViewerSession {
    view: Arc<SharedView>,
    control_tx: mpsc::Sender<ControlCommand>,
    stop_tx: watch::Sender<bool>,
    video_task: JoinHandle<()>,
    control_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl ViewerSession {
    /// Connect to a host by address: control socket first, then video (the
    /// host accepts in that order). Returns the session and the channel the
    /// UI reads decoded frames from.
    pub async fn connect(
        host: IpAddr,
        key: PresharedKey,
        config: ViewerConfig,
    ) -> Result<(Self, mpsc::Receiver<DecodedFrame>), ViewerError> {
        let control_addr = SocketAddr::new(host, config.control_port);
        let control_stream = connect_with_timeout(control_addr, config.connect_timeout).await?;
        info!(addr = %control_addr, "control channel connected");

        let video_addr = SocketAddr::new(host, config.video_port);
        let video_stream = connect_with_timeout(video_addr, config.connect_timeout).await?;
        info!(addr = %video_addr, "video channel connected");

        Ok(Self::start(key, config, control_stream, video_stream))
    }

    /// Connect by directory name, resolving through the embedding
    /// application's [`HostDirectory`].
    pub async fn connect_named<D: HostDirectory>(
        directory: &D,
        name: &str,
        prefer_public: Option<bool>,
        key: PresharedKey,
        config: ViewerConfig,
    ) -> Result<(Self, mpsc::Receiver<DecodedFrame>), ViewerError> {
        let host = directory
            .resolve(name, prefer_public)
            .ok_or_else(|| ViewerError::UnknownHost(name.to_string()))?;
        Self::connect(host, key, config).await
    }

    fn start(
        key: PresharedKey,
        config: ViewerConfig,
        control_stream: TcpStream,
        video_stream: TcpStream,
    ) -> (Self, mpsc::Receiver<DecodedFrame>) {
        let view = Arc::new(SharedView::new());
        let (frames_tx, frames_rx) = mpsc::channel(2);
        let (stop_tx, stop_rx) = watch::channel(false);

        let (control_read, control_write) = control_stream.into_split();
        let (control_tx, writer_task) = control::spawn_writer(control_write, key.clone());

        let video_task = tokio::spawn(video_loop(
            video_stream,
            key.clone(),
            view.clone(),
            frames_tx,
            config.max_frame_bytes,
            stop_rx.clone(),
        ));

        let control_task = tokio::spawn(control_loop(
            control_read,
            key,
            config.download_dir,
            config.max_file_bytes,
            config.max_frame_bytes,
            stop_rx,
        ));

        let session = Self {
            view,
            control_tx,
            stop_tx,
            video_task,
            control_task,
            writer_task,
        };
        (session, frames_rx)
    }

    /// Geometry handle for the UI: window rectangle in, frame dims out.
    pub fn view(&self) -> Arc<SharedView> {
        self.view.clone()
    }

    /// Build the event producer the UI thread pushes input into.
    pub fn input_sender(&self) -> InputSender {
        InputSender::new(self.view.clone(), self.control_tx.clone())
    }

    /// Signal every task to wind down. Idempotent; `join` completes the
    /// teardown.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the receive tasks, then retire the writer. Sockets close as
    /// their owning tasks drop them; a peer blocked on us sees EOF.
    pub async fn join(self) {
        let _ = self.video_task.await;
        let _ = self.control_task.await;

        // The writer drains until every command sender is gone; outstanding
        // InputSender clones may outlive the session, so retire it directly.
        drop(self.control_tx);
        self.writer_task.abort();
        let _ = self.writer_task.await;
    }
}

async fn connect_with_timeout(
    addr: SocketAddr,
    timeout: Duration,
) -> Result<TcpStream, ViewerError> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(ViewerError::ConnectTimeout { addr, timeout }),
    }
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Decode sealed JPEG payloads and hand them to the UI.
async fn video_loop(
    mut stream: TcpStream,
    key: PresharedKey,
    view: Arc<SharedView>,
    frames: mpsc::Sender<DecodedFrame>,
    max_frame_bytes: u32,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let payload = tokio::select! {
            res = recv_open(&mut stream, &key, AAD_VIDEO, max_frame_bytes) => match res {
                Ok(payload) => payload,
                Err(e) if e.is_clean_disconnect() => {
                    info!("video stream ended: {e}");
                    break;
                }
                Err(e) => {
                    warn!("video stream failed: {e}");
                    break;
                }
            },
            _ = stopped(&mut stop) => break,
        };

        let Some(frame) = decode_jpeg(&payload) else {
            continue; // undecodable frame, skip it
        };
        view.set_frame_dims(frame.width, frame.height);

        if frames.send(frame).await.is_err() {
            debug!("frame consumer gone, stopping video task");
            break;
        }
    }
}

/// Drain host-initiated control traffic (file pushes and trailers).
async fn control_loop(
    mut stream: OwnedReadHalf,
    key: PresharedKey,
    download_dir: PathBuf,
    max_file_bytes: u64,
    max_frame_bytes: u32,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let msg = tokio::select! {
            res = recv_json(&mut stream, &key, max_frame_bytes) => match res {
                Ok(msg) => msg,
                Err(WireError::Json(e)) => {
                    warn!("unparseable control record, skipping: {e}");
                    continue;
                }
                Err(e) if e.is_clean_disconnect() => {
                    info!("control channel ended: {e}");
                    break;
                }
                Err(e) => {
                    warn!("closing control channel: {e}");
                    break;
                }
            },
            _ = stopped(&mut stop) => break,
        };

        match msg {
            ControlMsg::FileStart { name, size } => {
                info!(name = %name, size, "incoming file from host");
                match recv_file(
                    &mut stream,
                    &key,
                    &name,
                    size,
                    &download_dir,
                    max_file_bytes,
                    max_frame_bytes,
                )
                .await
                {
                    Ok(path) => info!(path = %path.display(), "download complete"),
                    Err(e) => {
                        warn!("download failed: {e}");
                        break;
                    }
                }
            }
            ControlMsg::FileEnd { name } => {
                debug!(name = %name, "stray file_end ignored");
            }
            other => {
                // The host has no business sending input events back
                debug!(?other, "unexpected control record ignored");
            }
        }
    }
}
