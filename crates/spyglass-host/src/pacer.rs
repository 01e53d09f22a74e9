//! The timed capture → encode → seal → send loop.
//!
//! One tick per frame interval: grab and encode on the blocking pool, send
//! the sealed payload, then sleep whatever is left of the interval. A tick
//! that runs long eats into the next one instead of queueing a backlog, so
//! the stream stays real-time when the kernel send buffer stalls.

use std::time::{Duration, Instant};

use tokio::io::AsyncWrite;
use tokio::sync::watch;
use tracing::{debug, error, info};

use spyglass_crypto::PresharedKey;
use spyglass_media::FrameSource;
use spyglass_protocol::codec::{send_sealed, AAD_VIDEO};

/// Stream frames until the stop flag flips or the peer goes away.
pub async fn run<F, W>(
    stream: &mut W,
    mut source: F,
    key: &PresharedKey,
    fps: u32,
    mut stop: watch::Receiver<bool>,
) where
    F: FrameSource,
    W: AsyncWrite + Unpin,
{
    let interval = Duration::from_secs_f64(1.0 / fps as f64);
    let mut sent: u64 = 0;

    loop {
        if *stop.borrow() {
            break;
        }
        let tick = Instant::now();

        // Capture and JPEG-encode off the async runtime
        let grab = tokio::task::spawn_blocking(move || {
            let jpeg = source.next_jpeg();
            (source, jpeg)
        });
        let jpeg = match grab.await {
            Ok((returned, jpeg)) => {
                source = returned;
                jpeg
            }
            Err(e) => {
                error!("capture task failed: {e}");
                break;
            }
        };

        if let Some(jpeg) = jpeg {
            if let Err(e) = send_sealed(stream, key, &jpeg, AAD_VIDEO).await {
                info!("video stream ended: {e}");
                break;
            }
            sent += 1;
        } else {
            debug!("no frame this tick");
        }

        let elapsed = tick.elapsed();
        if elapsed < interval {
            tokio::select! {
                _ = tokio::time::sleep(interval - elapsed) => {}
                _ = crate::shutdown::stopped(&mut stop) => break,
            }
        }
    }

    info!(frames = sent, "pacer loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use spyglass_protocol::codec::{recv_open, DEFAULT_MAX_FRAME_BYTES};

    struct CountingSource {
        frame: Vec<u8>,
        produced: u32,
        fail_every: Option<u32>,
    }

    impl FrameSource for CountingSource {
        fn native_dims(&self) -> (u32, u32) {
            (1920, 1080)
        }

        fn frame_dims(&self) -> (u32, u32) {
            (1536, 864)
        }

        fn next_jpeg(&mut self) -> Option<Vec<u8>> {
            self.produced += 1;
            match self.fail_every {
                Some(n) if self.produced % n == 0 => None,
                _ => Some(self.frame.clone()),
            }
        }
    }

    fn key() -> PresharedKey {
        PresharedKey::from_bytes([3u8; 32])
    }

    #[tokio::test]
    async fn frames_arrive_and_stop_ends_the_loop() {
        let k = key();
        let (mut tx, mut rx) = tokio::io::duplex(1024 * 1024);
        let (stop_tx, stop_rx) = watch::channel(false);

        let source = CountingSource {
            frame: vec![0xAB; 512],
            produced: 0,
            fail_every: None,
        };

        let k2 = k.clone();
        let pacer = tokio::spawn(async move {
            run(&mut tx, source, &k2, 60, stop_rx).await;
        });

        for _ in 0..5 {
            let frame = recv_open(&mut rx, &k, AAD_VIDEO, DEFAULT_MAX_FRAME_BYTES)
                .await
                .unwrap();
            assert_eq!(frame, vec![0xAB; 512]);
        }

        stop_tx.send(true).unwrap();
        // One frame interval at 60 fps is ~17ms; allow generous slack
        tokio::time::timeout(Duration::from_secs(1), pacer)
            .await
            .expect("pacer did not stop within the deadline")
            .unwrap();
    }

    #[tokio::test]
    async fn failed_ticks_are_skipped_not_fatal() {
        let k = key();
        let (mut tx, mut rx) = tokio::io::duplex(1024 * 1024);
        let (stop_tx, stop_rx) = watch::channel(false);

        let source = CountingSource {
            frame: vec![1; 64],
            produced: 0,
            fail_every: Some(2),
        };

        let k2 = k.clone();
        let pacer = tokio::spawn(async move {
            run(&mut tx, source, &k2, 60, stop_rx).await;
        });

        // Every other tick fails to encode, yet frames keep flowing
        for _ in 0..3 {
            let frame = recv_open(&mut rx, &k, AAD_VIDEO, DEFAULT_MAX_FRAME_BYTES)
                .await
                .unwrap();
            assert_eq!(frame, vec![1; 64]);
        }

        stop_tx.send(true).unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(1), pacer).await;
    }

    #[tokio::test]
    async fn peer_disconnect_ends_the_loop() {
        let k = key();
        let (mut tx, rx) = tokio::io::duplex(1024);
        let (_stop_tx, stop_rx) = watch::channel(false);

        drop(rx);

        let source = CountingSource {
            frame: vec![2; 64],
            produced: 0,
            fail_every: None,
        };

        tokio::time::timeout(Duration::from_secs(1), async {
            run(&mut tx, source, &k, 60, stop_rx).await;
        })
        .await
        .expect("pacer did not notice the closed peer");
    }
}
