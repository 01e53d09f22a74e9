use tokio::sync::watch;

/// Resolve once the stop flag flips to true.
///
/// A dropped sender means no stop can ever arrive; that is not a stop, so
/// the future just parks forever and the owning `select!` proceeds on its
/// other branches.
pub async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn resolves_on_stop() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), stopped(&mut rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_is_not_a_stop() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        let waited = tokio::time::timeout(Duration::from_millis(50), stopped(&mut rx)).await;
        assert!(waited.is_err(), "closed channel must not look like a stop");
    }
}
