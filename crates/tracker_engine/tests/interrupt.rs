use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracker_engine::forward_interrupts;

fn press_source(
    rx: mpsc::UnboundedReceiver<()>,
) -> impl FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = io::Result<()>> + Send>> {
    let rx = Arc::new(Mutex::new(rx));
    move || {
        let rx = rx.clone();
        Box::pin(async move {
            rx.lock()
                .await
                .recv()
                .await
                .ok_or_else(|| io::Error::other("signal source closed"))
        })
    }
}

#[tokio::test]
async fn every_press_reaches_the_handler() {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(()).unwrap();
    tx.send(()).unwrap();
    drop(tx);

    let mut presses = 0;
    forward_interrupts(press_source(rx), CancellationToken::new(), || presses += 1).await;

    assert_eq!(presses, 2);
}

#[tokio::test]
async fn cancelled_token_stops_listening() {
    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let token = CancellationToken::new();
    token.cancel();

    let mut presses = 0;
    tokio::time::timeout(
        Duration::from_secs(1),
        forward_interrupts(press_source(rx), token, || presses += 1),
    )
    .await
    .expect("returns once cancelled");

    assert_eq!(presses, 0);
    drop(tx);
}
