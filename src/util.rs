//! Utility functions and helper types.

use std::any::Any;
use std::future::Future;

use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::core::{Error, Result};

/// Run `future` unless `token` is cancelled first.
///
/// Cancellation is checked before the future is polled, so an already
/// cancelled token wins even when the future could complete immediately.
pub async fn cancellable<F: Future>(token: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Shutdown),
        output = future => Ok(output),
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Collect every item of a stream.
pub async fn stream_into_vec<S>(stream: S) -> Vec<S::Item>
where
    S: Stream + Send,
    S::Item: Send,
{
    let mut vec = Vec::new();
    tokio::pin!(stream);
    while let Some(item) = stream.next().await {
        vec.push(item);
    }
    vec
}
