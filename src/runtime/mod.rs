//! Stage runtime: handoffs, spawning and the fault boundary.
//!
//! Every stage runs as its own tokio task and talks to its neighbours through
//! a single-slot handoff. An [`Outlet`] is the producing end and an [`Inlet`]
//! the consuming end; both observe the pipeline's [`CancellationToken`] at
//! every point where they can block.
//!
//! Finalization is tied to ownership. A stage's `Outlet` is moved into the
//! stage's task and dropped exactly once when the task is done with it,
//! whether the logic returned normally, returned an error or panicked. The
//! stage's `Inlet` is dropped at the same moment, which tells the upstream
//! stage nobody is listening any more.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::stream::{self, Stream};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::core::{Error, Filter, Result, Source};
use crate::util::{cancellable, panic_message};

/// Create a single-slot handoff whose ends both observe `token`.
pub fn handoff<T>(token: &CancellationToken) -> (Outlet<T>, Inlet<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        Outlet {
            tx,
            token: token.clone(),
        },
        Inlet {
            rx,
            token: token.clone(),
        },
    )
}

/// The producing end of a handoff.
///
/// Not `Clone`: a stage's output has exactly one owner, so dropping it is the
/// one and only end-of-stream signal.
pub struct Outlet<T> {
    tx: mpsc::Sender<T>,
    token: CancellationToken,
}

impl<T: Send> Outlet<T> {
    /// Wait until the consumer has room for one more item.
    ///
    /// Fails with [`Error::Shutdown`] when the pipeline is cancelled and
    /// with [`Error::Disconnected`] when the consumer hung up.
    pub async fn reserve(&self) -> Result<mpsc::Permit<'_, T>> {
        cancellable(&self.token, self.tx.reserve())
            .await?
            .map_err(|_| Error::Disconnected)
    }

    /// Hand one item to the consumer, waiting for it to take the previous one.
    pub async fn send(&self, item: T) -> Result<()> {
        let permit = self.reserve().await?;
        permit.send(item);
        Ok(())
    }

    /// Whether the consumer has hung up
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The consuming end of a handoff.
pub struct Inlet<T> {
    rx: mpsc::Receiver<T>,
    token: CancellationToken,
}

impl<T: Send + 'static> Inlet<T> {
    /// Take the next item.
    ///
    /// Returns `Ok(None)` once the producer finalized its output, and
    /// [`Error::Shutdown`] if the pipeline is cancelled while waiting.
    pub async fn recv(&mut self) -> Result<Option<T>> {
        cancellable(&self.token, self.rx.recv()).await
    }

    /// The token this handoff observes
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Adapt into a [`Stream`] that ends on end-of-stream or cancellation.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send {
        stream::unfold(self, |mut inlet| async move {
            match inlet.recv().await {
                Ok(Some(item)) => Some((item, inlet)),
                Ok(None) | Err(_) => None,
            }
        })
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The logic returned normally
    Completed,
    /// The downstream stage hung up first
    Detached,
    /// The pipeline's cancellation token fired
    Cancelled,
    /// The logic returned an error or panicked
    Failed(String),
}

/// A running stage.
#[derive(Debug)]
pub struct StageHandle {
    name: String,
    handle: JoinHandle<StageOutcome>,
}

impl StageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the stage's task to end.
    pub async fn join(self) -> StageOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => StageOutcome::Failed(format!("Task did not complete: {}", e)),
        }
    }
}

/// Wrap filtering logic into a running stage.
///
/// The stage's output is returned immediately, before the logic has done
/// anything. The logic receives `input` and the producing end of the new
/// output; when it ends, for whatever reason, the output is finalized.
/// Errors and panics stop at this boundary: they are logged and downstream
/// sees an ordinary end-of-stream.
pub fn apply<T, U, F, Fut>(
    name: impl Into<String>,
    input: Inlet<T>,
    logic: F,
) -> (Inlet<U>, StageHandle)
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(Inlet<T>, Outlet<U>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (output, next) = handoff(input.cancellation_token());
    let stage = spawn_guarded(name.into(), async move { logic(input, output).await });
    (next, stage)
}

/// Start a source as the first stage of a pipeline.
///
/// A slot in the handoff is reserved before the source is asked for an item,
/// so nothing is produced until the previous item has been taken.
pub fn spawn_source<S: Source>(
    mut source: S,
    token: &CancellationToken,
) -> (Inlet<S::Item>, StageHandle) {
    let (output, inlet) = handoff(token);
    let stage = spawn_guarded(source.name(), async move {
        loop {
            let permit = output.reserve().await?;
            match source.produce().await? {
                Some(item) => permit.send(item),
                None => return Ok::<(), Error>(()),
            }
        }
    });
    (inlet, stage)
}

/// Start a filter reading from `input`.
pub fn spawn_filter<T: Send + 'static>(
    mut filter: Box<dyn Filter<Item = T>>,
    input: Inlet<T>,
) -> (Inlet<T>, StageHandle) {
    let name = filter.name();
    apply(name, input, move |input, output| async move {
        filter.run(input, output).await
    })
}

fn spawn_guarded<Fut>(name: String, work: Fut) -> StageHandle
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let stage = name.clone();
    let handle = tokio::spawn(async move {
        debug!(stage = %stage, "stage started");

        // `work` owns the stage's outlet and inlet; both are gone once this
        // await returns, panic or not.
        let result = AssertUnwindSafe(work).catch_unwind().await;

        let outcome = match result {
            Ok(Ok(())) => StageOutcome::Completed,
            Ok(Err(e)) if e.is_termination() => match e {
                Error::Shutdown => StageOutcome::Cancelled,
                _ => StageOutcome::Detached,
            },
            Ok(Err(e)) => {
                warn!(stage = %stage, error = %e, "stage failed, output closed");
                StageOutcome::Failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(stage = %stage, panic = %message, "stage panicked, output closed");
                StageOutcome::Failed(message)
            }
        };

        debug!(stage = %stage, outcome = ?outcome, "stage finished");
        outcome
    });

    StageHandle { name, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn explode() -> Result<()> {
        panic!("filter exploded")
    }

    #[tokio::test]
    async fn test_handoff_holds_one_item() {
        let token = CancellationToken::new();
        let (outlet, mut inlet) = handoff::<u64>(&token);

        outlet.send(1).await.unwrap();
        // The slot is taken, so a second send has to wait for the reader.
        let blocked = timeout(Duration::from_millis(50), outlet.send(2)).await;
        assert!(blocked.is_err());

        assert_eq!(inlet.recv().await.unwrap(), Some(1));
        outlet.send(2).await.unwrap();
        assert_eq!(inlet.recv().await.unwrap(), Some(2));

        drop(outlet);
        assert_eq!(inlet.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_after_hang_up_is_disconnected() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff::<u64>(&token);
        drop(inlet);

        assert!(outlet.is_closed());
        assert_eq!(outlet.send(1).await, Err(Error::Disconnected));
    }

    #[tokio::test]
    async fn test_cancellation_wakes_blocked_ends() {
        let token = CancellationToken::new();
        let (outlet, mut inlet) = handoff::<u64>(&token);
        outlet.send(1).await.unwrap();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let blocked = timeout(Duration::from_secs(5), outlet.send(2)).await.unwrap();
        assert_eq!(blocked, Err(Error::Shutdown));
        assert_eq!(inlet.recv().await, Err(Error::Shutdown));
    }

    #[tokio::test]
    async fn test_apply_finalizes_on_error() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff::<u64>(&token);
        drop(outlet);

        let (mut output, stage) = apply(
            "failing",
            inlet,
            |_input: Inlet<u64>, output: Outlet<u64>| async move {
                output.send(7).await?;
                Err::<(), _>(Error::custom("boom"))
            },
        );

        assert_eq!(output.recv().await.unwrap(), Some(7));
        assert_eq!(output.recv().await.unwrap(), None);
        assert_eq!(stage.join().await, StageOutcome::Failed("boom".to_string()));
    }

    #[tokio::test]
    async fn test_apply_finalizes_on_panic() {
        let token = CancellationToken::new();
        let (_outlet, inlet) = handoff::<u64>(&token);

        let (mut output, stage) = apply(
            "panicking",
            inlet,
            |_input: Inlet<u64>, output: Outlet<u64>| async move {
                output.send(1).await?;
                explode()
            },
        );

        assert_eq!(output.recv().await.unwrap(), Some(1));
        let end = timeout(Duration::from_secs(5), output.recv()).await.unwrap();
        assert_eq!(end.unwrap(), None);
        assert_eq!(
            stage.join().await,
            StageOutcome::Failed("filter exploded".to_string())
        );
    }
}
