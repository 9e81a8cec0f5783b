//! Sink implementations for the fizzpipe library.
//!
//! Sinks terminate a pipeline: they pull from the last stage's output until
//! it ends and do something with every item.

use async_trait::async_trait;
use std::fmt::Display;
use std::io::{self, Stdout, Write};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

use crate::core::{Error, Result, Sink};
use crate::runtime::Inlet;

/// Pull items until the stream ends, calling `action` on each in arrival
/// order. Returns how many items were seen.
///
/// Cancellation of the pipeline counts as the end of the stream. Returning
/// does not cancel anything upstream; dropping the stream hangs it up.
pub async fn run<T, F>(mut stream: Inlet<T>, mut action: F) -> usize
where
    T: Send + 'static,
    F: FnMut(T),
{
    let mut seen = 0;
    loop {
        match stream.recv().await {
            Ok(Some(item)) => {
                action(item);
                seen += 1;
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "stream interrupted");
                break;
            }
        }
    }
    seen
}

/// Pull items until the stream ends, writing each into `sink`, then call
/// [`Sink::finish`]. Returns how many items were written.
pub async fn drain<T, S>(mut stream: Inlet<T>, sink: &mut S) -> Result<usize>
where
    T: Send + 'static,
    S: Sink<Item = T> + ?Sized,
{
    let mut seen = 0;
    loop {
        match stream.recv().await {
            Ok(Some(item)) => {
                sink.write(item).await?;
                seen += 1;
            }
            Ok(None) | Err(Error::Shutdown) => break,
            Err(e) => return Err(e),
        }
    }
    sink.finish().await?;
    Ok(seen)
}

/// A sink that prints items one per line, to stdout unless told otherwise.
///
/// Write failures are returned, never panicked on: a reader that closes the
/// pipe early shows up as an error for which [`Error::is_broken_pipe`] holds.
pub struct PrintSink<T, W = Stdout> {
    writer: W,
    /// The prefix to print before each item
    prefix: Option<String>,
    _phantom: PhantomData<fn(T)>,
}

impl<T> PrintSink<T> {
    /// Create a new print sink writing to stdout
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<T, W: Write> PrintSink<T, W> {
    /// Create a print sink writing to `writer`
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            prefix: None,
            _phantom: PhantomData,
        }
    }

    /// Print `prefix` before each item
    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<T, W> Sink for PrintSink<T, W>
where
    T: Send + 'static + Display,
    W: Write + Send,
{
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        match &self.prefix {
            Some(prefix) => writeln!(self.writer, "{}{}", prefix, item)?,
            None => writeln!(self.writer, "{}", item)?,
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<T> Default for PrintSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A sink that collects items into a vector.
pub struct CollectSink<T> {
    /// The vector to collect items into
    items: Arc<TokioMutex<Vec<T>>>,
}

impl<T: Send + 'static + Clone> CollectSink<T> {
    /// Create a new collect sink
    pub fn new() -> Self {
        Self {
            items: Arc::new(TokioMutex::new(Vec::new())),
        }
    }

    /// Get a clone of the items Arc for external access
    pub fn items(&self) -> Arc<TokioMutex<Vec<T>>> {
        self.items.clone()
    }
}

#[async_trait]
impl<T: Send + 'static + Clone> Sink for CollectSink<T> {
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        self.items.lock().await.push(item);
        Ok(())
    }
}

impl<T: Send + 'static + Clone> Default for CollectSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CollectSink<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

/// Helper function to create a sink from a function
pub fn sink_from_fn<F, T>(f: F) -> FnSink<F, T>
where
    F: FnMut(T) -> Result<()> + Send,
    T: Send + 'static,
{
    FnSink {
        f,
        _phantom: PhantomData,
    }
}

/// A sink created from a function
pub struct FnSink<F, T> {
    f: F,
    _phantom: PhantomData<fn(T)>,
}

#[async_trait]
impl<F, T> Sink for FnSink<F, T>
where
    F: FnMut(T) -> Result<()> + Send,
    T: Send + 'static,
{
    type Item = T;

    async fn write(&mut self, item: Self::Item) -> Result<()> {
        (self.f)(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::handoff;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_run_sees_items_in_order() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff(&token);
        tokio::spawn(async move {
            for n in 1..=5_u64 {
                outlet.send(n).await.unwrap();
            }
        });

        let mut seen = Vec::new();
        let count = run(inlet, |n| seen.push(n)).await;

        assert_eq!(count, 5);
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_run_returns_on_cancellation() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff::<u64>(&token);
        outlet.send(1).await.unwrap();
        token.cancel();

        let count = run(inlet, |_| {}).await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_drain_into_collect_sink() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff(&token);
        tokio::spawn(async move {
            for word in ["a", "b", "c"] {
                outlet.send(word.to_string()).await.unwrap();
            }
        });

        let mut sink = CollectSink::new();
        let items = sink.items();
        let written = drain(inlet, &mut sink).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(*items.lock().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_drain_propagates_sink_errors() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff(&token);
        tokio::spawn(async move {
            let _ = outlet.send(1_u64).await;
        });

        let mut sink = sink_from_fn(|_n: u64| Err(Error::custom("disk full")));
        let err = drain(inlet, &mut sink).await.unwrap_err();
        assert_eq!(err, Error::custom("disk full"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_print_sink_writes_lines() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff(&token);
        tokio::spawn(async move {
            for n in 1..=3_u64 {
                outlet.send(n).await.unwrap();
            }
        });

        let mut sink = PrintSink::with_writer(Vec::<u8>::new()).with_prefix("> ");
        let written = drain(inlet, &mut sink).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(sink.into_writer(), b"> 1\n> 2\n> 3\n");
    }

    #[tokio::test]
    async fn test_print_sink_reports_closed_pipe() {
        let token = CancellationToken::new();
        let (outlet, inlet) = handoff(&token);
        let producer = tokio::spawn(async move {
            let mut n = 0_u64;
            loop {
                n += 1;
                if let Err(e) = outlet.send(n).await {
                    return e;
                }
            }
        });

        let mut sink = PrintSink::with_writer(ClosedPipe);
        let err = drain(inlet, &mut sink).await.unwrap_err();
        assert!(err.is_broken_pipe(), "unexpected error {:?}", err);

        // The reader is gone, so the producer is told to stop.
        assert_eq!(producer.await.unwrap(), Error::Disconnected);
    }
}
