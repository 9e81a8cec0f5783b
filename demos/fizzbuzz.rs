//! Composes a pipeline by hand, stops it from the outside after a while, and
//! reports how every stage ended.

use std::time::Duration;

use fizzpipe::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Fizz buzz, limited ===");

    Pipeline::new(Generator::new())
        .filter(LimitFilter::new(15))
        .filter(TagFilter::new(3, "fizz")?)
        .filter(TagFilter::new(5, "buzz")?)
        .sink(PrintSink::new().with_prefix("  "))
        .await?;

    println!("\n=== Endless, cancelled from outside ===");

    let token = CancellationToken::new();
    let mut running = Pipeline::new(Generator::new())
        .filter(TagFilter::new(3, "fizz")?)
        .filter(TagFilter::new(5, "buzz")?)
        .with_cancellation(token.clone())
        .spawn();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        canceller.cancel();
    });

    let mut seen = 0_u64;
    while let Some(value) = running.next().await {
        seen += 1;
        if seen % 10_000 == 0 {
            println!("  ... {} values so far, latest {}", seen, value);
        }
    }
    println!("  saw {} values before cancellation", seen);

    for (stage, outcome) in running.join().await {
        println!("  {:<16} {:?}", stage, outcome);
    }

    Ok(())
}
