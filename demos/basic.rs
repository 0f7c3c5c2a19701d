//! Guards a flaky simulated service with a breaker.
//!
//! Run with `RUST_LOG=debug cargo run --example basic` to see the breaker's
//! log events alongside the demo output.

use backoff_breaker::{Breaker, State};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct ServiceError(u16);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let attempts = Arc::new(AtomicU32::new(0));

    let breaker = Breaker::<ServiceError>::builder()
        .name("flaky-service")
        .call_timeout(Duration::from_secs(2))
        .max_retries(2)
        .retry_interval(Duration::from_millis(300))
        .exponential_backoff(false)
        .reset_timeout(Duration::from_secs(1))
        .on_call({
            let attempts = Arc::clone(&attempts);
            move |breaker| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                println!("Attempt {} (state: {})", attempt, breaker.state());

                let breaker = breaker.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    // First three attempts fail, then the service recovers
                    if attempt <= 3 {
                        breaker.failure(Some(ServiceError(503)));
                    } else {
                        breaker.success();
                        println!("Service responded, breaker is {}", breaker.state());
                    }
                });
            }
        })
        .on_trip(|breaker, error| {
            println!(
                "Tripped after {} failures, last error: {:?}",
                breaker.failure_count(),
                error
            );
        })
        .build()
        .expect("built inside a Tokio runtime");

    breaker.execute();
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("Waiting for cooldown, breaker is {}", breaker.state());
    while breaker.state() == State::Open {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    breaker.execute();
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("Final state: {}", breaker.state());
}
