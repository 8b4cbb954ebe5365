//! # Example: count_progress
//!
//! Launch a counting job and watch it live from the launching thread.
//!
//! Demonstrates how to:
//! - Configure a [`Count`] input and hand it to [`launch`].
//! - Poll `state`, `output.last`, and `elapsed` while the worker runs.
//! - Collect the final result with [`Job::wait_for_result`].
//!
//! ## Run
//! ```bash
//! cargo run --example count_progress
//! ```

use std::thread;
use std::time::Duration;

use jobvisor::{launch, Count};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobvisor=debug".into()),
        )
        .init();

    let input = Count {
        start: 1,
        end: 10,
        delay_ms: 200,
        ..Count::default()
    };
    println!("launching {input}");

    let job = launch(input)?;
    while !job.finished() {
        println!(
            "[{}] last={} elapsed={:?}",
            job.state(),
            job.output().last(),
            job.elapsed()
        );
        thread::sleep(Duration::from_millis(250));
    }

    let ok = job.wait_for_result(None);
    println!(
        "done: result={ok} last={} elapsed={:?}",
        job.output().last(),
        job.elapsed()
    );
    Ok(())
}
