//! # Example: gate_contrast
//!
//! Show what the shared exclusive execution gate costs when a blocking wait
//! refuses to let go of it.
//!
//! Spawns N threads calling the lock-retaining one-second wait (they
//! serialize to ≈ N seconds), then N threads calling the lock-releasing
//! variant (they overlap and finish in ≈ 1 second).
//!
//! ## Run
//! ```bash
//! cargo run --example gate_contrast
//! ```

use std::thread;
use std::time::Instant;

use jobvisor::{block_for_one_second, sleep_for_one_second, ExecGate};

const THREADS: usize = 3;

fn timed(label: &str, gate: &ExecGate, wait: fn(&ExecGate)) {
    let started = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let gate = gate.clone();
            thread::spawn(move || wait(&gate))
        })
        .collect();
    for handle in handles {
        handle.join().expect("waiter panicked");
    }
    println!("{label}: {THREADS} threads took {:?}", started.elapsed());
}

fn main() {
    let gate = ExecGate::new();
    timed("retaining (block_for_one_second)", &gate, block_for_one_second);
    timed("releasing (sleep_for_one_second)", &gate, sleep_for_one_second);
}
