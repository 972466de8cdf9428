//! teller — a single-server bank driven by the `des` scheduling kernel.
//!
//! Customers arrive at exponentially distributed intervals and queue for one
//! teller.  Every `BREAK_EVERY` seconds the teller steps away; the service
//! completion of whoever is at the window is suspended for the length of the
//! break and resumed afterwards with its remaining time intact.
//!
//! Logging is controlled by `RUST_LOG` (default `teller=info,des_engine=info`).
//! Every dispatch is traced to `output/teller/dispatch_trace.csv`.

mod bank;

use std::path::Path;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use des_core::{CoreResult, Duration, Instant, SimConfig};
use des_engine::Queue;
use des_output::{CsvTraceWriter, TraceObserver};

use bank::{Bank, BankParams};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:              u64 = 42;
const SHIFT_SECS:        f64 = 8.0 * 3_600.0; // one working day
const MEAN_INTERARRIVAL: f64 = 90.0;
const MEAN_SERVICE:      f64 = 75.0;
const BREAK_EVERY:       f64 = 2.0 * 3_600.0;
const BREAK_LENGTH:      f64 = 15.0 * 60.0;
const OUTPUT_DIR:        &str = "output/teller";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teller=info,des_engine=info".into()),
        )
        .with(fmt::layer())
        .init();

    println!("=== teller — des scheduling kernel ===");
    println!("Shift: {SHIFT_SECS} s  |  Seed: {SEED}");
    println!();

    // 1. Queue with a closing time.
    let config = SimConfig {
        stop_at: Some(Instant::from_secs(SHIFT_SECS)?),
        seed:    SEED,
        ..SimConfig::default()
    };
    let queue = Queue::with_config(config);

    // 2. Model.
    let bank = Bank::shared(BankParams {
        mean_interarrival: Duration::from_secs(MEAN_INTERARRIVAL)?,
        mean_service:      Duration::from_secs(MEAN_SERVICE)?,
        break_every:       Duration::from_secs(BREAK_EVERY)?,
        break_length:      Duration::from_secs(BREAK_LENGTH)?,
    })?;
    bank::open(&queue, &bank)?;

    // 3. Trace output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let mut obs = TraceObserver::new(CsvTraceWriter::new(Path::new(OUTPUT_DIR))?);

    // 4. Run.
    let t0 = std::time::Instant::now();
    let summary = queue.run(&mut obs);
    let elapsed = t0.elapsed();
    let rows = obs.rows_written();
    obs.finish()?;
    let stats = bank.borrow_mut().close();

    // 5. Summary.
    println!("Stopped: {:?} at {} after {:.3} s", summary.reason, summary.now, elapsed.as_secs_f64());
    println!("  dispatch_trace.csv : {rows} rows");
    println!();
    println!("{:<22} {:>10}", "Metric", "Value");
    println!("{}", "-".repeat(33));
    println!("{:<22} {:>10}", "customers arrived", stats.arrived);
    println!("{:<22} {:>10}", "customers served", stats.served);
    println!("{:<22} {:>10}", "left at closing", stats.left_over);
    println!("{:<22} {:>10}", "breaks taken", stats.breaks);
    println!("{:<22} {:>10}", "services paused", stats.interrupted);
    println!("{:<22} {:>10}", "mean line on arrival", stat(stats.line.mean()));
    println!("{:<22} {:>10}", "longest line", stat(stats.line.maximum()));
    println!("{:<22} {:>10}", "mean wait (s)", stat(stats.waits.summary().mean()));
    println!("{:<22} {:>10}", "wait std dev (s)", stat(stats.waits.summary().std_deviation()));
    println!("{:<22} {:>10}", "longest wait (s)", stat(stats.waits.summary().maximum()));
    println!();

    // 6. Wait-time distribution.
    println!("{:<14} {:>10}", "Wait (min)", "Customers");
    println!("{}", "-".repeat(25));
    let waits = &stats.waits;
    for (i, count) in waits.bins().iter().enumerate() {
        let from = waits.bin_start(i) / 60.0;
        let to = (waits.bin_start(i) + waits.bin_width()) / 60.0;
        println!("{:<14} {:>10}", format!("{from:.0}-{to:.0}"), count);
    }
    println!("{:<14} {:>10}", "longer", waits.overflow());

    Ok(())
}

/// Format a statistic that may be undefined for too few observations.
fn stat(value: CoreResult<f64>) -> String {
    value.map_or_else(|_| "n/a".to_owned(), |v| format!("{v:.1}"))
}
