//! `divinity` binary entry point.
//!
//! ```bash
//! # JSON content under ./data
//! cargo run -p divinity-client
//!
//! # Mirror the JSON content into SQLite, then load from the database
//! DIVINITY_BACKEND=sqlite DIVINITY_MIGRATE=1 cargo run -p divinity-client
//! ```

use std::io::{self, Write};

use anyhow::Result;
use divinity_client::{ClientConfig, demo, logging};
use game_core::PcgRng;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    let _guard = logging::setup_logging(&config)?;

    let seed = config.seed_or_clock();
    tracing::info!(
        backend = %config.backend,
        data_dir = %config.data_dir.display(),
        seed,
        "starting divinity client"
    );

    let ctx = demo::build_context(&config)?;
    let mut rng = PcgRng::new(seed);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    demo::print_inventory(&ctx, &mut out)?;
    demo::print_variants(&ctx, &mut rng, &mut out)?;
    let outcome = demo::run_encounter(&ctx, &mut rng, &mut out)?;
    writeln!(out, "\nseed {seed}")?;
    out.flush()?;

    tracing::info!(%outcome, "client finished");
    Ok(())
}
