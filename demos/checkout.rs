//! Checkout Example
//!
//! This example prices a checkout fixture: it loads the basket, delivery options and discount
//! rules, runs the discount calculation and prints the resulting report.
//!
//! Use `-f` to load a fixture set by name
//! Use `-b` to point at another fixtures directory
//! Use `--free-delivery` to price as if delivery were already free
//!
//! Set `RUST_LOG=cascade=debug` to see why each discount was kept or dropped.

use std::{io, time::Instant};

use anyhow::Result;

use cascade::{engine::DiscountCalculator, fixtures::Fixture, utils::ExampleCheckoutArgs};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = ExampleCheckoutArgs::parse();

    let mut fixture = Fixture::with_base_path(&args.base_path);

    fixture.load_checkout(&args.fixture)?;

    let mut ctx = fixture.pricing_context()?;

    if args.free_delivery {
        ctx = ctx.with_free_delivery(true);
    }

    let calculator = DiscountCalculator::new(fixture.discount_source()?);

    let start = Instant::now();
    let report = calculator.calculate(&mut ctx)?;
    let elapsed = start.elapsed().as_secs_f32();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match report {
        Some(report) => report.write_to(&mut handle)?,
        None => println!("Payment does not need a discount calculation"),
    }

    println!("\nCalculated in {elapsed}s");

    Ok(())
}
