//! Utils

use clap::Parser;

/// Arguments for the checkout examples
#[derive(Debug, Parser)]
pub struct ExampleCheckoutArgs {
    /// Checkout fixture to price
    #[clap(short, long, default_value = "basic")]
    pub fixture: String,

    /// Directory holding the fixture sets
    #[clap(short, long, default_value = "./fixtures")]
    pub base_path: String,

    /// Treat delivery as already free, whatever the fixture says
    #[clap(long)]
    pub free_delivery: bool,
}
