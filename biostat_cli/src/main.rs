//! # Biostat CLI
//!
//! Command-line front end for the calculation engine: list calculators,
//! inspect one, run it from `key=value` arguments or a JSON request file,
//! and regenerate the calculator reference.
//!
//! ```text
//! biostat list
//! biostat show two-sample-t
//! biostat run two-sample-t mean1=75 mean2=70 sd1=15 sd2=15 alpha=0.05 power=0.8 ratio=1
//! biostat --format json run --file request.json
//! ```

mod command;
mod report;
mod settings;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
