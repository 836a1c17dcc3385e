//! Generate CALCULATORS.md from the calculator registry.
//!
//! This binary generates the calculator reference documentation from the
//! registry in biostat_core.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin gen-calculators
//! ```
//!
//! The generated file is written to `biostat_core/CALCULATORS.md`.

use std::fs;
use std::path::Path;

use biostat_core::registry::generate_calculators_markdown;

fn main() {
    println!("Generating CALCULATORS.md...");

    let markdown = generate_calculators_markdown();

    // Relative to the workspace root
    let output_path = Path::new("biostat_core/CALCULATORS.md");

    match fs::write(output_path, &markdown) {
        Ok(()) => {
            println!("Successfully wrote {} bytes to {}", markdown.len(), output_path.display());
        }
        Err(e) => {
            eprintln!("Error writing file: {}", e);
            std::process::exit(1);
        }
    }
}
