//! Watermark a single photo.
//!
//! Usage:
//! ```sh
//! cargo run --example apply_watermark -- photo.jpg logo.png output.jpg [x,y]
//! ```

use std::env;
use std::path::Path;
use std::process;

use photo_watermark::{watermark_file, Placement, WatermarkOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <photo> <watermark> <output> [x,y]", args[0]);
        process::exit(1);
    }

    let placement: Placement = match args.get(4).map(|s| s.parse()).transpose() {
        Ok(p) => p.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match watermark_file(
        Path::new(&args[1]),
        Path::new(&args[2]),
        Path::new(&args[3]),
        placement,
        WatermarkOptions::default(),
    ) {
        Ok(()) => println!("Done: {}", args[3]),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
