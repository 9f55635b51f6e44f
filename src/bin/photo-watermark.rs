use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use photo_watermark::{
    default_output_path, Placement, ProcessResult, WatermarkOptions, Watermarker,
};

#[derive(Parser)]
#[command(
    name = "photo-watermark",
    about = "Overlay a scaled, semi-transparent watermark image onto photos",
    version,
    after_help = "Simple usage: photo-watermark <photo> -w <logo.png>  (writes {name}_watermarked.{ext})\n\n\
                  The watermark is shrunk to at most 20% of the photo's width and height.\n\
                  Positions past the right/bottom edge are pulled back inside the photo;\n\
                  negative positions are kept and clip the watermark."
)]
struct Cli {
    /// Input photo file or directory
    input: PathBuf,

    /// Watermark image file
    #[arg(short, long)]
    watermark: PathBuf,

    /// Output file or directory (default: {name}_watermarked.{ext})
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Watermark position as x,y (top-left corner, in pixels)
    #[arg(short, long, default_value = "0,0", allow_hyphen_values = true)]
    position: String,

    /// Watermark opacity multiplier (0.0-1.0)
    #[arg(long, default_value_t = photo_watermark::compositor::DEFAULT_OPACITY)]
    opacity: f32,

    /// Maximum watermark size as a fraction of the photo (0.0-1.0]
    #[arg(long, default_value_t = photo_watermark::compositor::DEFAULT_MAX_FRACTION)]
    max_fraction: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let placement: Placement = match cli.position.parse() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let options = WatermarkOptions {
        opacity: cli.opacity,
        max_fraction: cli.max_fraction,
        ..WatermarkOptions::default()
    };

    if !cli.input.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input.display());
        process::exit(1);
    }

    let marker = match Watermarker::open(&cli.watermark, options) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Fatal: Failed to load watermark: {e}");
            process::exit(1);
        }
    };

    let (wm_w, wm_h) = marker.dimensions();
    log::debug!(
        "watermark {}: {wm_w}x{wm_h}, opacity {}, max fraction {}",
        cli.watermark.display(),
        marker.options().opacity,
        marker.options().max_fraction,
    );

    let results = if cli.input.is_dir() {
        let Some(output_dir) = &cli.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: photo-watermark <input_dir> -w <watermark> -o <output_dir>");
            process::exit(1);
        };
        marker.process_directory(&cli.input, output_dir, placement)
    } else {
        let output_path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&cli.input));
        vec![marker.process_file(&cli.input, &output_path, placement)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.verbose, cli.quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, verbose: bool, quiet: bool) {
    if quiet && result.success {
        return;
    }

    let filename = file_label(&result.path);

    if result.success {
        match (result.watermark_size, result.placement) {
            (Some((w, h)), Some(p)) => eprintln!("[OK] {filename} ({w}x{h} at {p})"),
            _ => eprintln!("[OK] {filename}"),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
