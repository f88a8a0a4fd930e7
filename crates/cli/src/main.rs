use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pdfdesk_core::naming::{output_file_name, Operation};
use pdfdesk_core::{
    apply_overlays, default_range_expression, extract_range, merge_documents, page_count,
    rotate_pages, PdfDocument, RotationDelta, RotationMap,
};
use std::fs;
use std::path::{Path, PathBuf};

mod plan;

#[derive(Parser)]
#[command(
    name = "pdfdesk",
    about = "Merge, split, rotate and annotate PDF files",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge PDFs into one, in the order given
    Merge {
        /// Input PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file path (defaults to merged-document.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract a page range into a new PDF
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Pages to keep, e.g. "1, 3-5, 8" (defaults to every page)
        #[arg(short, long)]
        pages: Option<String>,

        /// Output file path (defaults to split-<input>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rotate pages by quarter turns
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Rotate one page, as PAGE:DEGREES with a 1-based page (e.g. 2:90, 3:-90)
        #[arg(long = "page", value_name = "PAGE:DEGREES", value_parser = parse_page_rotation)]
        pages: Vec<(usize, RotationDelta)>,

        /// Rotate every page by DEGREES
        #[arg(long, value_name = "DEGREES", allow_negative_numbers = true, value_parser = parse_delta)]
        all: Option<RotationDelta>,

        /// Output file path (defaults to rotated-<input>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw the images and text of a JSON overlay plan
    Overlay {
        /// Input PDF file
        input: PathBuf,

        /// Overlay plan (JSON)
        #[arg(long)]
        plan: PathBuf,

        /// Output file path (defaults to edited-<input>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show page count, sizes and rotations
    Info {
        /// Input PDF file
        input: PathBuf,
    },
}

fn parse_delta(value: &str) -> std::result::Result<RotationDelta, String> {
    let degrees: i32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of degrees"))?;
    RotationDelta::new(degrees).map_err(|e| e.to_string())
}

fn parse_page_rotation(value: &str) -> std::result::Result<(usize, RotationDelta), String> {
    let (page, degrees) = value
        .split_once(':')
        .ok_or_else(|| format!("'{value}' is not PAGE:DEGREES"))?;
    let page: usize = page
        .trim()
        .parse()
        .map_err(|_| format!("'{page}' is not a page number"))?;
    if page == 0 {
        return Err("page numbers start at 1".to_string());
    }
    Ok((page - 1, parse_delta(degrees)?))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Explicit output path, or the conventional name next to the input
fn output_path(output: Option<PathBuf>, operation: Operation, input: &Path) -> PathBuf {
    output.unwrap_or_else(|| {
        let name = output_file_name(operation, input.file_name().and_then(|n| n.to_str()));
        input.with_file_name(name)
    })
}

fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Merge { files, output } => {
            let documents = files
                .iter()
                .map(|path| read_pdf(path))
                .collect::<Result<Vec<_>>>()?;
            let merged = merge_documents(&documents).context("Merge failed")?;

            let output =
                output.unwrap_or_else(|| PathBuf::from(output_file_name(Operation::Merge, None)));
            write_pdf(&output, &merged)?;
        }

        Commands::Split {
            input,
            pages,
            output,
        } => {
            let bytes = read_pdf(&input)?;
            let expression = match pages {
                Some(expression) => expression,
                None => default_range_expression(page_count(&bytes)?),
            };
            let extracted = extract_range(&bytes, &expression)
                .with_context(|| format!("Cannot extract pages '{expression}'"))?;

            write_pdf(&output_path(output, Operation::Split, &input), &extracted)?;
        }

        Commands::Rotate {
            input,
            pages,
            all,
            output,
        } => {
            if pages.is_empty() && all.is_none() {
                bail!("Nothing to rotate: pass --page PAGE:DEGREES or --all DEGREES");
            }

            let bytes = read_pdf(&input)?;
            let mut rotations: RotationMap = pages.into_iter().collect();
            if let Some(delta) = all {
                rotations.rotate_all(page_count(&bytes)?, delta);
            }
            let rotated = rotate_pages(&bytes, &rotations).context("Rotate failed")?;

            write_pdf(&output_path(output, Operation::Rotate, &input), &rotated)?;
        }

        Commands::Overlay {
            input,
            plan,
            output,
        } => {
            let json = fs::read_to_string(&plan)
                .with_context(|| format!("Failed to read {}", plan.display()))?;
            let overlay_plan = plan::parse_overlay_plan(&json)?;
            let rendered_width = overlay_plan.rendered_width;
            let base_dir = plan.parent().unwrap_or_else(|| Path::new("."));
            let overlays = overlay_plan.into_overlays(base_dir)?;

            let bytes = read_pdf(&input)?;
            let edited = apply_overlays(&bytes, &overlays, rendered_width)
                .context("Applying overlays failed")?;

            write_pdf(&output_path(output, Operation::Overlay, &input), &edited)?;
        }

        Commands::Info { input } => {
            let bytes = read_pdf(&input)?;
            let doc = PdfDocument::open_from_bytes(&bytes)
                .with_context(|| format!("Cannot open {}", input.display()))?;

            println!("File: {}", input.display());
            println!("Pages: {}", doc.page_count());
            for page in 0..doc.page_count() {
                let size = doc.page_size(page)?;
                let rotation = doc.page_rotation(page)?;
                println!(
                    "  Page {}: {:.2} x {:.2} pt, rotated {}°",
                    page + 1,
                    size.width,
                    size.height,
                    rotation
                );
            }
        }
    }

    Ok(())
}
