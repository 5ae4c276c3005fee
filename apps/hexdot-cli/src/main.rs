//! hexdot - hexagonal dot arrays for CleWin CIF designs
//!
//! Usage:
//!   hexdot run <job.json>
//!   hexdot array -d 5 -p 15 --x0 -500 --x1 500 --y0 -500 --y1 500 -o design.cif
//!   hexdot array ... --quadrant top-right --in-circle 0 0 500 --layer L1
//!   hexdot preview -d 4 -p 12 --x0 -6 --x1 6 --y0 -6 --y1 6

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

use hexdot_core::filter::{self, BoxedFilter, Quadrant};
use hexdot_core::ArrayBatch;
use hexdot_io::cif::DEFAULT_LAYER;
use hexdot_io::{ArrayJob, CifWriter, TemplateSource};

/// Generate hexagonal arrays of circular dots into CleWin .cif files
#[derive(Parser, Debug)]
#[command(name = "hexdot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Only report warnings and errors
    #[arg(short, long, global = true, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a JSON job file describing one or more arrays
    Run {
        /// Job file
        #[arg(value_name = "JOB")]
        job: PathBuf,
    },

    /// Generate one array and splice it into a .cif file
    Array {
        #[command(flatten)]
        array: ArrayArgs,

        /// Output .cif file; also used as template when it exists
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Layer to write to (CleWin defaults are L0, L1, ...)
        #[arg(short, long, default_value = DEFAULT_LAYER)]
        layer: String,

        /// Template to read instead of the output file
        #[arg(short, long, value_name = "TEMPLATE", conflicts_with = "blank")]
        template: Option<PathBuf>,

        /// Start from the blank document, replacing any existing output
        #[arg(long)]
        blank: bool,
    },

    /// Print the spliced document instead of writing it
    Preview {
        #[command(flatten)]
        array: ArrayArgs,

        /// Layer to write to
        #[arg(short, long, default_value = DEFAULT_LAYER)]
        layer: String,

        /// Template to splice into (defaults to the blank document)
        #[arg(short, long, value_name = "TEMPLATE")]
        template: Option<PathBuf>,
    },
}

/// Geometry and filters of a single array. Lengths in µm.
#[derive(Args, Debug)]
struct ArrayArgs {
    /// Dot diameter
    #[arg(short, long)]
    diameter: f64,

    /// Center-to-center spacing
    #[arg(short, long)]
    pitch: f64,

    #[arg(long, allow_negative_numbers = true)]
    x0: f64,

    #[arg(long, allow_negative_numbers = true)]
    x1: f64,

    #[arg(long, allow_negative_numbers = true)]
    y0: f64,

    #[arg(long, allow_negative_numbers = true)]
    y1: f64,

    /// Keep only dots inside this quadrant (top-right, bottom-right, bottom-left, top-left)
    #[arg(long)]
    quadrant: Option<Quadrant>,

    /// Keep only dots inside a circle (repeatable)
    #[arg(long, num_args = 3, value_names = ["X", "Y", "R"], allow_negative_numbers = true)]
    in_circle: Vec<f64>,

    /// Drop dots touching a circle (repeatable)
    #[arg(long, num_args = 3, value_names = ["X", "Y", "R"], allow_negative_numbers = true)]
    outside_circle: Vec<f64>,

    /// Drop dots overlapping an x interval (repeatable)
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"], allow_negative_numbers = true)]
    not_in_x: Vec<f64>,

    /// Drop dots overlapping a y interval (repeatable)
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"], allow_negative_numbers = true)]
    not_in_y: Vec<f64>,

    /// Drop dots inside a cross of this width centered on the origin
    #[arg(long)]
    center_cross: Option<f64>,
}

impl ArrayArgs {
    fn filters(&self) -> Vec<BoxedFilter> {
        let mut filters: Vec<BoxedFilter> = Vec::new();
        if let Some(q) = self.quadrant {
            filters.push(Box::new(filter::in_quadrant(q)));
        }
        for c in self.in_circle.chunks_exact(3) {
            filters.push(Box::new(filter::in_circle(c[0], c[1], c[2])));
        }
        for c in self.outside_circle.chunks_exact(3) {
            filters.push(Box::new(filter::outside_circle(c[0], c[1], c[2])));
        }
        for r in self.not_in_x.chunks_exact(2) {
            filters.push(Box::new(filter::not_in_x_range(r[0], r[1])));
        }
        for r in self.not_in_y.chunks_exact(2) {
            filters.push(Box::new(filter::not_in_y_range(r[0], r[1])));
        }
        if let Some(width) = self.center_cross {
            filters.push(Box::new(filter::not_in_center_cross(width)));
        }
        filters
    }

    fn build_batch(&self, name: &str) -> Result<ArrayBatch> {
        let mut batch = ArrayBatch::new(name);
        let array = batch
            .add_array(
                self.diameter,
                self.pitch,
                self.x0,
                self.x1,
                self.y0,
                self.y1,
                &self.filters(),
            )
            .context("Failed to generate array")?;
        info!("Generated {} dots ({})", array.len(), array.label());
        Ok(batch)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LevelFilter::Trace
    } else if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Run { job } => cmd_run(job, cli.quiet),
        Commands::Array {
            array,
            output,
            layer,
            template,
            blank,
        } => cmd_array(array, output, layer, template, blank, cli.quiet),
        Commands::Preview {
            array,
            layer,
            template,
        } => cmd_preview(array, layer, template),
    }
}

fn cmd_run(job_path: PathBuf, quiet: bool) -> Result<()> {
    let job = ArrayJob::load(&job_path)
        .with_context(|| format!("Failed to load job file: {}", job_path.display()))?;
    if job.arrays.is_empty() {
        bail!("Job file {} lists no arrays", job_path.display());
    }
    let batch = job
        .run(quiet)
        .with_context(|| format!("Failed to write {}", job.output.display()))?;
    info!(
        "{} arrays, {} dots written to {}",
        batch.array_count(),
        batch.feature_count(),
        job.output.display()
    );
    Ok(())
}

fn cmd_array(
    array: ArrayArgs,
    output: PathBuf,
    layer: String,
    template: Option<PathBuf>,
    blank: bool,
    quiet: bool,
) -> Result<()> {
    let name = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let batch = array.build_batch(&name)?;

    let mut writer = CifWriter::new(&output).with_layer(&layer).silent(quiet);
    if blank {
        writer = writer.use_blank();
    } else if let Some(template) = template {
        writer = writer.with_read_path(template);
    }

    writer
        .write_batch(&batch)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn cmd_preview(array: ArrayArgs, layer: String, template: Option<PathBuf>) -> Result<()> {
    let batch = array.build_batch("preview")?;
    let source = match template {
        Some(path) => TemplateSource::Required(path),
        None => TemplateSource::Blank,
    };
    let document = source.load().context("Failed to load template")?;
    print!("{}", hexdot_io::splice_batch(&document, &layer, &batch));
    Ok(())
}
