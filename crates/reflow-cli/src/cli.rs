use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Convert PDFs to flowing documents, and plain content back to PDF.
#[derive(Debug, Parser)]
#[command(name = "reflow", about, version)]
pub struct Cli {
    /// Log progress and diagnostics to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a PDF, DOCX, TXT, CSV, TSV or spreadsheet (XLSX, XLS, ODS) file
    Convert {
        /// Path to the input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target format
        #[arg(long, value_enum)]
        to: TargetArg,

        /// Output path. Default: the input path with the target extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON options file; flags below override it
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Standard PDF font for paginated output (e.g. Helvetica, Courier)
        #[arg(long)]
        font: Option<String>,

        /// Font size in points for paginated output
        #[arg(long)]
        font_size: Option<f64>,

        /// Margin in points applied to all four sides
        #[arg(long)]
        margin: Option<f64>,
    },

    /// Print the positioned text and image elements of a PDF as JSON lines
    Elements {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Added to every image's y coordinate
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
    },
}

/// Output format for the convert subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Docx,
    Pdf,
    Json,
    Xlsx,
}

impl From<TargetArg> for reflow::TargetFormat {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Docx => reflow::TargetFormat::Docx,
            TargetArg::Pdf => reflow::TargetFormat::Pdf,
            TargetArg::Json => reflow::TargetFormat::Json,
            TargetArg::Xlsx => reflow::TargetFormat::Xlsx,
        }
    }
}
