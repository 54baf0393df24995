//! CLI argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Weft - asynchronous template expansion engine")]
#[command(
    long_about = r#"Weft - asynchronous template expansion engine

USAGE:
  weft page.tpl                            # Render with an empty parameter set
  weft page.tpl --params data.json         # Parameters from a JSON file
  weft page.tpl --params-json '{"x": 1}'   # Inline JSON parameters
  weft page.tpl --root templates --strict  # Strict mode below a template root

Warnings go to stderr; the rendered document goes to stdout or --output."#
)]
#[command(version)]
pub struct Cli {
    /// Template file to render, relative to the template root
    pub template: String,

    /// JSON file holding the parameter set
    #[arg(long, conflicts_with = "params_json")]
    pub params: Option<PathBuf>,

    /// Inline JSON parameter set
    #[arg(long = "params-json")]
    pub params_json: Option<String>,

    /// Template root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Fail on missing parameters and evaluation errors
    #[arg(long)]
    pub strict: bool,

    /// Tag start delimiter
    #[arg(long, default_value = "[%")]
    pub tag_open: String,

    /// Tag end delimiter
    #[arg(long, default_value = "%]")]
    pub tag_close: String,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
