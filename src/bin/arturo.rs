use std::{
    fs,
    io::{self, Read as _, Write as _},
    path::PathBuf,
};

use clap::Parser;
use miette::{IntoDiagnostic as _, WrapErr as _};

#[derive(Parser, Debug)]
#[command(name = "arturo", version, about = "Render an arturo script to SVG")]
struct Cli {
    /// Script to render. Reads stdin when omitted.
    source: Option<PathBuf>,

    /// Output SVG path. Writes to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Draw every child of each `tile` instead of only the first.
    #[arg(long)]
    tile_all: bool,
}

fn main() -> miette::Result<()> {
    // Logs go to stderr; stdout may carry the SVG.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let (name, source) = read_source(cli.source.as_deref())?;
    let options = arturo::RenderOptions {
        tile_all: cli.tile_all,
    };
    tracing::debug!(name = %name, tile_all = options.tile_all, "rendering");

    let svg = arturo::arturo_with_options(&name, &source, &options)?;

    match cli.output {
        Some(path) => fs::write(&path, svg)
            .into_diagnostic()
            .wrap_err_with(|| format!("write output '{}'", path.display())),
        None => io::stdout()
            .write_all(svg.as_bytes())
            .into_diagnostic()
            .wrap_err("write output to stdout"),
    }
}

fn read_source(path: Option<&std::path::Path>) -> miette::Result<(String, String)> {
    match path {
        Some(path) => {
            let source = fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("read script '{}'", path.display()))?;
            Ok((path.display().to_string(), source))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .into_diagnostic()
                .wrap_err("read script from stdin")?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}
