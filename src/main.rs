use anyhow::{Context, Result};
use clap::Parser;
use profsheet::{cli::Cli, report::ReportSynthesizer, workbook};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber
///
/// Per-document diagnostics are warnings, so they show by default; `--debug`
/// raises the level to trace. `RUST_LOG` overrides the default.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.report_config()?;
    tracing::debug!(?config, "report configuration");

    let mut synthesizer = ReportSynthesizer::new(&config, args.files.len())?;
    for file in &args.files {
        synthesizer.add_path(file)?;
    }
    if synthesizer.sheet_count() == 0 {
        tracing::warn!("no usable input; writing an empty report");
    }

    let model = synthesizer.finish();
    workbook::save(&model, &args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    Ok(())
}
