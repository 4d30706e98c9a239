use crate::cli::args::Cli;
use crate::core::config::ReportConfig;
use crate::core::counter::SamtoolsCounter;
use crate::core::engine::{self, Collaborators};
use crate::core::external::{SystemRunner, WgetFetcher};
use crate::report::zip::ZipArchiver;
use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use tracing::{debug, info};

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let cwd = env::current_dir().context("failed to determine the current directory")?;
    let cfg = ReportConfig::from_cli(&cli, &cwd).context("invalid arguments")?;
    debug!(?cfg, "resolved configuration");

    let counter = SamtoolsCounter::new(SystemRunner);
    let fetcher = WgetFetcher::new(SystemRunner);
    let deps = Collaborators {
        counter: &counter,
        fetcher: &fetcher,
        archiver: &ZipArchiver,
    };
    let output = engine::run(&cfg, &deps)?;
    info!(
        report = %output.report.display(),
        archive = %output.archive.display(),
        total_alignments = ?output.total_alignments,
        elapsed = %engine::fmt_dur(output.elapsed),
        "mapping QC report done"
    );
    Ok(())
}

fn level(cli: &Cli) -> tracing::Level {
    if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

fn init_logging(cli: &Cli) {
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level(cli))
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_selects_level() {
        let mut cli = Cli::default();
        assert_eq!(level(&cli), tracing::Level::INFO);
        cli.verbose = true;
        assert_eq!(level(&cli), tracing::Level::DEBUG);
        cli.verbose = false;
        cli.quiet = true;
        assert_eq!(level(&cli), tracing::Level::ERROR);
    }
}
