use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use result_combiner::config::combiner_config::{Config, ExistingResultAction};
use result_combiner::confirm::TerminalConfirm;
use result_combiner::run;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Merges per-worker result files, zipped or plain, into one labeled file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML settings file; flags given here take precedence over it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory where the result file will be.
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// Directory under which the data files are.
    #[arg(short, long)]
    targetdir: Option<PathBuf>,

    /// Name of the staging directory under the working directory.
    #[arg(short = 'i', long)]
    tmpdir: Option<String>,

    /// Name of the result file under the working directory.
    #[arg(short, long)]
    resultfile: Option<String>,

    /// Add each result file name to every line of the combined file.
    #[arg(short = 'n', long)]
    include_file_names: Option<bool>,

    /// Answer every question with yes instead of asking.
    #[arg(short = 'y', long)]
    yes: bool,

    #[arg(long, value_enum)]
    on_existing_result: Option<OnExistingResult>,

    #[arg(long)]
    comment_marker: Option<String>,

    /// Keep the completion line of an earlier run when appending.
    #[arg(long)]
    keep_previous_sentinel: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OnExistingResult {
    Delete,
    Append,
}

impl From<OnExistingResult> for ExistingResultAction {
    fn from(value: OnExistingResult) -> Self {
        match value {
            OnExistingResult::Delete => ExistingResultAction::Delete,
            OnExistingResult::Append => ExistingResultAction::Append,
        }
    }
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::read_from_file(path)
                .with_context(|| format!("Failed to load settings from {path:?}"))?,
            None => Config::new("./", "./targetdir/"),
        };

        if let Some(workdir) = self.workdir {
            config.work_dir = workdir;
        }
        if let Some(targetdir) = self.targetdir {
            config.target_dir = targetdir;
        }
        if let Some(tmpdir) = self.tmpdir {
            config.tmp_dir_name = tmpdir;
        }
        if let Some(resultfile) = self.resultfile {
            config.result_file_name = resultfile;
        }
        if let Some(include_file_names) = self.include_file_names {
            config.include_file_names = include_file_names;
        }
        if let Some(comment_marker) = self.comment_marker {
            config.comment_marker = comment_marker;
        }
        if let Some(action) = self.on_existing_result {
            config.on_existing_result = Some(action.into());
        }
        config.auto_confirm |= self.yes;
        config.keep_previous_sentinel |= self.keep_previous_sentinel;

        Ok(config.normalized()?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    let summary = run(&config, &mut TerminalConfirm::stdio())?;

    for merged_file in &summary.merged_files {
        debug!(
            "{} {}: {} lines",
            merged_file.provenance_id, merged_file.file_name, merged_file.lines_written
        );
    }
    info!("Done, result written to {:?}", summary.result_file);

    Ok(())
}
