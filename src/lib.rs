pub mod config;
pub mod confirm;
pub mod error;
pub mod process;
#[cfg(test)]
mod test;
pub mod types;
pub mod util;

use crate::config::combiner_config::{Config, ExistingResultAction};
use crate::confirm::Confirm;
use crate::error::{CombinerError, IoResultExt, Result};
use crate::process::aggregate::aggregate;
use crate::process::materialize_archives::materialize_archives;
use crate::types::result_file::ResultFile;
use crate::types::staged_file::MergedFile;
use crate::util::{disk_usage, human_size};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug)]
pub struct RunSummary {
    pub result_file: PathBuf,
    pub merged_files: Vec<MergedFile>,
    pub lines_written: usize,
    pub lines_dropped: usize,
    pub result_size: u64,
}

/// Stages every file below the target directory, merges them into the
/// result file and removes the staging directory again.
///
/// `config` must already be normalized. With `config.auto_confirm` set,
/// `confirm` is never consulted.
pub fn run(config: &Config, confirm: &mut dyn Confirm) -> Result<RunSummary> {
    config.validate()?;

    let staging_dir = config.staging_dir();
    let result_path = config.result_file();
    info!("Working directory: {:?}", config.work_dir);
    info!("Target directory: {:?}", config.target_dir);
    info!("Result file: {:?}", result_path);
    if config.include_file_names {
        info!("Result file names will be included in the combined file.");
    }

    clear_stale_staging_dir(config, confirm)?;

    if let ExistingResultAction::Delete = resolve_existing_result(config, confirm)? {
        info!("Deleting existing result file {:?}", result_path);
        fs::remove_file(&result_path).at("delete result file", &result_path)?;
    }

    let source_size = disk_usage(&config.target_dir)?;
    info!(
        "Size of the target directory before extraction: {}",
        human_size(source_size)
    );
    require(config, confirm, "Are you sure to proceed?")?;

    info!("Materializing input files...");
    fs::create_dir(&staging_dir).at("create staging directory", &staging_dir)?;
    let staged_files = materialize_archives(&config.target_dir, &staging_dir)?;
    info!("Staged {} file(s) in {:?}", staged_files.len(), staging_dir);

    info!("Combining staged files...");
    let strip_sentinel = (!config.keep_previous_sentinel).then_some(config.sentinel.as_str());
    let mut result_file = ResultFile::open_for_append(&result_path, strip_sentinel)?;
    let merged_files = aggregate(&staging_dir, &mut result_file, config)?;
    if merged_files.len() != staged_files.len() {
        warn!(
            "Merged {} file(s) but staged {}; the staging directory was modified during the run",
            merged_files.len(),
            staged_files.len()
        );
    }

    fs::remove_dir_all(&staging_dir).at("remove staging directory", &staging_dir)?;

    let result_size = fs::metadata(&result_path)
        .at("measure result file", &result_path)?
        .len();
    let summary = RunSummary {
        lines_written: merged_files.iter().map(|f| f.lines_written).sum(),
        lines_dropped: merged_files.iter().map(|f| f.lines_dropped).sum(),
        merged_files,
        result_file: result_path,
        result_size,
    };
    info!(
        "Combined {} file(s), {} lines written, {} comment lines dropped, result size {}",
        summary.merged_files.len(),
        summary.lines_written,
        summary.lines_dropped,
        human_size(summary.result_size)
    );

    Ok(summary)
}

fn clear_stale_staging_dir(config: &Config, confirm: &mut dyn Confirm) -> Result<()> {
    let staging_dir = config.staging_dir();
    if staging_dir.exists() {
        warn!("Staging directory {:?} already exists", staging_dir);
        let question = format!("Are you sure to delete {}?", staging_dir.display());
        if !(config.auto_confirm || confirm.confirm(&question)?) {
            return Err(CombinerError::PreexistingState {
                path: staging_dir,
                reason: "deletion of the staging directory left by an earlier run was declined"
                    .to_string(),
            });
        }
        fs::remove_dir_all(&staging_dir).at("delete staging directory", &staging_dir)?;
    }
    Ok(())
}

fn resolve_existing_result(
    config: &Config,
    confirm: &mut dyn Confirm,
) -> Result<ExistingResultAction> {
    let result_path = config.result_file();
    if !result_path.exists() {
        return Ok(ExistingResultAction::Append);
    }
    let size = fs::metadata(&result_path)
        .at("measure result file", &result_path)?
        .len();
    info!(
        "Current size of the result file: {}",
        human_size(size)
    );

    if let Some(action) = config.on_existing_result {
        return Ok(action);
    }
    if config.auto_confirm {
        return Ok(ExistingResultAction::Append);
    }
    confirm
        .existing_result(&result_path, &human_size(size))?
        .ok_or_else(|| CombinerError::PreexistingState {
            path: result_path,
            reason: "neither delete nor append was chosen".to_string(),
        })
}

fn require(config: &Config, confirm: &mut dyn Confirm, question: &str) -> Result<()> {
    if config.auto_confirm || confirm.confirm(question)? {
        Ok(())
    } else {
        Err(CombinerError::ConfirmationDeclined(question.to_string()))
    }
}
