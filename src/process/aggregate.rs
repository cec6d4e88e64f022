use crate::config::combiner_config::Config;
use crate::error::{IoResultExt, Result};
use crate::process::filter_lines::filter_lines;
use crate::process::tag_lines::tag_lines;
use crate::types::result_file::ResultFile;
use crate::types::staged_file::{MergedFile, ProvenanceIdAllocator, StagedFile};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Filters, tags and appends every staged file to `result_file`, then
/// appends the sentinel line.
///
/// Provenance ids are handed out in lexicographic file name order. The
/// sentinel is only written once every file has been appended.
pub fn aggregate(
    staging_dir: &Path,
    result_file: &mut ResultFile,
    config: &Config,
) -> Result<Vec<MergedFile>> {
    let staged_files = collect_staged_files(staging_dir)?;
    let mut provenance_ids = ProvenanceIdAllocator::new();
    let mut merged_files = Vec::with_capacity(staged_files.len());

    for staged_file in staged_files {
        let line_counts = filter_lines(&staged_file.path, &config.comment_marker)?;

        // tags are prepended, so the id goes on last to end up in front
        if config.include_file_names {
            tag_lines(&staged_file.path, &staged_file.file_name)?;
        }
        let provenance_id = provenance_ids.allocate();
        let lines_written = tag_lines(&staged_file.path, &provenance_id.to_string())?;

        result_file.append_file(&staged_file.path)?;
        debug!(
            "Appended {} as {} to {:?} ({} lines, {} comment lines dropped)",
            staged_file.file_name,
            provenance_id,
            result_file.path(),
            lines_written,
            line_counts.dropped
        );

        merged_files.push(MergedFile {
            file_name: staged_file.file_name,
            provenance_id,
            lines_written,
            lines_dropped: line_counts.dropped,
        });
    }

    result_file.append_sentinel(&config.sentinel)?;

    Ok(merged_files)
}

fn collect_staged_files(staging_dir: &Path) -> Result<Vec<StagedFile>> {
    let mut staged_files = vec![];
    for entry in WalkDir::new(staging_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.at("walk staging directory", staging_dir)?;
        if !entry.file_type().is_file() {
            continue;
        }
        staged_files.push(StagedFile {
            file_name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
        });
    }
    Ok(staged_files)
}
