use crate::error::{CombinerError, IoResultExt, Result};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_COMMENT_MARKER: &str = "%";
pub const DEFAULT_SENTINEL: &str = "%DONE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Holds the result file and the staging directory.
    pub work_dir: PathBuf,
    /// Root of the tree of per-worker result files.
    pub target_dir: PathBuf,
    #[serde(default = "default_tmp_dir_name")]
    pub tmp_dir_name: String,
    #[serde(default = "default_result_file_name")]
    pub result_file_name: String,
    #[serde(default = "default_true")]
    pub include_file_names: bool,
    #[serde(default)]
    pub auto_confirm: bool,
    #[serde(default = "default_comment_marker")]
    pub comment_marker: String,
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    #[serde(default)]
    pub on_existing_result: Option<ExistingResultAction>,
    #[serde(default)]
    pub keep_previous_sentinel: bool,
}

/// What to do with a result file left over from an earlier run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingResultAction {
    Delete,
    Append,
}

fn default_tmp_dir_name() -> String {
    "separate_tmpdir".to_string()
}

fn default_result_file_name() -> String {
    "Combined".to_string()
}

fn default_true() -> bool {
    true
}

fn default_comment_marker() -> String {
    DEFAULT_COMMENT_MARKER.to_string()
}

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

impl Config {
    pub fn new(work_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Config {
        Config {
            work_dir: work_dir.into(),
            target_dir: target_dir.into(),
            tmp_dir_name: default_tmp_dir_name(),
            result_file_name: default_result_file_name(),
            include_file_names: true,
            auto_confirm: false,
            comment_marker: default_comment_marker(),
            sentinel: default_sentinel(),
            on_existing_result: None,
            keep_previous_sentinel: false,
        }
    }

    pub fn read_from_file(file: &Path) -> Result<Config> {
        let f = std::fs::File::open(file).at("open config", file)?;
        serde_yaml::from_reader(f)
            .map_err(|e| CombinerError::Configuration(format!("invalid config {file:?}: {e}")))
    }

    /// Resolves both directories against the current directory.
    pub fn normalized(mut self) -> Result<Config> {
        self.work_dir = std::path::absolute(&self.work_dir).at("resolve", &self.work_dir)?;
        self.target_dir = std::path::absolute(&self.target_dir).at("resolve", &self.target_dir)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.work_dir.is_dir() {
            return Err(CombinerError::Configuration(format!(
                "working directory {:?} does not exist",
                self.work_dir
            )));
        }
        if !self.target_dir.is_dir() {
            return Err(CombinerError::Configuration(format!(
                "target directory {:?} does not exist",
                self.target_dir
            )));
        }
        check_file_name("staging directory name", &self.tmp_dir_name)?;
        check_file_name("result file name", &self.result_file_name)?;
        if self.comment_marker.is_empty() {
            return Err(CombinerError::Configuration(
                "comment marker must not be empty".to_string(),
            ));
        }
        if self.sentinel.is_empty() || self.sentinel.contains('\n') {
            return Err(CombinerError::Configuration(format!(
                "sentinel {:?} must be a single non-empty line",
                self.sentinel
            )));
        }
        if self.staging_dir().starts_with(&self.target_dir) {
            return Err(CombinerError::Configuration(format!(
                "staging directory {:?} lies inside the target directory",
                self.staging_dir()
            )));
        }
        if self.target_dir.starts_with(self.staging_dir()) {
            return Err(CombinerError::Configuration(format!(
                "target directory {:?} lies inside the staging directory",
                self.target_dir
            )));
        }
        Ok(())
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.work_dir.join(&self.tmp_dir_name)
    }

    pub fn result_file(&self) -> PathBuf {
        self.work_dir.join(&self.result_file_name)
    }
}

fn check_file_name(what: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(CombinerError::Configuration(format!(
            "{what} {name:?} must be a single path component"
        ))),
    }
}
