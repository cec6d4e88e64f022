use crate::error::{CombinerError, IoResultExt, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Creates `path`, failing if something is already there.
pub fn create_new_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => CombinerError::PreexistingState {
                path: path.to_path_buf(),
                reason: "two input files would be staged under the same name".to_string(),
            },
            _ => CombinerError::Io {
                operation: "create file",
                path: path.to_path_buf(),
                source,
            },
        })
}

/// Streams `path` line by line through `rewrite_line` into a temporary file
/// in the same directory, then moves the temporary file over `path`.
///
/// Lines are handed over without their terminator (`\n` or `\r\n`); the
/// callback writes whatever should replace them, terminator included.
pub fn rewrite_lines<F>(path: &Path, operation: &'static str, mut rewrite_line: F) -> Result<()>
where
    F: FnMut(&[u8], &mut dyn Write) -> io::Result<()>,
{
    let parent = path.parent().ok_or_else(|| {
        CombinerError::Configuration(format!("{path:?} has no parent directory"))
    })?;
    let source = BufReader::new(File::open(path).at(operation, path)?);
    let mut writer = BufWriter::new(NamedTempFile::new_in(parent).at(operation, parent)?);

    for line in source.split(b'\n') {
        let mut line = line.at(operation, path)?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        rewrite_line(line.as_slice(), &mut writer as &mut dyn Write).at(operation, path)?;
    }

    let temp_file = writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)
        .at(operation, path)?;
    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .at(operation, path)?;
    Ok(())
}

/// Total size in bytes of the regular files below `path`.
pub fn disk_usage(path: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(path) {
        let entry = entry.at("measure disk usage", path)?;
        if entry.file_type().is_file() {
            total += entry.metadata().at("measure disk usage", entry.path())?.len();
        }
    }
    Ok(total)
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}{}", UNITS[0])
    } else {
        format!("{size:.1}{}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn rewrite_normalizes_line_endings() {
        let dir = TempDir::new("rewrite").unwrap();
        let path = dir.path().join("a.dat");
        fs::write(&path, "1.0 2.0\r\n3.0 4.0").unwrap();

        rewrite_lines(&path, "copy lines", |line, out| {
            out.write_all(line)?;
            out.write_all(b"\n")
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1.0 2.0\n3.0 4.0\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn rewrite_of_missing_file_names_operation_and_path() {
        let dir = TempDir::new("rewrite").unwrap();
        let path = dir.path().join("missing.dat");

        let error = rewrite_lines(&path, "filter lines", |_, _| Ok(())).unwrap_err();

        match error {
            CombinerError::Io {
                operation,
                path: failed_path,
                ..
            } => {
                assert_eq!(operation, "filter lines");
                assert_eq!(failed_path, path);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn create_new_file_refuses_to_overwrite() {
        let dir = TempDir::new("create").unwrap();
        let path = dir.path().join("a.dat");
        create_new_file(&path).unwrap();

        assert!(matches!(
            create_new_file(&path),
            Err(CombinerError::PreexistingState { .. })
        ));
    }

    #[test]
    fn disk_usage_sums_nested_files() {
        let dir = TempDir::new("usage").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a"), [0u8; 10]).unwrap();
        fs::write(dir.path().join("nested").join("b"), [0u8; 5]).unwrap();

        assert_eq!(disk_usage(dir.path()).unwrap(), 15);
    }

    #[test]
    fn human_size_uses_binary_units() {
        assert_eq!(human_size(512), "512B");
        assert_eq!(human_size(1536), "1.5K");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0M");
    }
}
