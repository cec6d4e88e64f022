use crate::error::{CombinerError, Result};
use crate::util::rewrite_lines;
use std::path::Path;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct LineCounts {
    pub kept: usize,
    pub dropped: usize,
}

/// Drops every line of `path` that starts with `marker`, in place.
pub fn filter_lines(path: &Path, marker: &str) -> Result<LineCounts> {
    if marker.is_empty() {
        return Err(CombinerError::Configuration(
            "comment marker must not be empty".to_string(),
        ));
    }

    let mut counts = LineCounts::default();
    rewrite_lines(path, "filter comment lines", |line, out| {
        if line.starts_with(marker.as_bytes()) {
            counts.dropped += 1;
            return Ok(());
        }
        counts.kept += 1;
        out.write_all(line)?;
        out.write_all(b"\n")
    })?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn staged(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new("filter").unwrap();
        let path = dir.path().join("a.dat");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn drops_comment_lines_and_keeps_order() {
        let (_dir, path) = staged("%hdr\n1.0 2.0\n%% freq\n3.0 4.0\n 5.0 %\n");

        let counts = filter_lines(&path, "%").unwrap();

        assert_eq!(counts, LineCounts { kept: 3, dropped: 2 });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1.0 2.0\n3.0 4.0\n 5.0 %\n"
        );
    }

    #[test]
    fn filtering_twice_equals_filtering_once() {
        let (_dir, path) = staged("%hdr\n1.0 2.0\n\n%DONE\n3.0 4.0");

        filter_lines(&path, "%").unwrap();
        let once = fs::read(&path).unwrap();
        let counts = filter_lines(&path, "%").unwrap();
        let twice = fs::read(&path).unwrap();

        assert_eq!(once, twice);
        assert_eq!(counts, LineCounts { kept: 3, dropped: 0 });
    }

    #[test]
    fn supports_multi_character_markers() {
        let (_dir, path) = staged("//c\n/x\n1\n");

        filter_lines(&path, "//").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "/x\n1\n");
    }

    #[test]
    fn file_with_only_comments_becomes_empty() {
        let (_dir, path) = staged("%a\n%b\n");

        let counts = filter_lines(&path, "%").unwrap();

        assert_eq!(counts.kept, 0);
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn rejects_empty_marker() {
        let (_dir, path) = staged("1\n");

        assert!(matches!(
            filter_lines(&path, ""),
            Err(CombinerError::Configuration(_))
        ));
    }
}
