use crate::error::{CombinerError, Result};
use crate::util::rewrite_lines;
use std::path::Path;

/// Prepends `tag` and a single space to every line of `path`, in place.
///
/// Returns the number of lines tagged. Tags accumulate right to left: the
/// last tag applied ends up first on the line.
pub fn tag_lines(path: &Path, tag: &str) -> Result<usize> {
    if tag.is_empty() || tag.contains('\n') {
        return Err(CombinerError::Configuration(format!(
            "invalid line tag {tag:?} for {path:?}"
        )));
    }

    let mut tagged = 0;
    rewrite_lines(path, "tag lines", |line, out| {
        tagged += 1;
        out.write_all(tag.as_bytes())?;
        out.write_all(b" ")?;
        out.write_all(line)?;
        out.write_all(b"\n")
    })?;
    Ok(tagged)
}
