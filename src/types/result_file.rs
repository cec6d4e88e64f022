use crate::error::{IoResultExt, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The single append-only output of a run.
#[derive(Debug)]
pub struct ResultFile {
    path: PathBuf,
    file: File,
}

impl ResultFile {
    /// Opens `path` for appending, creating it if absent.
    ///
    /// With `strip_sentinel` set, a trailing line equal to the sentinel left
    /// by an earlier complete run is cut off first, so the file ends up with
    /// a single sentinel once this run finishes.
    pub fn open_for_append(path: &Path, strip_sentinel: Option<&str>) -> Result<ResultFile> {
        if path.exists() {
            prepare_existing(path, strip_sentinel).at("prepare result file", path)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .at("open result file", path)?;
        Ok(ResultFile {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the full contents of `source`, returning the bytes copied.
    pub fn append_file(&mut self, source: &Path) -> Result<u64> {
        let mut source_file = File::open(source).at("open staged file", source)?;
        io::copy(&mut source_file, &mut self.file).at("append to result file", &self.path)
    }

    pub fn append_sentinel(&mut self, sentinel: &str) -> Result<()> {
        writeln!(self.file, "{sentinel}").at("append sentinel", &self.path)?;
        self.file.sync_all().at("sync result file", &self.path)
    }
}

fn prepare_existing(path: &Path, strip_sentinel: Option<&str>) -> io::Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;

    if let Some(sentinel) = strip_sentinel {
        if let Some(new_len) = length_without_trailing_sentinel(&mut file, sentinel)? {
            file.set_len(new_len)?;
        }
    }

    let len = file.metadata()?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.seek(SeekFrom::End(0))?;
            file.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn length_without_trailing_sentinel(file: &mut File, sentinel: &str) -> io::Result<Option<u64>> {
    let len = file.metadata()?.len();
    let window = (sentinel.len() as u64 + 3).min(len);
    file.seek(SeekFrom::Start(len - window))?;
    let mut tail = Vec::with_capacity(window as usize);
    file.read_to_end(&mut tail)?;

    let mut end = tail.len();
    if tail.ends_with(b"\n") {
        end -= 1;
    }
    if tail[..end].ends_with(b"\r") {
        end -= 1;
    }
    if !tail[..end].ends_with(sentinel.as_bytes()) {
        return Ok(None);
    }
    let start = end - sentinel.len();
    let at_line_start = if start == 0 {
        window == len
    } else {
        tail[start - 1] == b'\n'
    };
    if !at_line_start {
        return Ok(None);
    }
    Ok(Some(len - (tail.len() - start) as u64))
}
