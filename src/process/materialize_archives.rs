use crate::error::{CombinerError, IoResultExt, Result};
use crate::types::staged_file::StagedFile;
use crate::util::create_new_file;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

const ZIP_SIGNATURES: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// Copies every file below `source_dir` into `staging_dir`, replacing zip
/// archives by their extracted members.
///
/// Files are visited in lexicographic order by name at every directory
/// level. Only base names are kept, so two inputs sharing a name are an
/// error rather than one silently replacing the other.
pub fn materialize_archives(source_dir: &Path, staging_dir: &Path) -> Result<Vec<StagedFile>> {
    let mut staged_files = vec![];

    for entry in WalkDir::new(source_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.at("walk source directory", source_dir)?;
        if !entry.file_type().is_file() {
            continue;
        }
        staged_files.extend(materialize_file(entry.path(), staging_dir)?);
    }

    Ok(staged_files)
}

fn materialize_file(raw_file: &Path, staging_dir: &Path) -> Result<Vec<StagedFile>> {
    let file_name = file_name_of(raw_file)?;
    let copied_file = staging_dir.join(format!(".{file_name}.copy"));
    fs::copy(raw_file, &copied_file).at("copy into staging directory", raw_file)?;

    if is_zip_archive(&copied_file)? {
        let staged_files = extract_archive(&copied_file, raw_file, staging_dir)?;
        fs::remove_file(&copied_file).at("remove archive copy", &copied_file)?;
        debug!(
            "Extracted {} file(s) from {:?}",
            staged_files.len(),
            raw_file
        );
        return Ok(staged_files);
    }

    let staged_path = staging_dir.join(&file_name);
    if staged_path.exists() {
        return Err(CombinerError::PreexistingState {
            path: staged_path,
            reason: format!("{raw_file:?} shares its name with a file staged earlier"),
        });
    }
    fs::rename(&copied_file, &staged_path).at("stage plain file", &staged_path)?;
    debug!("Staged {:?}", raw_file);

    Ok(vec![StagedFile {
        path: staged_path,
        file_name,
    }])
}

fn is_zip_archive(path: &Path) -> Result<bool> {
    let mut magic = Vec::with_capacity(4);
    File::open(path)
        .and_then(|file| file.take(4).read_to_end(&mut magic))
        .at("inspect file type", path)?;
    Ok(ZIP_SIGNATURES
        .iter()
        .any(|signature| magic.as_slice() == signature.as_slice()))
}

fn extract_archive(
    archive_path: &Path,
    raw_file: &Path,
    staging_dir: &Path,
) -> Result<Vec<StagedFile>> {
    let archive_error = |source| CombinerError::Archive {
        path: raw_file.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).at("open archive", archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;
    let mut staged_files = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(archive_error)?;
        if member.is_dir() {
            continue;
        }

        let member_name = member
            .enclosed_name()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned());
        let Some(member_name) = member_name else {
            return Err(CombinerError::UnsafeArchiveEntry {
                archive: raw_file.to_path_buf(),
                entry: member.name().to_string(),
            });
        };

        let staged_path = staging_dir.join(&member_name);
        let mut staged_file = create_new_file(&staged_path)?;
        io::copy(&mut member, &mut staged_file).at("extract archive member", &staged_path)?;

        staged_files.push(StagedFile {
            path: staged_path,
            file_name: member_name,
        });
    }

    Ok(staged_files)
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CombinerError::Configuration(format!("{path:?} has no file name")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prepare_source_tree::{write_file, write_zip};
    use tempdir::TempDir;

    fn staged_names(staging_dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(staging_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn extracts_archives_and_copies_plain_files() {
        let source = TempDir::new("source").unwrap();
        let staging = TempDir::new("staging").unwrap();
        write_zip(
            &source.path().join("host1").join("result_1"),
            &[("a.dat", "%hdr\n1.0 2.0\n"), ("b.dat", "3.0 4.0\n")],
        );
        write_file(&source.path().join("host2").join("c.dat"), "5.0 6.0\n");

        let staged_files = materialize_archives(source.path(), staging.path()).unwrap();

        let file_names: Vec<_> = staged_files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(file_names, vec!["a.dat", "b.dat", "c.dat"]);
        assert_eq!(staged_names(staging.path()), vec!["a.dat", "b.dat", "c.dat"]);
        assert_eq!(
            fs::read_to_string(staging.path().join("a.dat")).unwrap(),
            "%hdr\n1.0 2.0\n"
        );
        assert_eq!(
            fs::read_to_string(staging.path().join("c.dat")).unwrap(),
            "5.0 6.0\n"
        );
    }

    #[test]
    fn leaves_source_tree_untouched() {
        let source = TempDir::new("source").unwrap();
        let staging = TempDir::new("staging").unwrap();
        let archive = source.path().join("result.zip");
        write_zip(&archive, &[("a.dat", "1.0\n")]);
        let before = fs::read(&archive).unwrap();

        materialize_archives(source.path(), staging.path()).unwrap();

        assert_eq!(fs::read(&archive).unwrap(), before);
    }

    #[test]
    fn skips_directory_members() {
        let source = TempDir::new("source").unwrap();
        let staging = TempDir::new("staging").unwrap();
        write_zip(
            &source.path().join("result"),
            &[("nested/", ""), ("nested/a.dat", "1.0\n")],
        );

        let staged_files = materialize_archives(source.path(), staging.path()).unwrap();

        assert_eq!(staged_files.len(), 1);
        assert_eq!(staged_files[0].file_name, "a.dat");
        assert_eq!(staged_names(staging.path()), vec!["a.dat"]);
    }

    #[test]
    fn given_duplicate_names_then_fails() {
        let source = TempDir::new("source").unwrap();
        let staging = TempDir::new("staging").unwrap();
        write_file(&source.path().join("one").join("a.dat"), "1.0\n");
        write_file(&source.path().join("two").join("a.dat"), "2.0\n");

        let error = materialize_archives(source.path(), staging.path()).unwrap_err();

        assert!(matches!(error, CombinerError::PreexistingState { .. }));
        assert_eq!(
            fs::read_to_string(staging.path().join("a.dat")).unwrap(),
            "1.0\n"
        );
    }

    #[test]
    fn given_corrupt_archive_then_fails() {
        let source = TempDir::new("source").unwrap();
        let staging = TempDir::new("staging").unwrap();
        write_file(&source.path().join("broken"), "PK\x03\x04 not really a zip");

        let error = materialize_archives(source.path(), staging.path()).unwrap_err();

        assert!(matches!(error, CombinerError::Archive { .. }));
    }

    #[test]
    fn empty_source_stages_nothing() {
        let source = TempDir::new("source").unwrap();
        let staging = TempDir::new("staging").unwrap();

        let staged_files = materialize_archives(source.path(), staging.path()).unwrap();

        assert!(staged_files.is_empty());
        assert!(staged_names(staging.path()).is_empty());
    }
}
