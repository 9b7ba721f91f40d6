// src/kitchen/archive.rs

//! Gzip tar archives of working trees

use crate::error::{Error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::Path;
use tar::Builder;

/// Write `dir` as a gzip tar to `writer`
///
/// Entries are added in sorted order. Top-level names listed in `exclude`
/// are left out. Symlinks are stored as links, never followed.
pub fn write_tree<W: Write>(dir: &Path, writer: W, exclude: &[&str]) -> Result<W> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut archive = Builder::new(encoder);
    archive.follow_symlinks(false);

    append_dir_sorted(&mut archive, dir, Path::new(""), exclude)?;

    let encoder = archive
        .into_inner()
        .map_err(|e| Error::IoError(format!("Failed to finish archive: {e}")))?;
    encoder
        .finish()
        .map_err(|e| Error::IoError(format!("Failed to finish compression: {e}")))
}

fn append_dir_sorted<W: Write>(
    archive: &mut Builder<W>,
    base: &Path,
    prefix: &Path,
    exclude: &[&str],
) -> Result<()> {
    let mut entries = fs::read_dir(base)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let file_name = entry.file_name();
        if prefix.as_os_str().is_empty() && exclude.iter().any(|x| file_name == **x) {
            continue;
        }

        let name = prefix.join(&file_name);
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            archive.append_dir(&name, &path)?;
            append_dir_sorted(archive, &path, &name, &[])?;
        } else {
            archive.append_path_with_name(&path, &name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_tree_excludes_top_level_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sources/Makefile.d")).unwrap();
        fs::write(dir.path().join("Makefile"), "all:\n").unwrap();
        fs::write(dir.path().join("sources/Makefile"), "nested").unwrap();
        fs::write(dir.path().join(".pkglist"), "foo\n").unwrap();

        let bytes = write_tree(dir.path(), Vec::new(), &["Makefile"]).unwrap();
        let names = entry_names(&bytes);

        assert!(!names.iter().any(|n| n == "Makefile"));
        assert!(names.iter().any(|n| n == "sources/Makefile"));
        assert!(names.iter().any(|n| n == ".pkglist"));
        assert!(names.iter().any(|n| n.trim_end_matches('/') == "sources/Makefile.d"));
    }

    #[test]
    fn test_tree_is_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["b", "a", "c"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let names = entry_names(&write_tree(dir.path(), Vec::new(), &[]).unwrap());
        assert_eq!(names, ["a", "b", "c"]);
    }
}
