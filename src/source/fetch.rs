// src/source/fetch.rs

//! Concurrent source acquisition
//!
//! Every source gets its own thread. Workers report over one channel and the
//! caller drains one message per worker, returning the first failure.
//!
//! Failing fast does not stop the other workers: they keep running and may
//! still write into `sources/` after the error is returned. Callers must
//! treat the working directory as dirty once a fetch has failed.

use super::{Source, SourceKind, SOURCES_DIR};
use crate::error::{Error, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection timeout for source downloads
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Fetches sources into `<work dir>/sources`
#[derive(Clone)]
pub struct SourceFetcher {
    client: Client,
    recipe_dir: PathBuf,
    progress: Option<MultiProgress>,
    git: String,
}

impl SourceFetcher {
    /// Create a fetcher; `file:` sources resolve against `recipe_dir`
    pub fn new(recipe_dir: &Path) -> Result<Self> {
        // No overall timeout: source tarballs can take a long time to stream
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .https_only(true)
            .user_agent(concat!("pkgcook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            recipe_dir: recipe_dir.to_path_buf(),
            progress: None,
            git: "git".to_string(),
        })
    }

    /// Show a progress bar per download
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled.then(MultiProgress::new);
        self
    }

    /// Use a different git executable
    pub fn with_git(mut self, git: &str) -> Self {
        self.git = git.to_string();
        self
    }

    /// Fetch every source concurrently into `<work_dir>/sources`
    ///
    /// Returns the first error reported; see the module docs for what
    /// happens to the remaining workers.
    pub fn fetch_all(&self, sources: &[Source], work_dir: &Path) -> Result<()> {
        let sources_dir = work_dir.join(SOURCES_DIR);
        fs::create_dir_all(&sources_dir).map_err(|e| {
            Error::IoError(format!(
                "Failed to create directory {}: {e}",
                sources_dir.display()
            ))
        })?;

        info!("Fetching {} source(s)", sources.len());

        let (tx, rx) = mpsc::channel::<Result<PathBuf>>();
        for source in sources {
            let tx = tx.clone();
            let fetcher = self.clone();
            let source = source.clone();
            let work_dir = work_dir.to_path_buf();
            thread::spawn(move || {
                let result = fetcher.fetch_one(&source, &work_dir);
                // The receiver is gone once an earlier failure was returned
                let _ = tx.send(result);
            });
        }
        drop(tx);

        for _ in sources {
            match rx.recv() {
                Ok(Ok(path)) => debug!("Fetched {}", path.display()),
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(Error::SourceFetchFailed {
                        url: "<unknown>".to_string(),
                        reason: "fetch worker exited without reporting".to_string(),
                    });
                }
            }
        }

        info!("All sources fetched");
        Ok(())
    }

    /// Fetch a single source; returns its destination path
    pub fn fetch_one(&self, source: &Source, work_dir: &Path) -> Result<PathBuf> {
        let dest = work_dir.join(source.dest());
        match source.kind() {
            SourceKind::Https { sha256 } => {
                self.download(source, &dest)?;
                if let Some(expected) = sha256 {
                    if let Err(e) = crate::hash::verify_file_sha256(&dest, expected) {
                        let _ = fs::remove_file(&dest);
                        return Err(e);
                    }
                    debug!("Checksum verified for {}", dest.display());
                }
            }
            SourceKind::Git { reference } => self.clone_repo(source, reference.as_deref(), &dest)?,
            SourceKind::File => self.copy_local(source, &dest)?,
        }
        Ok(dest)
    }

    fn download(&self, source: &Source, dest: &Path) -> Result<()> {
        let url = source.fetch_url();
        info!("Downloading {} to {}", url, dest.display());

        let fail = |reason: String| Error::SourceFetchFailed {
            url: url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| fail(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("HTTP {}", response.status())));
        }

        let total_size = response.content_length().unwrap_or(0);
        let progress_bar = self
            .progress
            .as_ref()
            .map(|multi| multi.add(create_progress_bar(total_size, source.file_name())));

        // Write to a temporary name, then rename into place
        let mut temp_name = dest.as_os_str().to_owned();
        temp_name.push(".part");
        let temp_path = PathBuf::from(temp_name);
        let mut file = File::create(&temp_path).map_err(|e| {
            Error::IoError(format!("Failed to create file {}: {e}", temp_path.display()))
        })?;

        let downloaded = match stream_response_to_file(response, &mut file, progress_bar.as_ref()) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(fail(e.to_string()));
            }
        };

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!("{} [done]", source.file_name()));
        }

        fs::rename(&temp_path, dest).map_err(|e| {
            Error::IoError(format!(
                "Failed to move {} to {}: {e}",
                temp_path.display(),
                dest.display()
            ))
        })?;

        info!("Downloaded {} bytes to {}", downloaded, dest.display());
        Ok(())
    }

    fn clone_repo(&self, source: &Source, reference: Option<&str>, dest: &Path) -> Result<()> {
        let url = source.fetch_url();
        info!("Cloning {} into {}", url, dest.display());

        let mut clone = Command::new(&self.git);
        clone.arg("clone").arg("--").arg(&url).arg(dest);
        run_git(&mut clone, &url)?;

        if let Some(reference) = reference {
            debug!("Checking out {} in {}", reference, dest.display());
            let mut checkout = Command::new(&self.git);
            checkout.arg("-C").arg(dest).arg("checkout").arg(reference);
            run_git(&mut checkout, &url)?;
        }
        Ok(())
    }

    fn copy_local(&self, source: &Source, dest: &Path) -> Result<()> {
        let Some(path) = source.local_path(&self.recipe_dir) else {
            return Err(Error::UnsupportedScheme(source.scheme().to_string()));
        };
        debug!("Copying {} to {}", path.display(), dest.display());

        fs::copy(&path, dest).map_err(|e| Error::SourceFetchFailed {
            url: source.url().to_string(),
            reason: format!("Failed to copy {}: {e}", path.display()),
        })?;
        Ok(())
    }
}

fn run_git(command: &mut Command, url: &str) -> Result<()> {
    debug!("Running {:?}", command);
    let output = command.output().map_err(|e| Error::SourceFetchFailed {
        url: url.to_string(),
        reason: format!("Failed to run git: {e}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("git failed for {}: {}", url, stderr.trim());
        return Err(Error::SourceFetchFailed {
            url: url.to_string(),
            reason: format!("git exited with {}: {}", output.status, stderr.trim()),
        });
    }
    Ok(())
}

/// Create a styled progress bar for a source download
fn create_progress_bar(size: u64, name: &str) -> ProgressBar {
    let pb = if size > 0 {
        ProgressBar::new(size)
    } else {
        ProgressBar::new_spinner()
    };
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(name.to_string());
    pb
}

/// Stream a response body to a file without buffering it in memory
fn stream_response_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    progress_bar: Option<&ProgressBar>,
) -> std::io::Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;

        if let Some(pb) = progress_bar {
            pb.set_position(downloaded);
        }
    }

    file.flush()?;
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_file_sources_concurrently() {
        let recipe_dir = TempDir::new().unwrap();
        fs::create_dir(recipe_dir.path().join("patches")).unwrap();
        fs::write(recipe_dir.path().join("patches/a.patch"), "a").unwrap();
        fs::write(recipe_dir.path().join("b.txt"), "b").unwrap();

        let sources = vec![
            Source::parse("file:patches/a.patch").unwrap(),
            Source::parse("file:b.txt").unwrap(),
        ];
        let work = TempDir::new().unwrap();
        let fetcher = SourceFetcher::new(recipe_dir.path()).unwrap();
        fetcher.fetch_all(&sources, work.path()).unwrap();

        assert_eq!(fs::read_to_string(work.path().join("sources/a.patch")).unwrap(), "a");
        assert_eq!(fs::read_to_string(work.path().join("sources/b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_missing_file_source_reports_error() {
        let recipe_dir = TempDir::new().unwrap();
        fs::write(recipe_dir.path().join("present"), "x").unwrap();

        let sources = vec![
            Source::parse("file:present").unwrap(),
            Source::parse("file:missing").unwrap(),
        ];
        let work = TempDir::new().unwrap();
        let fetcher = SourceFetcher::new(recipe_dir.path()).unwrap();
        match fetcher.fetch_all(&sources, work.path()) {
            Err(Error::SourceFetchFailed { url, .. }) => assert!(url.ends_with("missing")),
            other => panic!("expected SourceFetchFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_no_sources_is_ok() {
        let work = TempDir::new().unwrap();
        let fetcher = SourceFetcher::new(work.path()).unwrap();
        fetcher.fetch_all(&[], work.path()).unwrap();
        assert!(work.path().join("sources").is_dir());
    }

    #[test]
    fn test_git_failure_is_an_error_not_a_panic() {
        let work = TempDir::new().unwrap();
        let fetcher = SourceFetcher::new(work.path())
            .unwrap()
            .with_git("/nonexistent/git-binary");
        let source = Source::parse("git://example.invalid/repo.git?tag=v1").unwrap();
        assert!(matches!(
            fetcher.fetch_all(&[source], work.path()),
            Err(Error::SourceFetchFailed { .. })
        ));
    }
}
