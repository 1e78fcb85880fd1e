//! Log-file following.
//!
//! Watches a file for changes and prints appended content as it arrives.
//! Truncation (log rotation in place) resets the cursor to the start; watch
//! errors go to the error stream without ending the watch unless the file
//! itself is gone.

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub(crate) async fn follow_file(path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || follow_blocking(&path))
        .await
        .context("log watch task failed")?
}

fn follow_blocking(path: &Path) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |event| {
        let _ = tx.send(event);
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;

    let mut cursor = FileCursor::default();
    emit(&cursor.read_appended(path)?)?;

    for event in rx {
        if let Err(err) = event {
            eprintln!("log watch: {}", err);
            continue;
        }
        match cursor.read_appended(path) {
            Ok(chunk) => emit(&chunk)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(err).with_context(|| format!("log file {} is gone", path.display()));
            }
            Err(err) => eprintln!("log watch: {}", err),
        }
    }
    Ok(())
}

fn emit(chunk: &str) -> Result<()> {
    if chunk.is_empty() {
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(chunk.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Read position into a growing file. A file shorter than the cursor was
/// truncated underneath us; reading restarts from the beginning.
#[derive(Debug, Default)]
struct FileCursor {
    position: u64,
}

impl FileCursor {
    fn read_appended(&mut self, path: &Path) -> std::io::Result<String> {
        let len = std::fs::metadata(path)?.len();
        if len < self.position {
            self.position = 0;
        }
        let mut file = std::fs::File::open(path)?;
        file.seek(SeekFrom::Start(self.position))?;
        let mut chunk = String::new();
        file.read_to_string(&mut chunk)?;
        self.position += chunk.len() as u64;
        Ok(chunk)
    }
}
