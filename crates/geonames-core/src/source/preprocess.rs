// crates/geonames-core/src/source/preprocess.rs
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// In-place rewrites applied to a flat dump before it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreProcessor {
    /// Drop `#` comment lines and blank lines. The tab dialect has no
    /// comment syntax, and `countryInfo.txt` opens with a commented header.
    StripComments,
}

impl PreProcessor {
    pub fn apply(&self, path: &Path) -> Result<()> {
        match self {
            Self::StripComments => strip_comments(path),
        }
    }
}

fn is_noise(line: &[u8]) -> bool {
    line.first() == Some(&b'#') || line.iter().all(u8::is_ascii_whitespace)
}

/// Rewrites `path` through a sibling temporary file, then swaps it in.
fn strip_comments(path: &Path) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };

    let mut reader = BufReader::new(File::open(path)?);
    let mut writer = BufWriter::new(tmp.as_file());
    let mut line = Vec::new();
    let mut dropped = 0usize;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if is_noise(&line) {
            dropped += 1;
            continue;
        }
        writer.write_all(&line)?;
    }
    writer.flush()?;
    drop(writer);

    tmp.persist(path).map_err(|e| e.error)?;
    debug!("Stripped {dropped} comment/blank lines from {}", path.display());
    Ok(())
}
