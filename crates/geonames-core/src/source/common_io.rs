// crates/geonames-core/src/source/common_io.rs
use crate::error::{GeoNamesError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

/// How a dump is wrapped on disk, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    Flat,
    Zip,
    Gzip,
}

impl Wrapper {
    pub fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("zip") => Self::Zip,
            Some("gz") => Self::Gzip,
            _ => Self::Flat,
        }
    }
}

/// Opens a dump and unwraps it, returning a generic reader so the parser
/// doesn't care about the container.
///
/// For zip archives the member `<stem>.txt` is used. With `spill` set the
/// member is decompressed into an anonymous temporary file and streamed from
/// there; otherwise it is read into memory.
pub fn open_stream(path: &Path, spill: bool) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GeoNamesError::SourceNotFound(path.to_path_buf()),
        _ => GeoNamesError::Io(e),
    })?;

    match Wrapper::of(path) {
        Wrapper::Flat => Ok(Box::new(BufReader::new(file))),
        Wrapper::Gzip => open_gzip(file),
        Wrapper::Zip => open_zip_member(path, file, spill),
    }
}

#[cfg(feature = "compact")]
fn open_gzip(file: File) -> Result<Box<dyn Read>> {
    Ok(Box::new(BufReader::new(GzDecoder::new(BufReader::new(file)))))
}

#[cfg(not(feature = "compact"))]
fn open_gzip(_file: File) -> Result<Box<dyn Read>> {
    Err(GeoNamesError::InvalidData(
        "Gzip source requested but 'compact' disabled".into(),
    ))
}

#[cfg(feature = "archive")]
fn open_zip_member(path: &Path, file: File, spill: bool) -> Result<Box<dyn Read>> {
    use std::io::{Cursor, Seek, SeekFrom};
    use zip::result::ZipError;

    let member = member_name(path);
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let mut entry = match archive.by_name(&member) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(GeoNamesError::SourceNotFound(path.join(&member)));
        }
        Err(e) => return Err(e.into()),
    };

    if spill {
        let mut tmp = tempfile::tempfile()?;
        std::io::copy(&mut entry, &mut tmp)?;
        tmp.seek(SeekFrom::Start(0))?;
        Ok(Box::new(BufReader::new(tmp)))
    } else {
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        Ok(Box::new(Cursor::new(buf)))
    }
}

#[cfg(not(feature = "archive"))]
fn open_zip_member(_path: &Path, _file: File, _spill: bool) -> Result<Box<dyn Read>> {
    Err(GeoNamesError::InvalidData(
        "Zip source requested but 'archive' disabled".into(),
    ))
}

/// `allCountries.zip` → `allCountries.txt`.
pub fn member_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!("{stem}.txt")
}
