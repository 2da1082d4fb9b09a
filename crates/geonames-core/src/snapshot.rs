// crates/geonames-core/src/snapshot.rs

//! Binary snapshots of the tree and the store (bincode, optionally gzip).

use crate::error::{GeoNamesError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "compact")]
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    Gzip,
    None,
}

impl Default for CompressionMode {
    #[cfg(feature = "compact")]
    fn default() -> Self {
        Self::Gzip
    }

    #[cfg(not(feature = "compact"))]
    fn default() -> Self {
        Self::None
    }
}

#[cfg(not(feature = "compact"))]
fn gzip_disabled() -> GeoNamesError {
    GeoNamesError::InvalidData("Gzip snapshot requested but 'compact' disabled".into())
}

/// Serializes `value` (tree or store) to `path`, replacing the file.
pub fn write_snapshot<T: Serialize>(path: &Path, value: &T, compression: CompressionMode) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    match compression {
        CompressionMode::Gzip => {
            #[cfg(feature = "compact")]
            {
                let mut encoder = GzEncoder::new(writer, Compression::default());
                bincode::serialize_into(&mut encoder, value)?;
                // finish() writes the gzip trailer; dropping would swallow errors.
                encoder.finish()?.flush()?;
            }
            #[cfg(not(feature = "compact"))]
            {
                return Err(gzip_disabled());
            }
        }
        CompressionMode::None => {
            bincode::serialize_into(&mut writer, value)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`] with the same compression.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path, compression: CompressionMode) -> Result<T> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GeoNamesError::SourceNotFound(path.to_path_buf()),
        _ => GeoNamesError::Io(e),
    })?;
    let reader = BufReader::new(file);

    let decoder: Box<dyn Read> = match compression {
        #[cfg(feature = "compact")]
        CompressionMode::Gzip => Box::new(GzDecoder::new(reader)),
        #[cfg(not(feature = "compact"))]
        CompressionMode::Gzip => return Err(gzip_disabled()),
        CompressionMode::None => Box::new(reader),
    };

    Ok(bincode::deserialize_from(decoder)?)
}
