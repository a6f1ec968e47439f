//! MBE parameter file output
//!
//! Voice frames may be saved to disk for later decoding. One
//! file is written per call. Each file begins with a four-byte
//! magic which names the codec family (`.imb` or `.amb`) and
//! continues with one record per voice frame:
//!
//! ```txt
//! +------------+------------------------------+
//! | error byte | codeword, packed MSB-first   |
//! +------------+------------------------------+
//! ```
//!
//! The error byte is always zero; error correction is not
//! performed at this layer.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

use crate::frame::{VoiceCodec, VoiceFrame};

/// MBE output failure
#[derive(Error, Debug)]
pub enum MbeOutputError {
    /// Could not create the output file
    #[error("unable to create MBE output file in \"{dir}\": {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Could not write to or close the output file
    #[error("unable to write MBE output file \"{path}\": {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// MBE parameter file writer
///
/// Writes voice frames to a new file in `dir` for each call.
/// When no directory is configured, every operation is a
/// no-op.
#[derive(Debug)]
pub struct MbeOutput {
    dir: Option<PathBuf>,
    file: Option<OpenFile>,
}

#[derive(Debug)]
struct OpenFile {
    path: PathBuf,
    codec: VoiceCodec,
    out: BufWriter<File>,
    frames: u64,
}

impl MbeOutput {
    /// New writer for the given output directory
    pub fn new<P>(dir: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            dir: dir.map(|d| d.into()),
            file: None,
        }
    }

    /// True if an output directory is configured
    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// True if a file is open
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the open file, if any
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path.as_path())
    }

    /// Open a file for `codec`, if one is not already open
    ///
    /// If a file is open for a codec with a different magic, it
    /// is closed first. Does nothing if output is disabled.
    pub fn open(&mut self, codec: VoiceCodec) -> Result<(), MbeOutputError> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => return Ok(()),
        };

        match self
            .file
            .as_ref()
            .map(|f| f.codec.file_magic() == codec.file_magic())
        {
            Some(true) => return Ok(()),
            Some(false) => self.close()?,
            None => {}
        }

        let (path, fh) = create_unique(&dir, codec.file_magic())
            .map_err(|source| MbeOutputError::Create { dir, source })?;

        let mut out = BufWriter::new(fh);
        out.write_all(codec.file_magic().as_bytes())
            .map_err(|source| MbeOutputError::Write {
                path: path.clone(),
                source,
            })?;

        info!("mbe: writing {}", path.display());
        self.file = Some(OpenFile {
            path,
            codec,
            out,
            frames: 0,
        });
        Ok(())
    }

    /// Close the open file, if any
    pub fn close(&mut self) -> Result<(), MbeOutputError> {
        if let Some(mut file) = self.file.take() {
            file.out.flush().map_err(|source| MbeOutputError::Write {
                path: file.path.clone(),
                source,
            })?;
            info!(
                "mbe: closed {} after {} frames",
                file.path.display(),
                file.frames
            );
        }
        Ok(())
    }

    /// Append one voice frame to the open file
    ///
    /// Does nothing if no file is open.
    pub fn write_frame(&mut self, frame: &VoiceFrame) -> Result<(), MbeOutputError> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Ok(()),
        };

        let mut record = Vec::with_capacity(1 + frame.bits.len() / 8 + 1);
        record.push(0u8);
        record.extend(frame.to_bytes());
        file.out
            .write_all(&record)
            .map_err(|source| MbeOutputError::Write {
                path: file.path.clone(),
                source,
            })?;
        file.frames += 1;
        Ok(())
    }
}

impl Drop for MbeOutput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// Create a new file named for the current time, adding a
// numeric suffix rather than overwriting
fn create_unique(dir: &Path, ext: &str) -> io::Result<(PathBuf, File)> {
    let stem = timestamp();
    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("{}{}", stem, ext)
        } else {
            format!("{}-{}{}", stem, suffix, ext)
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(fh) => return Ok((path, fh)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && suffix < MAX_SUFFIX => {
                suffix += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

const MAX_SUFFIX: u32 = 9999;

#[cfg(feature = "chrono")]
fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

#[cfg(not(feature = "chrono"))]
fn timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}
