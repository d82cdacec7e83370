//! File-backed reference driver endpoints.
//!
//! Grounds the `"Speaker_File"` debug device named in scenario 1: a
//! `libmodule-hdi-sink` configured with a `file_path` writes rendered audio
//! as 16-bit PCM to a WAV file instead of a real HDI adapter. The symmetric
//! source endpoint reads captured audio back from a WAV file, looping at
//! end-of-stream so pacing-loop tests can run for any duration.

use crate::driver::{DriverEndpoint, SampleAttrs};
use audiocore_types::{ErrKind, Result};
use hound::{WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn hound_spec(attrs: SampleAttrs) -> WavSpec {
    WavSpec {
        channels: attrs.channels,
        sample_rate: attrs.rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Writes rendered PCM to a WAV file, one `render_frame` call at a time.
pub struct FileDriverEndpoint {
    name: String,
    attrs: SampleAttrs,
    writer: WavWriter<BufWriter<File>>,
}

impl FileDriverEndpoint {
    /// Create a file-backed sink at `path`, truncating any existing file.
    pub fn create(name: impl Into<String>, path: impl AsRef<Path>, attrs: SampleAttrs) -> Result<Self> {
        let writer = WavWriter::create(path.as_ref(), hound_spec(attrs))
            .map_err(|e| ErrKind::DeviceInit(format!("file sink {}: {e}", path.as_ref().display())))?;
        Ok(Self {
            name: name.into(),
            attrs,
            writer,
        })
    }
}

impl DriverEndpoint for FileDriverEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_attrs(&self) -> SampleAttrs {
        self.attrs
    }

    fn render_frame(&mut self, buf: &[u8]) -> Result<usize> {
        let mut written = 0usize;
        for chunk in buf.chunks_exact(2) {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            self.writer
                .write_sample(sample)
                .map_err(|e| ErrKind::OperationFailed(format!("file sink write: {e}")))?;
            written += 2;
        }
        Ok(written)
    }

    fn capture_frame(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(ErrKind::InvalidOperation(
            "FileDriverEndpoint is sink-only".to_string(),
        ))
    }

    fn reinitialize(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ErrKind::DeviceInit(format!("file sink reinit flush: {e}")))
    }
}

/// Reads captured PCM back from a WAV file, looping at end-of-stream.
pub struct FileSourceEndpoint {
    name: String,
    attrs: SampleAttrs,
    path: PathBuf,
    reader: WavReader<std::io::BufReader<File>>,
}

impl FileSourceEndpoint {
    /// Open `path` as a file-backed source.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>, attrs: SampleAttrs) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = WavReader::open(&path)
            .map_err(|e| ErrKind::DeviceInit(format!("file source {}: {e}", path.display())))?;
        Ok(Self {
            name: name.into(),
            attrs,
            path,
            reader,
        })
    }

    fn rewind(&mut self) -> Result<()> {
        self.reader = WavReader::open(&self.path)
            .map_err(|e| ErrKind::OperationFailed(format!("file source rewind: {e}")))?;
        Ok(())
    }
}

impl DriverEndpoint for FileSourceEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_attrs(&self) -> SampleAttrs {
        self.attrs
    }

    fn render_frame(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(ErrKind::InvalidOperation(
            "FileSourceEndpoint is source-only".to_string(),
        ))
    }

    fn capture_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0usize;
        for chunk in buf.chunks_exact_mut(2) {
            match self.reader.samples::<i16>().next() {
                Some(Ok(sample)) => chunk.copy_from_slice(&sample.to_le_bytes()),
                Some(Err(e)) => {
                    return Err(ErrKind::OperationFailed(format!(
                        "file source read: {e}"
                    )))
                }
                None => {
                    self.rewind()?;
                    chunk.fill(0);
                }
            }
            filled += 2;
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn attrs() -> SampleAttrs {
        SampleAttrs {
            rate: 48000,
            channels: 1,
            bytes_per_frame: 2,
        }
    }

    #[test]
    fn render_then_read_back_roundtrips() {
        let file = NamedTempFile::new().unwrap();
        {
            let mut sink = FileDriverEndpoint::create("speaker_file", file.path(), attrs()).unwrap();
            let samples: Vec<i16> = vec![100, -200, 300, -400];
            let mut buf = Vec::new();
            for s in &samples {
                buf.extend_from_slice(&s.to_le_bytes());
            }
            let n = sink.render_frame(&buf).unwrap();
            assert_eq!(n, buf.len());
            sink.reinitialize().unwrap();
        }

        let reader = hound::WavReader::open(file.path()).unwrap();
        let got: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(got, vec![100, -200, 300, -400]);
    }

    #[test]
    fn capture_frame_rejected_on_sink_only_endpoint() {
        let file = NamedTempFile::new().unwrap();
        let mut sink = FileDriverEndpoint::create("speaker_file", file.path(), attrs()).unwrap();
        let mut buf = [0u8; 4];
        assert!(sink.capture_frame(&mut buf).is_err());
    }
}
