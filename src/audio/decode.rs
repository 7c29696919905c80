use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use log::debug;
use rodio::{Decoder, Source};

/// Interleaved PCM samples for a whole file.
#[derive(Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels as usize;
        frames as f64 / self.sample_rate as f64
    }

    /// Sample index of the frame at `seconds`, clamped to the buffer.
    pub fn sample_offset(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * self.sample_rate as f64).floor() as usize;
        (frame * self.channels as usize).min(self.samples.len())
    }

    #[cfg(test)]
    pub(crate) fn silence(seconds: f64) -> Self {
        let sample_rate = 1_000;
        Self {
            channels: 1,
            sample_rate,
            samples: vec![0.0; (seconds * sample_rate as f64).round() as usize],
        }
    }
}

impl fmt::Debug for DecodedAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedAudio")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("samples", &self.samples.len())
            .finish()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("cannot decode {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },
    #[error("{} contains no audio", path.display())]
    Empty { path: PathBuf },
    #[error("decoding {} was interrupted", path.display())]
    Interrupted { path: PathBuf },
}

/// Decode a whole file into memory.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::FileRead {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| DecodeError::Unsupported {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();
    if samples.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
        });
    }

    debug!(
        "decoded {}: {} samples, {} ch @ {} Hz",
        path.display(),
        samples.len(),
        channels,
        sample_rate
    );
    Ok(DecodedAudio {
        channels,
        sample_rate,
        samples,
    })
}

/// A decode running on its own thread.
pub struct PendingDecode {
    path: PathBuf,
    rx: Receiver<Result<DecodedAudio, DecodeError>>,
}

impl PendingDecode {
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            // The receiver may be gone if the engine was dropped meanwhile.
            let _ = tx.send(decode_file(&worker_path));
        });
        Self { path, rx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` while the worker is still busy.
    pub fn try_take(&self) -> Option<Result<Arc<DecodedAudio>, DecodeError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result.map(Arc::new)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(DecodeError::Interrupted {
                path: self.path.clone(),
            })),
        }
    }
}
