use crate::audio::EngineError;

/// Failures that end the program.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("audio output: {0}")]
    Engine(#[from] EngineError),
    #[error("terminal: {0}")]
    Io(#[from] std::io::Error),
}
