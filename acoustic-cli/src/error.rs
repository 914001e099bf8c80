use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no action requested: supply --output to send or --input to decode")]
    NoAction,

    #[error("--auth-mode requires --secret")]
    AuthModeRequiresSecret,

    #[error("--encrypt requires --key")]
    EncryptRequiresKey,

    #[error("nothing to send: provide --data, --secret with --auth-mode, or --encrypt with --key")]
    NothingToSend,

    #[error("live microphone recording is outside this tool's scope; record a WAV file separately and pass it with --input")]
    RecordingUnsupported,

    #[error(transparent)]
    Core(#[from] acoustic_core::CoreError),

    #[error("failed to read WAV file {path}: {source}")]
    WavRead {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("failed to write WAV file {path}: {source}")]
    WavWrite {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("WAV file {0} is not 44100 Hz mono 16-bit PCM")]
    BadWavFormat(PathBuf),
}
