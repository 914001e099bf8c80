//! Command-line harness for the acoustic link: turns `--data`/`--secret`/
//! `--encrypt` into a WAV file, or a WAV file back into a decoded packet.
//!
//! This binary owns only WAV I/O and argument parsing; all modem, framing
//! and crypto logic lives in `acoustic-core`. Live microphone capture is out
//! of scope - `--record` exists on the flag surface but always errors out,
//! pointing the caller at recording the WAV separately.

mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use acoustic_core::{build_auth, build_data, build_encrypted, decode, DecodeOptions, DecodeResult, Mode};
use error::CliError;

/// Send or receive a short message over the near-ultrasonic acoustic link.
#[derive(Parser, Debug)]
#[command(name = "acoustic-link", version, about)]
struct Args {
    /// Text payload to send as a DATA packet.
    #[arg(long)]
    data: Option<String>,

    /// Shared secret. Alone, sent as an AUTH packet; expected secret on
    /// receive; required alongside --encrypt as the encryption password.
    #[arg(long)]
    secret: Option<String>,

    /// Treat incoming packets as AUTH rather than DATA, verifying --secret.
    #[arg(long)]
    auth_mode: bool,

    /// Send --data as an ENCRYPTED packet instead of plaintext DATA.
    #[arg(long)]
    encrypt: bool,

    /// Password for --encrypt, or for unlocking an ENCRYPTED packet on receive.
    #[arg(long)]
    key: Option<String>,

    /// Unit id (0-15) to address the packet to.
    #[arg(long, default_value_t = 0)]
    unit_id: u8,

    /// Write the modulated packet to this WAV file (send mode).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Read and decode samples from this WAV file (receive mode).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Record this many seconds of audio before decoding. Not implemented.
    #[arg(long)]
    record: Option<f32>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, CliError> {
    if args.record.is_some() {
        return Err(CliError::RecordingUnsupported);
    }

    match (&args.output, &args.input) {
        (Some(output), None) => send(&args, output),
        (None, Some(input)) => receive(&args, input),
        (Some(_), Some(_)) | (None, None) => Err(CliError::NoAction),
    }
}

fn send(args: &Args, output: &PathBuf) -> Result<ExitCode, CliError> {
    if args.auth_mode && args.secret.is_none() {
        return Err(CliError::AuthModeRequiresSecret);
    }
    if args.encrypt && args.key.is_none() {
        return Err(CliError::EncryptRequiresKey);
    }

    let bits = if args.encrypt {
        let payload = args.data.as_deref().unwrap_or_default();
        build_encrypted(payload.as_bytes(), args.key.as_deref().unwrap(), args.unit_id)?
    } else if args.auth_mode {
        build_auth(args.secret.as_deref().unwrap(), args.unit_id)
    } else if let Some(data) = &args.data {
        build_data(data.as_bytes(), args.unit_id)?
    } else {
        return Err(CliError::NothingToSend);
    };

    let samples = acoustic_core::modem::modulate_packet(&bits);
    write_wav(output, &samples)?;
    info!("wrote {} samples to {}", samples.len(), output.display());
    Ok(ExitCode::SUCCESS)
}

fn receive(args: &Args, input: &PathBuf) -> Result<ExitCode, CliError> {
    let samples = read_wav(input)?;

    let opts = DecodeOptions {
        expected_mode: Some(if args.auth_mode { Mode::Auth } else { Mode::Data }),
        password: args.key.clone(),
        expected_secret: args.secret.clone(),
    };

    let results = decode(&samples, &opts);
    let mut exit_code = ExitCode::SUCCESS;

    for result in results {
        match result {
            DecodeResult::DataOk(unit_id, payload) => {
                println!("unit {unit_id}: {}", String::from_utf8_lossy(&payload));
            }
            DecodeResult::AuthOk(unit_id, true) => {
                println!("unit {unit_id}: access granted");
            }
            DecodeResult::AuthOk(unit_id, false) => {
                println!("unit {unit_id}: access denied");
                exit_code = ExitCode::FAILURE;
            }
            DecodeResult::EncryptedOk(unit_id, payload) => {
                println!("unit {unit_id}: {}", String::from_utf8_lossy(&payload));
            }
            DecodeResult::EncryptedLocked(unit_id) => {
                println!("unit {unit_id}: encrypted, no --key supplied");
                exit_code = ExitCode::FAILURE;
            }
            DecodeResult::EncryptedFailed(unit_id) => {
                println!("unit {unit_id}: decryption failed");
                exit_code = ExitCode::FAILURE;
            }
            DecodeResult::Invalid => {
                println!("no valid packet found");
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    Ok(exit_code)
}

fn write_wav(path: &PathBuf, samples: &[i16]) -> Result<(), CliError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: acoustic_core::modem::SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|source| CliError::WavWrite {
        path: path.clone(),
        source,
    })?;
    for &s in samples {
        writer
            .write_sample(s)
            .map_err(|source| CliError::WavWrite {
                path: path.clone(),
                source,
            })?;
    }
    writer.finalize().map_err(|source| CliError::WavWrite {
        path: path.clone(),
        source,
    })
}

fn read_wav(path: &PathBuf) -> Result<Vec<i16>, CliError> {
    let mut reader = hound::WavReader::open(path).map_err(|source| CliError::WavRead {
        path: path.clone(),
        source,
    })?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != acoustic_core::modem::SAMPLE_RATE || spec.bits_per_sample != 16 {
        return Err(CliError::BadWavFormat(path.clone()));
    }
    reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, hound::Error>>()
        .map_err(|source| CliError::WavRead {
            path: path.clone(),
            source,
        })
}
