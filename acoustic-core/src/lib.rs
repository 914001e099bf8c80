//! Acoustic near-ultrasonic link: bits over a speaker and a microphone.
//!
//! This crate is the full-duplex link layer - a continuous-phase binary FSK
//! modem wrapped by a framed, authenticated, optionally encrypted packet
//! protocol. It consumes and produces only in-memory 16-bit PCM sample
//! buffers; audio device I/O, WAV containers and the interactive UI are
//! deliberately outside this crate's scope.
//!
//! The entry points most callers want are [`packet::build_data`],
//! [`packet::build_auth`], [`packet::build_encrypted`] and [`packet::decode`].

pub mod bits;
pub mod checksum;
pub mod crypto;
pub mod demod;
pub mod error;
pub mod modem;
pub mod packet;

mod sync;

pub use error::CoreError;
pub use packet::{build_auth, build_data, build_encrypted, decode, DecodeOptions, DecodeResult, Mode};
