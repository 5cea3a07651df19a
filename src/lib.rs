#![doc = include_str!("../README.md")]

mod client;
/// NNTP command builders and line framing
pub mod commands;
mod config;
/// Running CRC32 used by yEnc
pub mod crc32;
mod error;
/// NZB file format parser
pub mod nzb;
mod response;
/// yEnc binary encoding/decoding for Usenet
pub mod yenc;

pub use client::{
    Connection, ConnectionState, PlainTransport, ServerAddr, TlsTransport, Transport,
};
pub use config::{
    DEFAULT_AUTH_READ_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, ServerConfig,
};
pub use crc32::Crc32;
pub use error::{Result, UsenetError};
pub use nzb::{FileCollection, FileView, Group, Segment};
pub use response::{RESPONSE_LEN, Response, ResponseFunction, ResponseStatus, codes};
pub use yenc::{DecodeResult, Decoder, Encoder, LineEnding, PartRange, YencDecoded};
