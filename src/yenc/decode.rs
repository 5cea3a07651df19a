use crate::crc32::Crc32;
use crate::{Result, UsenetError};
use tracing::warn;

use super::params::{self, KeywordLine};
use super::types::{DecodeResult, YencDecoded, YencEnd, YencHeader, YencPart};

const FLAG_HEADER: u8 = 1 << 0;
const FLAG_TRAILER: u8 = 1 << 1;
const FLAG_PART: u8 = 1 << 2;
const FLAG_CRC32: u8 = 1 << 3;
const FLAG_PART_CRC32: u8 = 1 << 4;

/// Where `part=` and `size=` keywords are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    AwaitingHeader,
    AwaitingTrailer,
}

/// Line-oriented yEnc decoder
///
/// Feed the lines of an article body one at a time. Keyword lines update the
/// decoder's fields, data lines are decoded into the caller's output. The
/// decoder tracks the CRC32 of what it actually decoded but never compares it
/// to the declared values; compare [`actual_crc32`](Self::actual_crc32)
/// against [`part_crc32`](Self::part_crc32) or [`crc32`](Self::crc32).
///
/// # Example
/// ```
/// use usenet_wire::yenc::{DecodeResult, Decoder};
///
/// let mut decoder = Decoder::new();
/// let mut out = Vec::new();
/// assert_eq!(decoder.decode_to_vec(b"=ybegin line=128 size=3 name=x\r\n", &mut out), DecodeResult::None);
/// assert_eq!(decoder.decode_to_vec(b"\x8b\x8c\x8d\r\n", &mut out), DecodeResult::Data);
/// assert_eq!(decoder.decode_to_vec(b"=yend size=3 crc32=352441c2\r\n", &mut out), DecodeResult::Complete);
/// assert_eq!(out, b"abc");
/// assert_eq!(decoder.actual_crc32(), decoder.crc32());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    line_size: usize,
    header_size: u64,
    trailer_size: u64,
    header_part: u32,
    trailer_part: u32,
    total: u32,
    name: String,
    crc32: u32,
    part_begin: u64,
    part_end: u64,
    part_crc32: u32,
    flags: u8,
    phase: Phase,
    crc: Crc32,
}

impl Decoder {
    /// Create a decoder awaiting a `=ybegin` line
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything seen so far
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Decode one line into a caller-owned output cursor
    ///
    /// On `Data` the cursor is advanced past the decoded bytes.
    pub fn decode(&mut self, line: &[u8], out: &mut &mut [u8]) -> DecodeResult {
        let line = params::trim_eol(line);
        if let Some(result) = self.filter(line) {
            return result;
        }

        let buf = std::mem::take(out);
        let (written, result) = self.decode_data(line, buf);
        *out = &mut buf[written..];
        result
    }

    /// Decode one line into `buf` starting at `*len`, advancing `*len`
    pub fn decode_into(&mut self, line: &[u8], buf: &mut [u8], len: &mut usize) -> DecodeResult {
        let line = params::trim_eol(line);
        if let Some(result) = self.filter(line) {
            return result;
        }

        let Some(free) = buf.get_mut(*len..) else {
            return DecodeResult::Overflow;
        };
        let (written, result) = self.decode_data(line, free);
        *len += written;
        result
    }

    /// Decode one line, appending to `out`
    pub fn decode_to_vec(&mut self, line: &[u8], out: &mut Vec<u8>) -> DecodeResult {
        let line = params::trim_eol(line);
        if let Some(result) = self.filter(line) {
            return result;
        }

        // decoded output is never longer than the encoded line
        let start = out.len();
        out.resize(start + line.len(), 0);
        let (written, result) = self.decode_data(line, &mut out[start..]);
        out.truncate(start + written);
        result
    }

    /// Handle everything that is not a decodable data line
    fn filter(&mut self, line: &[u8]) -> Option<DecodeResult> {
        if params::is_keyword_line(line) {
            return Some(self.parse_keywords(line));
        }
        if line.is_empty() || self.line_size == 0 || self.is_trailer() {
            return Some(DecodeResult::None);
        }
        None
    }

    fn parse_keywords(&mut self, line: &[u8]) -> DecodeResult {
        let kind = params::keyword_line(line);
        match kind {
            KeywordLine::Begin => self.flags |= FLAG_HEADER,
            KeywordLine::Part => self.flags |= FLAG_PART,
            KeywordLine::End => self.flags |= FLAG_TRAILER,
            KeywordLine::Other => {}
        }

        for param in params::params(line) {
            match param.key {
                b"line" => {
                    if let Some(n) = params::parse_number(param.value) {
                        self.line_size = n as usize;
                    }
                }
                b"begin" => {
                    if let Some(n) = params::parse_number(param.value) {
                        self.part_begin = n;
                    }
                }
                b"end" => {
                    if let Some(n) = params::parse_number(param.value) {
                        self.part_end = n;
                    }
                }
                b"part" => {
                    if let Some(n) = params::parse_number(param.value) {
                        match self.phase {
                            Phase::AwaitingHeader => self.header_part = n as u32,
                            Phase::AwaitingTrailer => self.trailer_part = n as u32,
                        }
                    }
                }
                b"size" => {
                    if let Some(n) = params::parse_number(param.value) {
                        match self.phase {
                            Phase::AwaitingHeader => self.header_size = n,
                            Phase::AwaitingTrailer => self.trailer_size = n,
                        }
                    }
                }
                b"total" => {
                    if let Some(n) = params::parse_number(param.value) {
                        self.total = n as u32;
                    }
                }
                b"crc32" => {
                    if let Some(crc) = params::parse_crc(param.value) {
                        self.crc32 = crc;
                        self.flags |= FLAG_CRC32;
                    }
                }
                b"pcrc32" => {
                    if let Some(crc) = params::parse_crc(param.value) {
                        self.part_crc32 = crc;
                        self.flags |= FLAG_PART_CRC32;
                    }
                }
                b"name" => self.name = String::from_utf8_lossy(param.value).into_owned(),
                _ => {}
            }
        }

        if kind == KeywordLine::Begin {
            self.phase = Phase::AwaitingTrailer;
        }

        if self.is_trailer() {
            DecodeResult::Complete
        } else {
            DecodeResult::None
        }
    }

    /// Decode a data line into `out`, returning the bytes written
    ///
    /// yEnc decoding: output = (input - 42) mod 256, `=X` means (X - 106) mod 256.
    fn decode_data(&mut self, line: &[u8], out: &mut [u8]) -> (usize, DecodeResult) {
        let mut written = 0;
        let mut result = DecodeResult::Data;
        let mut bytes = line.iter();

        while let Some(&byte) = bytes.next() {
            let decoded = if byte == b'=' {
                match bytes.next() {
                    Some(&escaped) => escaped.wrapping_sub(106),
                    None => {
                        result = DecodeResult::Truncated;
                        break;
                    }
                }
            } else {
                byte.wrapping_sub(42)
            };

            let Some(slot) = out.get_mut(written) else {
                result = DecodeResult::Overflow;
                break;
            };
            *slot = decoded;
            written += 1;
        }

        self.crc.update(&out[..written]);
        (written, result)
    }

    /// `line=` of the header, 0 until seen
    pub fn lines(&self) -> usize {
        self.line_size
    }

    /// `size=` of the `=ybegin` line
    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    /// `size=` of the `=yend` line
    pub fn trailer_size(&self) -> u64 {
        self.trailer_size
    }

    /// `part=` of the `=ybegin` line
    pub fn header_part(&self) -> u32 {
        self.header_part
    }

    /// `part=` of the `=yend` line
    pub fn trailer_part(&self) -> u32 {
        self.trailer_part
    }

    /// `total=` of the header
    pub fn total_parts(&self) -> u32 {
        self.total
    }

    /// Declared whole-file CRC, see [`is_crc32`](Self::is_crc32)
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Posted file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `begin=` of the `=ypart` line
    pub fn part_begin(&self) -> u64 {
        self.part_begin
    }

    /// `end=` of the `=ypart` line
    pub fn part_end(&self) -> u64 {
        self.part_end
    }

    /// Declared CRC of this part
    pub fn part_crc32(&self) -> u32 {
        self.part_crc32
    }

    /// CRC32 of the bytes decoded so far
    pub fn actual_crc32(&self) -> u32 {
        self.crc.value()
    }

    pub fn is_header(&self) -> bool {
        self.flags & FLAG_HEADER != 0
    }

    pub fn is_part(&self) -> bool {
        self.flags & FLAG_PART != 0
    }

    pub fn is_trailer(&self) -> bool {
        self.flags & FLAG_TRAILER != 0
    }

    pub fn is_crc32(&self) -> bool {
        self.flags & FLAG_CRC32 != 0
    }

    fn is_part_crc32(&self) -> bool {
        self.flags & FLAG_PART_CRC32 != 0
    }

    /// Package what the decoder saw together with the decoded `data`
    ///
    /// Fails unless both the `=ybegin` and the `=yend` line were seen.
    pub fn into_decoded(self, data: Vec<u8>) -> Result<YencDecoded> {
        if !self.is_header() {
            return Err(UsenetError::InvalidYenc("missing =ybegin header".to_string()));
        }
        if !self.is_trailer() {
            return Err(UsenetError::InvalidYenc("missing =yend trailer".to_string()));
        }

        let crc32 = self.is_crc32().then_some(self.crc32);
        let pcrc32 = self.is_part_crc32().then_some(self.part_crc32);
        let part = self.is_part().then_some(YencPart {
            begin: self.part_begin,
            end: self.part_end,
        });

        Ok(YencDecoded {
            header: YencHeader {
                line: self.line_size,
                size: self.header_size,
                part: (self.header_part > 0).then_some(self.header_part),
                total: (self.total > 0).then_some(self.total),
                name: self.name,
            },
            part,
            trailer: YencEnd {
                size: self.trailer_size,
                part: (self.trailer_part > 0).then_some(self.trailer_part),
                crc32,
                pcrc32,
            },
            calculated_crc32: self.crc.value(),
            data,
        })
    }
}

/// Decode a complete yEnc article body
///
/// The body must contain a `=ybegin` line and a `=yend` line; `=ypart` is
/// optional. Lines may end in LF or CRLF.
///
/// # Example
/// ```
/// let body = b"=ybegin line=128 size=3 name=abc.txt\r\n\x8b\x8c\x8d\r\n=yend size=3 crc32=352441c2\r\n";
/// let decoded = usenet_wire::yenc::decode_buffer(body)?;
/// assert_eq!(decoded.data, b"abc");
/// assert!(decoded.verify_crc32());
/// # Ok::<(), usenet_wire::UsenetError>(())
/// ```
pub fn decode_buffer(input: &[u8]) -> Result<YencDecoded> {
    if input.is_empty() {
        return Err(UsenetError::InvalidYenc("empty input".to_string()));
    }

    let mut decoder = Decoder::new();
    let mut data = Vec::with_capacity(input.len());

    for line in input.split(|&b| b == b'\n') {
        match decoder.decode_to_vec(line, &mut data) {
            DecodeResult::Complete => break,
            DecodeResult::Truncated => {
                warn!("yEnc line ends in a bare escape, dropping it");
            }
            _ => {}
        }
    }

    decoder.into_decoded(data)
}
