use crate::crc32::Crc32;
use crate::{Result, UsenetError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use super::types::{LineEnding, PartRange};

/// Keyword name used when the encoder is not given one
pub const DEFAULT_NAME: &str = "a.out";

/// Default yEnc line width
pub const DEFAULT_LINE_SIZE: usize = 128;

/// Largest line width accepted (yEnc 1.3)
pub const MAX_LINE_SIZE: usize = 997;

const IOBUF_LEN: usize = 8 * 1024;

/// Streaming yEnc encoder
///
/// One encoder covers one encode session: [`init`](Self::init) writes the
/// `=ybegin` (and `=ypart`) lines, any number of
/// [`encode_chunk`](Self::encode_chunk) calls write folded data lines and
/// [`close`](Self::close) writes the `=yend` trailer. The encoder can be
/// re-initialized for the next part afterwards.
///
/// # Example
/// ```
/// use usenet_wire::yenc::{Encoder, LineEnding};
///
/// let mut out = Vec::new();
/// let mut encoder = Encoder::new("hello.txt").with_line_ending(LineEnding::CrLf);
/// encoder.init(&mut out, 5, None)?;
/// encoder.encode_chunk(&mut out, b"Hello")?;
/// encoder.close(&mut out)?;
/// assert!(out.starts_with(b"=ybegin line=128 size=5 name=hello.txt\r\n"));
/// # Ok::<(), usenet_wire::UsenetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    line_size: usize,
    name: String,
    part: Option<u32>,
    trailer_size: u64,
    column: usize,
    crc: Crc32,
    line_ending: LineEnding,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Encoder {
    /// Encoder posting under `name` with the default line width and native line endings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            line_size: DEFAULT_LINE_SIZE,
            name: name.into(),
            part: None,
            trailer_size: 0,
            column: 0,
            crc: Crc32::new(),
            line_ending: LineEnding::native(),
        }
    }

    /// Set the line width
    ///
    /// Escape pairs are never split, so widths below 2 are rejected along with
    /// anything over [`MAX_LINE_SIZE`].
    pub fn with_line_size(mut self, line_size: usize) -> Result<Self> {
        if !(2..=MAX_LINE_SIZE).contains(&line_size) {
            return Err(UsenetError::InvalidLineSize(line_size));
        }
        self.line_size = line_size;
        Ok(self)
    }

    /// Set the line terminator
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Change the line terminator between sessions
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Name written into the `=ybegin` line
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured line width
    pub fn line_size(&self) -> usize {
        self.line_size
    }

    /// CRC32 of the input consumed since `init`
    pub fn crc32(&self) -> u32 {
        self.crc.value()
    }

    /// Input bytes consumed since `init`
    pub fn bytes_encoded(&self) -> u64 {
        self.trailer_size
    }

    /// Write the `=ybegin` header (and `=ypart` for a part) and reset the counters
    ///
    /// `total_size` is the size of the whole file, also for parts.
    pub fn init<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        total_size: u64,
        part: Option<PartRange>,
    ) -> Result<()> {
        let eol = self.line_ending.as_bytes();
        let mut header = String::from("=ybegin");

        self.part = part.map(|p| p.number).filter(|&n| n > 0);
        if let Some(number) = self.part {
            header.push_str(&format!(" part={}", number));
        }
        if let Some(p) = part.filter(|p| p.total > 0) {
            header.push_str(&format!(" total={}", p.total));
        }
        header.push_str(&format!(
            " line={} size={} name={}",
            self.line_size, total_size, self.name
        ));

        out.write_all(header.as_bytes())?;
        out.write_all(eol)?;

        if let Some(p) = part.filter(|p| p.number > 0) {
            out.write_all(format!("=ypart begin={} end={}", p.begin, p.end).as_bytes())?;
            out.write_all(eol)?;
        }

        self.trailer_size = 0;
        self.column = 0;
        self.crc.reset();
        Ok(())
    }

    /// Encode a chunk of raw bytes
    pub fn encode_chunk<W: Write + ?Sized>(&mut self, out: &mut W, bytes: &[u8]) -> Result<()> {
        let mut encoded = Vec::with_capacity(bytes.len() + bytes.len() / 32 + 8);
        self.encode_into(bytes, false, &mut encoded);
        out.write_all(&encoded)?;
        Ok(())
    }

    /// Encode a chunk of raw bytes for an NNTP article body
    ///
    /// Identical to [`encode_chunk`](Self::encode_chunk) except that a `.` in
    /// the first column of a line is doubled.
    pub fn encode_usenet_chunk<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        bytes: &[u8],
    ) -> Result<()> {
        let mut encoded = Vec::with_capacity(bytes.len() + bytes.len() / 32 + 8);
        self.encode_into(bytes, true, &mut encoded);
        out.write_all(&encoded)?;
        Ok(())
    }

    /// Terminate the data and write the `=yend` trailer
    pub fn close<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        let mut trailer = format!("=yend size={}", self.trailer_size);
        match self.part {
            Some(number) => {
                trailer.push_str(&format!(" part={} pcrc32={:x}", number, self.crc.value()))
            }
            None => trailer.push_str(&format!(" crc32={:x}", self.crc.value())),
        }
        self.finish(out, trailer)
    }

    /// Write the trailer of the last part of a multi-part file, adding the
    /// whole-file `crc32`
    pub fn close_with_total<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        total_crc32: u32,
    ) -> Result<()> {
        let mut trailer = format!("=yend size={}", self.trailer_size);
        if let Some(number) = self.part {
            trailer.push_str(&format!(" part={} pcrc32={:x}", number, self.crc.value()));
        }
        trailer.push_str(&format!(" crc32={:x}", total_crc32));
        self.finish(out, trailer)
    }

    fn finish<W: Write + ?Sized>(&mut self, out: &mut W, trailer: String) -> Result<()> {
        let eol = self.line_ending.as_bytes();
        if self.column != 0 {
            out.write_all(eol)?;
        }
        out.write_all(trailer.as_bytes())?;
        out.write_all(eol)?;

        self.column = 0;
        self.trailer_size = 0;
        Ok(())
    }

    /// Byte transform shared by both chunk variants
    ///
    /// yEnc encoding: output = (input + 42) mod 256, critical results are
    /// written as `=` followed by (output + 64) mod 256.
    fn encode_into(&mut self, bytes: &[u8], usenet: bool, out: &mut Vec<u8>) {
        let eol = self.line_ending.as_bytes();

        for &byte in bytes {
            let encoded = byte.wrapping_add(42);

            if is_critical_byte(encoded) {
                // keep the pair on one line
                if self.column > 0 && self.column + 2 > self.line_size {
                    out.extend_from_slice(eol);
                    self.column = 0;
                }
                out.push(b'=');
                out.push(encoded.wrapping_add(64));
                self.column += 2;
            } else {
                out.push(encoded);
                self.column += 1;

                if usenet && self.column == 1 && encoded == b'.' {
                    out.push(b'.');
                    self.column += 1;
                }
            }

            if self.column >= self.line_size {
                out.extend_from_slice(eol);
                self.column = 0;
            }
        }

        self.crc.update(bytes);
        self.trailer_size += bytes.len() as u64;
    }
}

/// Check if an encoded byte must always be escaped
fn is_critical_byte(byte: u8) -> bool {
    matches!(
        byte,
        0x00 |  // NUL
        0x0A |  // LF
        0x0D |  // CR
        0x3D // '='
    )
}

/// Encode a whole buffer as a single yEnc post with CRLF line endings
///
/// # Example
/// ```
/// let encoded = usenet_wire::yenc::encode_buffer(b"Hello", "test.bin", 128)?;
/// let decoded = usenet_wire::yenc::decode_buffer(&encoded)?;
/// assert_eq!(decoded.data, b"Hello");
/// # Ok::<(), usenet_wire::UsenetError>(())
/// ```
pub fn encode_buffer(data: &[u8], name: &str, line_size: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() + data.len() / 32 + 128);
    let mut encoder = Encoder::new(name)
        .with_line_size(line_size)?
        .with_line_ending(LineEnding::CrLf);

    encoder.init(&mut output, data.len() as u64, None)?;
    encoder.encode_chunk(&mut output, data)?;
    encoder.close(&mut output)?;
    Ok(output)
}

/// Encode one part of a multi-part post with CRLF line endings
///
/// `file_size` is the size of the complete file; `data` is this part only.
pub fn encode_part(
    data: &[u8],
    name: &str,
    line_size: usize,
    part: PartRange,
    file_size: u64,
) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() + data.len() / 32 + 192);
    let mut encoder = Encoder::new(name)
        .with_line_size(line_size)?
        .with_line_ending(LineEnding::CrLf);

    encoder.init(&mut output, file_size, Some(part))?;
    encoder.encode_chunk(&mut output, data)?;
    encoder.close(&mut output)?;
    Ok(output)
}

/// Encode a file into `out` with native line endings
///
/// The `name` keyword is the base name of `path`.
pub fn encode_file<W: Write + ?Sized>(
    path: impl AsRef<Path>,
    out: &mut W,
    line_size: usize,
) -> Result<()> {
    stream_file(path.as_ref(), out, line_size, LineEnding::native(), false)
}

/// Encode a file into `out` ready for an NNTP article body: CRLF line
/// endings and leading dots doubled
pub fn encode_file_for_usenet<W: Write + ?Sized>(
    path: impl AsRef<Path>,
    out: &mut W,
    line_size: usize,
) -> Result<()> {
    stream_file(path.as_ref(), out, line_size, LineEnding::CrLf, true)
}

fn stream_file<W: Write + ?Sized>(
    path: &Path,
    out: &mut W,
    line_size: usize,
    line_ending: LineEnding,
    usenet: bool,
) -> Result<()> {
    let mut input = File::open(path)?;
    let file_size = input.metadata()?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    debug!("yEnc encoding {} ({} bytes)", name, file_size);

    let mut encoder = Encoder::new(name)
        .with_line_size(line_size)?
        .with_line_ending(line_ending);
    encoder.init(out, file_size, None)?;

    let mut iobuf = vec![0u8; IOBUF_LEN];
    loop {
        let n = match input.read(&mut iobuf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if usenet {
            encoder.encode_usenet_chunk(out, &iobuf[..n])?;
        } else {
            encoder.encode_chunk(out, &iobuf[..n])?;
        }
    }

    encoder.close(out)
}
