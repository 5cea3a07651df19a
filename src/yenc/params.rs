//! yEnc keyword line tokenizer
//!
//! Keyword lines look like `=ybegin part=1 total=5 line=128 size=123456 name=file.rar`.
//! Tokens are `key=value` separated by one or more spaces; `name` takes the
//! rest of the line verbatim so file names may contain spaces.

/// Which keyword line a `=y` line is, taken from its third byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeywordLine {
    /// `=ybegin`
    Begin,
    /// `=ypart`
    Part,
    /// `=yend`
    End,
    /// Any other `=y` line
    Other,
}

/// Check if a line is a yEnc keyword line
pub(crate) fn is_keyword_line(line: &[u8]) -> bool {
    line.starts_with(b"=y")
}

/// Classify a keyword line
pub(crate) fn keyword_line(line: &[u8]) -> KeywordLine {
    match line.get(2) {
        Some(b'b') => KeywordLine::Begin,
        Some(b'p') => KeywordLine::Part,
        Some(b'e') => KeywordLine::End,
        _ => KeywordLine::Other,
    }
}

/// One `key=value` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Param<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// Iterator over the tokens of a keyword line, keyword itself excluded
pub(crate) struct Params<'a> {
    rest: &'a [u8],
}

/// Tokenize a keyword line (`=ybegin ...`, `=ypart ...`, `=yend ...`)
pub(crate) fn params(line: &[u8]) -> Params<'_> {
    let rest = match line.iter().position(|&b| b == b' ') {
        Some(space) => &line[space..],
        None => &[],
    };
    Params { rest }
}

impl<'a> Iterator for Params<'a> {
    type Item = Param<'a>;

    fn next(&mut self) -> Option<Param<'a>> {
        let rest = skip_spaces(self.rest);
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let key_len = rest
            .iter()
            .position(|&b| b == b'=' || b == b' ')
            .unwrap_or(rest.len());
        let key = &rest[..key_len];

        // separator: any run of '=' and spaces
        let after = &rest[key_len..];
        let skip = after
            .iter()
            .position(|&b| b != b'=' && b != b' ')
            .unwrap_or(after.len());
        let after = &after[skip..];

        if key == b"name" {
            self.rest = &[];
            return Some(Param {
                key,
                value: trim_eol(after),
            });
        }

        let value_len = after.iter().position(|&b| b == b' ').unwrap_or(after.len());
        self.rest = &after[value_len..];
        Some(Param {
            key,
            value: &after[..value_len],
        })
    }
}

fn skip_spaces(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    &bytes[skip..]
}

/// Strip trailing CR/LF
pub(crate) fn trim_eol(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// Parse an unsigned decimal value, `0x` prefix switches to hexadecimal
pub(crate) fn parse_number(value: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(value).ok()?;
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parse a hexadecimal CRC value, optional `0x` prefix
pub(crate) fn parse_crc(value: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(value).ok()?;
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(hex, 16).ok()
}
