//! NNTP command builders and line framing

use tracing::warn;

/// Longest command line allowed on the wire, CRLF included (RFC 3977)
pub const MAX_COMMAND_LEN: usize = 512;

/// Longest command text before the terminator
pub const MAX_COMMAND_TEXT: usize = MAX_COMMAND_LEN - 2;

/// Terminate a command with CRLF
///
/// Text longer than [`MAX_COMMAND_TEXT`] is cut so the framed line is
/// exactly [`MAX_COMMAND_LEN`] bytes. The cut loses data and is logged.
pub fn frame(command: &[u8]) -> Vec<u8> {
    let text = if command.len() > MAX_COMMAND_TEXT {
        warn!(
            "NNTP command of {} bytes truncated to {}",
            command.len() + 2,
            MAX_COMMAND_LEN
        );
        &command[..MAX_COMMAND_TEXT]
    } else {
        command
    };

    let mut line = Vec::with_capacity(text.len() + 2);
    line.extend_from_slice(text);
    line.extend_from_slice(b"\r\n");
    line
}

/// Join command tokens with single spaces
///
/// A lone `"<"` token opens an article id and a lone `">"` token closes it;
/// no spaces are put between the tokens in between, so
/// `["STAT", "<", "id@host", ">"]` becomes `STAT <id@host>`. A `">"` with no
/// open id is an ordinary token.
pub fn join_args<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut command = String::new();
    let mut in_id = false;

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if i > 0 && !in_id {
            command.push(' ');
        }
        command.push_str(token);

        match token {
            "<" => in_id = true,
            ">" => in_id = false,
            _ => {}
        }
    }

    command
}

/// Message-id without surrounding angle brackets
fn bare_id(id: &str) -> &str {
    let id = id.trim();
    id.strip_prefix('<')
        .and_then(|inner| inner.strip_suffix('>'))
        .unwrap_or(id)
}

fn with_id(command: &str, id: &str) -> String {
    join_args(&[command, "<", bare_id(id), ">"])
}

/// Build AUTHINFO USER command
pub fn authinfo_user(username: &str) -> String {
    join_args(&["AUTHINFO", "user", username])
}

/// Build AUTHINFO PASS command
pub fn authinfo_pass(password: &str) -> String {
    join_args(&["AUTHINFO", "pass", password])
}

/// Build GROUP command
pub fn group(newsgroup: &str) -> String {
    join_args(&["GROUP", newsgroup])
}

/// Build STAT command
pub fn stat(id: &str) -> String {
    with_id("STAT", id)
}

/// Build ARTICLE command
pub fn article(id: &str) -> String {
    with_id("ARTICLE", id)
}

/// Build HEAD command
pub fn head(id: &str) -> String {
    with_id("HEAD", id)
}

/// Build BODY command
pub fn body(id: &str) -> String {
    with_id("BODY", id)
}

/// Build QUIT command
pub fn quit() -> String {
    "QUIT".to_string()
}
