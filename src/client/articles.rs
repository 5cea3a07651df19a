//! Group selection and article retrieval commands (RFC 3977 §6)
//!
//! Each command returns the status [`Response`]; for ARTICLE, HEAD and BODY
//! with a 2xx status the caller reads the multi-line content next, usually
//! through [`read_multiline`](Connection::read_multiline).

use crate::commands;
use crate::error::{Result, UsenetError};
use crate::response::{Response, ResponseStatus};
use crate::yenc::{DecodeResult, Decoder, YencDecoded};
use tracing::{trace, warn};

use super::Connection;
use super::transport::Transport;

impl<T: Transport> Connection<T> {
    /// Select a newsgroup (GROUP)
    pub async fn group(&mut self, name: &str) -> Result<Response> {
        trace!("Selecting group: {}", name);
        self.send(&commands::group(name)).await?;
        self.read_response().await
    }

    /// Check that an article exists (STAT)
    pub async fn stat(&mut self, id: &str) -> Result<Response> {
        self.send(&commands::stat(id)).await?;
        self.read_response().await
    }

    /// Request a whole article (ARTICLE)
    pub async fn article(&mut self, id: &str) -> Result<Response> {
        trace!("Fetching article: {}", id);
        self.send(&commands::article(id)).await?;
        self.read_response().await
    }

    /// Request the headers of an article (HEAD)
    pub async fn header(&mut self, id: &str) -> Result<Response> {
        trace!("Fetching head: {}", id);
        self.send(&commands::head(id)).await?;
        self.read_response().await
    }

    /// Request the body of an article (BODY)
    pub async fn body(&mut self, id: &str) -> Result<Response> {
        trace!("Fetching body: {}", id);
        self.send(&commands::body(id)).await?;
        self.read_response().await
    }

    /// Fetch an article body and collect its lines
    ///
    /// Lines keep their terminators and have dot-stuffing removed.
    ///
    /// # Errors
    ///
    /// [`UsenetError::Protocol`] when the server does not answer 2xx, plus
    /// the read errors of [`read_line`](Self::read_line).
    pub async fn fetch_body_lines(&mut self, id: &str) -> Result<Vec<Vec<u8>>> {
        let response = self.body(id).await?;
        require_ok(&response)?;

        let mut lines = Vec::new();
        self.read_multiline(|line| lines.push(line.to_vec())).await?;
        Ok(lines)
    }

    /// Fetch an article body and decode it as yEnc while it streams in
    ///
    /// The CRC is not checked; see [`YencDecoded::verify_crc32`].
    ///
    /// # Errors
    ///
    /// As [`fetch_body_lines`](Self::fetch_body_lines), and
    /// [`UsenetError::InvalidYenc`] when the body lacks `=ybegin` or `=yend`.
    pub async fn fetch_yenc_body(&mut self, id: &str) -> Result<YencDecoded> {
        let response = self.body(id).await?;
        require_ok(&response)?;

        let mut decoder = Decoder::new();
        let mut data = Vec::new();
        let mut truncated = 0usize;
        self.read_multiline(|line| {
            if decoder.decode_to_vec(line, &mut data) == DecodeResult::Truncated {
                truncated += 1;
            }
        })
        .await?;

        if truncated > 0 {
            warn!("{}: {} yEnc lines ended in a bare escape", id, truncated);
        }
        decoder.into_decoded(data)
    }
}

fn require_ok(response: &Response) -> Result<()> {
    if response.status() != ResponseStatus::CmdOk {
        return Err(UsenetError::Protocol {
            code: response.code().unwrap_or(0),
            message: response.line().into_owned(),
        });
    }
    Ok(())
}
