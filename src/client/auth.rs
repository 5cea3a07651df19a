//! NNTP authentication (AUTHINFO USER/PASS)

use crate::commands;
use crate::error::{Result, UsenetError};
use crate::response::ResponseStatus;
use tracing::debug;

use super::Connection;
use super::transport::Transport;

impl<T: Transport> Connection<T> {
    /// Authenticate with the configured username and password
    ///
    /// `AUTHINFO user` must be answered with 3xx and `AUTHINFO pass` with
    /// 2xx. There is no retry.
    ///
    /// # Errors
    ///
    /// [`UsenetError::AuthFailed`] carrying the server's status line.
    pub(super) async fn authenticate(&mut self) -> Result<()> {
        let Some((username, password)) = self
            .server
            .credentials()
            .map(|(u, p)| (u.to_string(), p.to_string()))
        else {
            return Ok(());
        };
        debug!("Authenticating as {}", username);

        self.send(&commands::authinfo_user(&username)).await?;
        let response = self.read_response().await?;
        if response.status() != ResponseStatus::CmdOkSoFar {
            return Err(UsenetError::AuthFailed(response.line().into_owned()));
        }

        self.send(&commands::authinfo_pass(&password)).await?;
        let response = self.read_response().await?;
        if response.status() != ResponseStatus::CmdOk {
            return Err(UsenetError::AuthFailed(response.line().into_owned()));
        }

        debug!("Authentication successful");
        Ok(())
    }
}
