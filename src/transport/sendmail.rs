//! The sendmail transport hands the message to the local MTA through the
//! `sendmail` command.

use std::{
    error::Error as StdError,
    ffi::OsString,
    fmt::{self, Display, Formatter},
    io::prelude::*,
    process::{Command, Stdio},
};

use crate::{address::Envelope, transport::Transport};

const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// Sends a message using the `sendmail` command
#[derive(Debug)]
pub struct SendmailTransport {
    command: OsString,
}

impl SendmailTransport {
    /// Creates a new transport with the default `/usr/sbin/sendmail` command
    pub fn new() -> SendmailTransport {
        SendmailTransport {
            command: DEFAULT_SENDMAIL.into(),
        }
    }

    /// Creates a new transport to the given sendmail command
    pub fn new_with_command<S: Into<OsString>>(command: S) -> SendmailTransport {
        SendmailTransport {
            command: command.into(),
        }
    }

    fn command(&self, envelope: &Envelope) -> Command {
        let mut c = Command::new(&self.command);
        c.arg("-i")
            .arg("-f")
            .arg(envelope.from().email())
            .args(envelope.to().iter().map(|to| to.email()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        c
    }
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SendmailTransport {
    type Ok = ();
    type Error = Error;

    fn send_raw(
        &self,
        envelope: &Envelope,
        headers: &str,
        body: &str,
    ) -> Result<Self::Ok, Self::Error> {
        let mut process = self.command(envelope).spawn()?;

        let stdin = process.stdin.as_mut().ok_or(Error::NoStdin)?;
        stdin.write_all(headers.as_bytes())?;
        stdin.write_all(b"\r\n")?;
        stdin.write_all(body.as_bytes())?;
        let output = process.wait_with_output()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Client(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}

/// Error type for the sendmail transport
#[derive(Debug)]
pub enum Error {
    /// Command could not be spawned or written to
    Io(std::io::Error),
    /// The child process had no stdin pipe
    NoStdin,
    /// The command exited with a failure status
    Client(String),
}

impl Display for Error {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(fmt, "sendmail failed: {e}"),
            Error::NoStdin => fmt.write_str("sendmail stdin was not captured"),
            Error::Client(stderr) => write!(fmt, "sendmail exited with an error: {stderr}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}
