use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

/// Error type for message building
#[derive(Debug)]
pub enum Error {
    /// Missing destination address in envelope
    MissingTo,
    /// X-Priority outside the accepted 1..=3 range
    InvalidPriority(u8),
    /// IO error while reading an attachment
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::MissingTo => fmt.write_str("missing destination address, invalid envelope"),
            Error::InvalidPriority(p) => {
                write!(fmt, "invalid X-Priority value {p}, expected 1, 2 or 3")
            }
            Error::Io(e) => write!(fmt, "attachment read failed: {e}"),
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
