use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

use super::error::{self, Error};

/// A plain or encrypted connection to an SMTP server.
///
/// The stream starts out plain and can be upgraded in place, either right
/// after connecting (implicit TLS) or after a `STARTTLS` exchange.
pub enum NetworkStream {
    /// Plain TCP stream
    Plain(TcpStream),
    /// Encrypted TCP stream
    Tls(Box<TlsStream<TcpStream>>),
    /// Placeholder held while the stream is swapped out for a TLS upgrade
    Disconnected,
}

impl NetworkStream {
    /// Opens a TCP connection, trying each resolved address in turn.
    ///
    /// The timeout bounds the connect attempt and is also installed as the
    /// read and write timeout of the resulting socket.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<NetworkStream, Error> {
        fn try_connect(addr: &SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
            let stream = TcpStream::connect_timeout(addr, timeout)?;
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
            Ok(stream)
        }

        let addrs = (host, port).to_socket_addrs().map_err(error::connection)?;
        let mut last_err = None;
        for addr in addrs {
            match try_connect(&addr, timeout) {
                Ok(stream) => return Ok(NetworkStream::Plain(stream)),
                Err(err) => last_err = Some(err),
            }
        }

        Err(error::connection(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not resolve hostname")
        })))
    }

    /// Upgrades a plain stream to TLS, verifying the certificate against
    /// `domain`. Already-encrypted streams are returned unchanged.
    pub fn upgrade_tls(self, domain: &str) -> Result<NetworkStream, Error> {
        match self {
            NetworkStream::Plain(stream) => {
                let connector = TlsConnector::new().map_err(error::tls)?;
                let stream = connector.connect(domain, stream).map_err(error::tls)?;
                Ok(NetworkStream::Tls(Box::new(stream)))
            }
            other => Ok(other),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, NetworkStream::Tls(_))
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NetworkStream::Plain(stream) => stream.read(buf),
            NetworkStream::Tls(stream) => stream.read(buf),
            NetworkStream::Disconnected => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "not connected",
            )),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            NetworkStream::Plain(stream) => stream.write(buf),
            NetworkStream::Tls(stream) => stream.write(buf),
            NetworkStream::Disconnected => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "not connected",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            NetworkStream::Plain(stream) => stream.flush(),
            NetworkStream::Tls(stream) => stream.flush(),
            NetworkStream::Disconnected => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "not connected",
            )),
        }
    }
}
