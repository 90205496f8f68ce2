//! The stub transport drops the message and returns a canned result. It is
//! useful for testing purposes.

use crate::{address::Envelope, transport::Transport};

/// This transport ignores the message and returns the given response
#[derive(Debug, Clone, Copy)]
pub struct StubTransport {
    response: StubResult,
}

impl StubTransport {
    /// Creates a new transport that always returns the given response
    pub fn new(response: StubResult) -> StubTransport {
        StubTransport { response }
    }

    /// Creates a new transport that always returns a success response
    pub fn new_positive() -> StubTransport {
        StubTransport { response: Ok(()) }
    }
}

/// Stub result type
pub type StubResult = Result<(), &'static str>;

impl Transport for StubTransport {
    type Ok = ();
    type Error = &'static str;

    fn send_raw(
        &self,
        _envelope: &Envelope,
        _headers: &str,
        _body: &str,
    ) -> Result<Self::Ok, Self::Error> {
        self.response
    }
}
