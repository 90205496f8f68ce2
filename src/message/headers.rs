//! Ordered header accumulator.
// https://tools.ietf.org/html/rfc5322#section-2.2

use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// An ordered set of message headers with two regimes.
///
/// Most headers are append-once: [`Headers::append`] pushes a new line in
/// call order and never touches earlier ones. A few headers (X-Mailer,
/// Content-Type) occupy a single logical slot: [`Headers::set`] overwrites
/// the value in place, so the line serializes exactly once, at the position
/// of its first insertion, with its last-set value.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: Vec<(Cow<'static, str>, String)>,
}

impl Headers {
    pub const fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Appends a header line, keeping any earlier line with the same name.
    pub fn append(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Sets a keyed header, overwriting in place when already present.
    pub fn set(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        let name = name.into();
        match self.find_header_mut(&name) {
            Some(current) => *current = value.into(),
            None => self.headers.push((name, value.into())),
        }
    }

    /// First value recorded under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name_, _value)| name.eq_ignore_ascii_case(name_))
            .map(|(_name, value)| value.as_str())
    }

    /// Number of lines recorded under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(name_, _value)| name.eq_ignore_ascii_case(name_))
            .count()
    }

    fn find_header_mut(&mut self, name: &str) -> Option<&mut String> {
        self.headers
            .iter_mut()
            .find(|(name_, _value)| name.eq_ignore_ascii_case(name_))
            .map(|(_name, value)| value)
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            f.write_str(name)?;
            f.write_str(": ")?;
            f.write_str(value)?;
            f.write_str("\r\n")?;
        }
        Ok(())
    }
}
