use std::fmt::{Debug, Formatter};

pub(crate) mod git;
pub(crate) mod github;

/// An access token for the remote, only ever handed to the transport that asks for it.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct Token(String);

impl Token {
    /// Blank tokens count as no token at all.
    pub(crate) fn new(token: String) -> Option<Self> {
        let token = token.trim();
        (!token.is_empty()).then(|| Self(token.to_string()))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(***)")
    }
}
