//! Lenient parsing of identifier tokens received from callers.
//!
//! Identifier lists (connection IDs in particular) are treated as filter hints:
//! a token that does not parse is dropped instead of failing the request.

use tracing::debug;

/// Outcome of parsing one identifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdToken {
    /// Token parsed to an unsigned 64-bit identifier.
    Accepted(u64),
    /// Token was empty or not a valid unsigned integer; ignored.
    Skipped,
}

impl IdToken {
    pub fn parse(token: &str) -> Self {
        match token.trim().parse::<u64>() {
            Ok(id) => IdToken::Accepted(id),
            Err(_) => IdToken::Skipped,
        }
    }

    pub fn id(self) -> Option<u64> {
        match self {
            IdToken::Accepted(id) => Some(id),
            IdToken::Skipped => None,
        }
    }
}

/// Parse every token into an identifier, skipping the ones that don't parse.
///
/// Order of the accepted identifiers follows the input order.
pub fn parse_u64s<S: AsRef<str>>(tokens: &[S]) -> Vec<u64> {
    tokens
        .iter()
        .filter_map(|t| {
            let parsed = IdToken::parse(t.as_ref());
            if parsed == IdToken::Skipped {
                debug!("Skipping unparsable identifier token: {:?}", t.as_ref());
            }
            parsed.id()
        })
        .collect()
}
