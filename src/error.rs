use std::fmt;

/// Construction-time failures. These are fatal: the builder that produced
/// one returns no compiled object.
///
/// Runtime conditions (an unrecognised byte while scanning, a token the
/// parser cannot place) are not represented here; they flow through the
/// diagnostics sink in [`crate::loader::log`] or latch the parser driver in
/// its error state.
#[derive(Debug)]
pub enum Error {
    /// Malformed regular expression: unmatched paren, `*` with no atom,
    /// bad character class, unsupported range.
    InvalidRegex(String),
    /// A grammar that violates the declaration rules: terminal on the left
    /// of a production, unknown right-hand-side symbol, wrong number of
    /// start-symbol productions, a name declared in both symbol tables,
    /// or a production/semantic-action count mismatch.
    GrammarMalformed(String),
    /// An LL(1) cell ended up with more than one production.
    GrammarAmbiguous {
        non_terminal: String,
        terminal: String,
        productions: Vec<usize>,
    },
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRegex(msg) => write!(f, "invalid regex: {msg}"),
            Error::GrammarMalformed(msg) => write!(f, "malformed grammar: {msg}"),
            Error::GrammarAmbiguous {
                non_terminal,
                terminal,
                productions,
            } => write!(
                f,
                "grammar is not LL(1): productions {productions:?} all apply at ({non_terminal}, {terminal})"
            ),
            Error::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
