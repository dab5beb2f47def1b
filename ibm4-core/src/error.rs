use core::fmt;

/// Which side of the parallel corpus a word belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A vocabulary word has no entry in the word class map.
    MissingWordClass { side: Side, word: String },
    /// Explicit tables were supplied but one of the six is absent.
    IncompleteSeedTables { table: &'static str },
    Parse { line: usize, message: String },
    LengthMismatch { source: usize, target: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingWordClass { side, word } => {
                write!(f, "{side} word {word:?} has no word class")
            }
            Error::IncompleteSeedTables { table } => {
                write!(f, "probability tables are missing {table}")
            }
            Error::Parse { line, message } => write!(f, "line {line}: {message}"),
            Error::LengthMismatch { source, target } => write!(
                f,
                "source has {source} sentences but target has {target}"
            ),
        }
    }
}

impl std::error::Error for Error {}
