use std::fmt;
use std::path::PathBuf;

/// Missing or invalid command line configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { field: &'static str, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(field) => write!(f, "missing required option --{}", field),
            ConfigError::Invalid { field, message } => {
                write!(f, "invalid value for --{}: {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A summary table that is absent or does not have the expected shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: Some(line),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.path.display(), line, self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// An external program that could not be run or whose output was unusable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubprocessError {
    pub program: String,
    pub message: String,
}

impl SubprocessError {
    pub fn new(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SubprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.program, self.message)
    }
}

impl std::error::Error for SubprocessError {}
