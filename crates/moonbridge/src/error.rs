//! Error types for moonbridge

use std::fmt;

use thiserror::Error;

/// Which half of a table entry failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPosition {
    /// The table key
    Key,
    /// The table value
    Value,
}

impl fmt::Display for EntryPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPosition::Key => write!(f, "key"),
            EntryPosition::Value => write!(f, "value"),
        }
    }
}

/// Errors raised while reading values off the Lua stack.
///
/// Only the decoder produces these. Pushing never fails: shapes the
/// encoder cannot express degrade to nil instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarshalError {
    /// A table key decoded to something other than a string or number
    #[error("Unsupported table key kind: {kind} (only string and number keys can be decoded)")]
    UnsupportedKeyKind {
        /// Host type name the key decoded to
        kind: &'static str,
    },

    /// A stack slot holds a Lua type the decoder does not model
    #[error("Unsupported value kind on the Lua stack: {kind}")]
    UnsupportedValueKind {
        /// Lua type name (function, userdata, thread, ...)
        kind: String,
    },

    /// A table key or value failed to decode
    #[error("Failed to decode table {position}: {source}")]
    NestedDecodeFailure {
        /// Whether the key or the value failed
        position: EntryPosition,
        /// The original cause
        #[source]
        source: Box<MarshalError>,
    },

    /// Table nesting went deeper than the configured limit
    #[error("Table nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded {
        /// The configured limit
        limit: usize,
    },
}

impl MarshalError {
    /// Wrap `self` as the cause of a failed table entry
    pub fn nested(self, position: EntryPosition) -> Self {
        MarshalError::NestedDecodeFailure {
            position,
            source: Box::new(self),
        }
    }

    /// Follow `NestedDecodeFailure` links down to the original cause
    pub fn root_cause(&self) -> &MarshalError {
        match self {
            MarshalError::NestedDecodeFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Main error type for moonbridge operations
#[derive(Error, Debug)]
pub enum Error {
    /// The Lua state could not be allocated
    #[error("Failed to create Lua state")]
    StateCreation,

    /// A chunk failed to compile or a file failed to load
    #[error("Load error: {message}")]
    Load {
        /// Message reported by Lua
        message: String,
    },

    /// A protected call raised an error
    #[error("Runtime error: {message}")]
    Runtime {
        /// Message reported by Lua
        message: String,
    },

    /// A name or path could not be passed to Lua (interior NUL byte, non-UTF-8 path)
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// A stack index names no slot, or the stack cannot grow to reach it
    #[error("Invalid stack index {index} (stack holds {top} values)")]
    InvalidIndex {
        /// The requested index
        index: i32,
        /// Stack depth at the time of the request
        top: i32,
    },

    /// A value could not be decoded
    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

/// Result type alias for moonbridge operations
pub type Result<T> = std::result::Result<T, Error>;
