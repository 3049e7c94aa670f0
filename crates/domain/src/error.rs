use thiserror::Error;

/// A status column held a value outside its state machine.
///
/// Only reachable when a row was written by something other than this core.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} status: {value:?}")]
pub struct StatusParseError {
    pub kind: &'static str,
    pub value: String,
}

impl StatusParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
