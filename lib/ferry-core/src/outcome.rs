//! Classified result of a dispatched request.

use serde_json::Value;

use crate::{AdapterError, Error, InvalidError, Result};

/// Exactly one outcome is produced per dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// 2xx or 304: the response body, `Value::Null` when it was empty.
    Success(Value),
    /// 422: only the `errors` member of the body.
    Invalid(InvalidError),
    /// Any other status, or a transport failure.
    AdapterError(AdapterError),
}

impl ResponseOutcome {
    /// Returns `true` for [`ResponseOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert into the payload, or the classified error.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Invalid(error) => Err(Error::Invalid(error)),
            Self::AdapterError(error) => Err(Error::Adapter(error)),
        }
    }
}
