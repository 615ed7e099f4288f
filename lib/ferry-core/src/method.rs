//! HTTP method types.

use derive_more::Display;

/// HTTP request method used by the adapter.
///
/// JSON:API only needs four verbs: reads use `GET`, creation `POST`,
/// partial updates `PATCH` and removal `DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method - fetch one or many resources.
    #[display("GET")]
    Get,
    /// POST method - create a resource.
    #[display("POST")]
    Post,
    /// PATCH method - update a resource.
    #[display("PATCH")]
    Patch,
    /// DELETE method - remove a resource.
    #[display("DELETE")]
    Delete,
}

impl Method {
    /// Returns `true` if the method is safe (does not modify resources).
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::Get)
    }

    /// Returns `true` if the method sends a request body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Patch)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PATCH => Ok(Self::Patch),
            http::Method::DELETE => Ok(Self::Delete),
            other => Err(crate::Error::InvalidRequest(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}
