//! Request descriptors.
//!
//! A [`Request`] is built once per outbound call with [`Request::builder`]
//! and is not mutated after it is handed to an [`crate::HttpClient`].
//!
//! # Example
//!
//! ```
//! use ferry_core::{Method, QueryParams, Request};
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::builder(Method::Get, "https://api.example.com/posts".parse().unwrap())
//!     .header("Accept", "application/vnd.api+json")
//!     .query_params(&QueryParams::new().with("filter[id]", "1,2"))
//!     .build();
//! assert_eq!(request.url().query(), Some("filter%5Bid%5D=1%2C2"));
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::{JSON_API_MEDIA_TYPE, Method, QueryParams};

/// An HTTP request with method, URL (query included), headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends query parameters to the URL, in key order.
    #[must_use]
    pub fn query_params(mut self, params: &QueryParams) -> Self {
        if !params.is_empty() {
            let mut query = self.url.query_pairs_mut();
            for (name, value) in params.iter() {
                query.append_pair(name, value);
            }
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl RequestBuilder<Bytes> {
    /// Set a JSON:API document body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json_api<T: serde::Serialize>(self, document: &T) -> crate::Result<Self> {
        let body = crate::to_json(document)?;
        Ok(self.header("Content-Type", JSON_API_MEDIA_TYPE).body(body))
    }
}
