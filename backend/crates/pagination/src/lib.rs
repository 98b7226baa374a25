//! Opaque cursor and pagination envelope primitives shared by list endpoints.
//!
//! A [`Cursor`] wraps an arbitrary serialisable keyset position (for example
//! the sort value and identifier of the last row on a page) and encodes it as
//! URL-safe base64 JSON. Clients treat the token as opaque and hand it back to
//! fetch the next page.
//!
//! [`Paginated`] is the response envelope: the page items, the effective page
//! size, and [`PaginationLinks`] pointing at the current and next pages.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Page size used when the caller does not request one.
pub const DEFAULT_LIMIT: usize = 12;
/// Largest page size a caller may request.
pub const MAX_LIMIT: usize = 50;
/// Upper bound on accepted cursor token length.
pub const MAX_CURSOR_LEN: usize = 1024;

const CURSOR_PARAM: &str = "cursor";
const LIMIT_PARAM: &str = "limit";

/// Errors raised while encoding or decoding cursors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The cursor token is too long to be one we issued.
    #[error("cursor exceeds {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The token is not valid URL-safe base64.
    #[error("cursor is not valid base64: {message}")]
    Encoding {
        /// Decoder failure description.
        message: String,
    },
    /// The decoded payload does not describe a key of the expected shape.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Deserialiser failure description.
        message: String,
    },
}

/// Opaque keyset cursor.
///
/// # Examples
/// ```
/// use pagination::Cursor;
///
/// let cursor = Cursor::new(("2024-01-01", 7_u32));
/// let token = cursor.encode().expect("encodes");
/// let decoded: Cursor<(String, u32)> = Cursor::decode(&token).expect("decodes");
/// assert_eq!(decoded.key().1, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap a keyset position.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the keyset position.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor and return the keyset position.
    pub fn into_inner(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the cursor as an opaque URL-safe token.
    ///
    /// # Errors
    /// Returns [`CursorError::Payload`] when the key cannot be serialised.
    pub fn encode(&self) -> Result<String, CursorError> {
        let bytes = serde_json::to_vec(&self.key).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode a token previously produced by [`Cursor::encode`].
    ///
    /// # Errors
    /// Returns [`CursorError::TooLong`], [`CursorError::Encoding`], or
    /// [`CursorError::Payload`] when the token was not issued by us.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        if token.len() > MAX_CURSOR_LEN {
            return Err(CursorError::TooLong {
                max: MAX_CURSOR_LEN,
            });
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let key = serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}

/// Normalised page size.
///
/// # Examples
/// ```
/// use pagination::{PageLimit, DEFAULT_LIMIT, MAX_LIMIT};
///
/// assert_eq!(PageLimit::new(None).get(), DEFAULT_LIMIT);
/// assert_eq!(PageLimit::new(Some(0)).get(), 1);
/// assert_eq!(PageLimit::new(Some(10_000)).get(), MAX_LIMIT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageLimit(usize);

impl PageLimit {
    /// Clamp a requested page size into `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(requested: Option<usize>) -> Self {
        Self(requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
    }

    /// Return the page size.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self(DEFAULT_LIMIT)
    }
}

/// Navigation links attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// Link reproducing the current page.
    #[serde(rename = "self")]
    pub self_: String,
    /// Link to the following page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PaginationLinks {
    /// Build links from the request URL.
    ///
    /// Existing `limit` and `cursor` query parameters are replaced; every
    /// other parameter (filters, sort) is preserved so the next link walks
    /// the same result set.
    ///
    /// # Examples
    /// ```
    /// use pagination::PaginationLinks;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://cars.test/api/v1/listings?brand=BMW&cursor=old").unwrap();
    /// let links = PaginationLinks::from_request(&url, 12, Some("abc"));
    /// assert_eq!(links.self_, "https://cars.test/api/v1/listings?brand=BMW&limit=12&cursor=old");
    /// assert_eq!(
    ///     links.next.as_deref(),
    ///     Some("https://cars.test/api/v1/listings?brand=BMW&limit=12&cursor=abc")
    /// );
    /// ```
    #[must_use]
    pub fn from_request(request_url: &Url, limit: usize, next_cursor: Option<&str>) -> Self {
        let current_cursor = request_url
            .query_pairs()
            .find(|(name, _)| name == CURSOR_PARAM)
            .map(|(_, value)| value.into_owned());
        Self {
            self_: with_page_params(request_url, limit, current_cursor.as_deref()).into(),
            next: next_cursor.map(|cursor| with_page_params(request_url, limit, Some(cursor)).into()),
        }
    }
}

fn with_page_params(base: &Url, limit: usize, cursor: Option<&str>) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| name != CURSOR_PARAM && name != LIMIT_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (name, value) in &retained {
            pairs.append_pair(name, value);
        }
        pairs.append_pair(LIMIT_PARAM, &limit.to_string());
        if let Some(token) = cursor {
            pairs.append_pair(CURSOR_PARAM, token);
        }
    }
    url
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Effective page size used for the query.
    pub limit: usize,
    /// Navigation links.
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Assemble an envelope.
    #[must_use]
    pub const fn new(data: Vec<T>, limit: usize, links: PaginationLinks) -> Self {
        Self { data, limit, links }
    }

    /// Transform each item while keeping the page metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            limit: self.limit,
            links: self.links,
        }
    }
}
