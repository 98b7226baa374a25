//! Request middleware.
//!
//! [`Trace`] stamps every request with a correlation id; session handling
//! lives with the HTTP adapter in `inbound::http::session_config`.

pub mod trace;

pub use trace::Trace;
