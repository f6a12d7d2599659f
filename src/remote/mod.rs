// src/remote/mod.rs
//! Remote quote client: the [`QuoteService`] seam, its error taxonomy, and
//! the HTTP implementation against the Hitokoto REST API.

pub mod http;
pub mod types;

pub use http::HttpQuoteService;
pub use types::{ClientError, QuoteService, RatingAnnotation, RemoteQuote, SessionToken};
