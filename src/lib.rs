// src/lib.rs
// Public library surface for integration tests (and embedding hosts).

pub mod config;
pub mod descriptor;
pub mod document;
pub mod metrics;
pub mod orchestrator;
pub mod remote;
pub mod render;
pub mod tracker;

// ---- Re-exports for stable public API ----
pub use crate::descriptor::{
    parse_local_quotes, parse_remote_ids, QuoteDescriptor, ValidationError,
};
pub use crate::document::{Document, NodeId};
pub use crate::orchestrator::{Orchestrator, SiteKind, SiteState};
pub use crate::remote::{
    ClientError, HttpQuoteService, QuoteService, RatingAnnotation, RemoteQuote, SessionToken,
};
pub use crate::render::{attach_rating, attribution_title, render_quote, RenderedQuote};
pub use crate::tracker::{RenderTracker, INDEX_ATTR, ORIGIN_ATTR};
