// src/orchestrator.rs
//! # Orchestrator
//! Owns the lifecycle of each declaration site: parse the site's text,
//! resolve remote identifiers against the quote service, render, and insert
//! the batch directly after the site node. Re-render purges the previous
//! batch first; teardown purges and stops.
//!
//! Single control thread: the document is only mutated from `&mut self`
//! methods, so ordering falls out of the call sites and no locking exists.
//! The suspension points are exactly the network calls.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use tracing::warn;
use uuid::Uuid;

use crate::config::{self, CredentialSource};
use crate::descriptor::{self, QuoteDescriptor, ValidationError, ANONYMOUS_AUTHOR, UNKNOWN_SOURCE};
use crate::document::{Document, NodeId};
use crate::metrics::ensure_metrics_described;
use crate::remote::{ClientError, QuoteService, RatingAnnotation, RemoteQuote, SessionToken};
use crate::render;
use crate::tracker::RenderTracker;

/// How a declaration site's text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Line-oriented quote descriptors, rendered without network I/O.
    Local,
    /// Remote identifier list resolved against the quote service.
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteState {
    Inert,
    Rendering,
    Rendered,
    Retired,
}

#[derive(Debug)]
struct Site {
    kind: SiteKind,
    origin: Uuid,
    state: SiteState,
}

pub struct Orchestrator {
    doc: Document,
    tracker: RenderTracker,
    service: Arc<dyn QuoteService>,
    credentials: CredentialSource,
    sites: HashMap<NodeId, Site>,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn QuoteService>, credentials: CredentialSource) -> Self {
        ensure_metrics_described();
        Self {
            doc: Document::new(),
            tracker: RenderTracker::new(),
            service,
            credentials,
            sites: HashMap::new(),
        }
    }

    /// Orchestrator resolving credentials through the standard chain
    /// (build-time constant → injected value → environment).
    pub fn with_env_credentials(service: Arc<dyn QuoteService>) -> Self {
        Self::new(service, config::default_source())
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document is shared with the caller for authoring declaration
    /// sites; batch nodes stay under orchestrator ownership and must not be
    /// edited behind its back.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn state(&self, site: NodeId) -> Option<SiteState> {
        self.sites.get(&site).map(|s| s.state)
    }

    /// Origin id tagged onto every node this site renders. Stable across
    /// re-renders of one activation.
    pub fn origin(&self, site: NodeId) -> Option<Uuid> {
        self.sites.get(&site).map(|s| s.origin)
    }

    /// Activate a declaration site: hide it, stamp its origin id, render its
    /// current text. The node must already be attached to the document.
    pub async fn attach(&mut self, site: NodeId, kind: SiteKind) {
        if !self.doc.contains(site) {
            warn!("attach called with a node outside the document");
            return;
        }
        if self.sites.contains_key(&site) {
            warn!("attach called twice for the same site");
            return;
        }

        let origin = Uuid::new_v4();
        self.doc.set_attr(site, "hidden", "");
        self.doc.set_attr(site, "data-uuid", &origin.to_string());
        self.sites.insert(
            site,
            Site {
                kind,
                origin,
                state: SiteState::Inert,
            },
        );
        self.render_site(site).await;
    }

    /// Content mutation: rewrite the site's raw text and re-render. The old
    /// batch is purged before the replacement is built, so old and new nodes
    /// never interleave.
    pub async fn update_text(&mut self, site: NodeId, raw: &str) {
        if !self.sites.contains_key(&site) {
            warn!("update_text called for an unattached site");
            return;
        }
        self.doc.set_text(site, raw);
        self.render_site(site).await;
    }

    /// Typed write side for local sites. Serialization validates citation
    /// URLs up front; on error nothing changes, including the current batch.
    pub async fn set_local_quotes(
        &mut self,
        site: NodeId,
        quotes: &[QuoteDescriptor],
    ) -> Result<(), ValidationError> {
        let raw = descriptor::serialize_local_quotes(quotes)?;
        self.update_text(site, &raw).await;
        Ok(())
    }

    /// Typed write side for remote sites.
    pub async fn set_remote_ids<S: AsRef<str>>(&mut self, site: NodeId, ids: &[S]) {
        let raw = descriptor::serialize_remote_ids(ids);
        self.update_text(site, &raw).await;
    }

    /// Site teardown: purge the batch and forget the site. Terminal for this
    /// activation; the site node itself belongs to the caller.
    pub fn detach(&mut self, site: NodeId) {
        let Some(record) = self.sites.remove(&site) else {
            return;
        };
        self.tracker.purge(&mut self.doc, record.origin);
    }

    async fn render_site(&mut self, site: NodeId) {
        let Some(record) = self.sites.get_mut(&site) else {
            return;
        };
        let (kind, origin) = (record.kind, record.origin);
        record.state = SiteState::Rendering;

        // Retire whatever the previous content produced before building anew.
        self.tracker.purge(&mut self.doc, origin);

        let raw = self.doc.text(site).to_string();
        let roots = match kind {
            SiteKind::Local => self.build_local_batch(&raw, origin),
            SiteKind::Remote => match self.build_remote_batch(&raw, origin).await {
                Some(roots) => roots,
                None => {
                    // Credential or login short-circuit: no batch this run.
                    self.set_state(site, SiteState::Retired);
                    return;
                }
            },
        };

        counter!("embed_batches_total").increment(1);
        counter!("embed_nodes_total").increment(roots.len() as u64);
        self.doc.insert_fragment_after(site, &roots);
        self.set_state(site, SiteState::Rendered);
    }

    fn set_state(&mut self, site: NodeId, state: SiteState) {
        if let Some(record) = self.sites.get_mut(&site) {
            record.state = state;
        }
    }

    fn build_local_batch(&mut self, raw: &str, origin: Uuid) -> Vec<NodeId> {
        let mut roots = Vec::new();
        for (index, d) in descriptor::parse_local_quotes(raw).iter().enumerate() {
            let quote = render::render_quote(
                &mut self.doc,
                &d.text,
                &d.from,
                &d.attributed_to,
                d.citation_url.as_deref(),
            );
            self.tracker.tag(&mut self.doc, quote.root, origin, index);
            roots.push(quote.root);
        }
        roots
    }

    /// Resolve and render a remote site's identifier list. `None` means no
    /// batch was produced at all (missing credentials or rejected login);
    /// per-item failures just shrink the returned batch.
    async fn build_remote_batch(&mut self, raw: &str, origin: Uuid) -> Option<Vec<NodeId>> {
        let Some(creds) = (*self.credentials)() else {
            warn!(
                "missing {} / {}; skipping remote quote rendering",
                config::EMAIL_VAR,
                config::PASSWORD_VAR
            );
            counter!("embed_config_skips_total").increment(1);
            return None;
        };

        let ids = descriptor::parse_remote_ids(raw);
        if ids.is_empty() {
            return Some(Vec::new());
        }

        let token = match self
            .service
            .authenticate(&creds.email, &creds.password)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "login failed; abandoning remote batch");
                return None;
            }
        };

        // Fan out one task per identifier; each captures its failure as a
        // Result so no item can cancel its siblings. join_all settles them
        // all before anything touches the document.
        let service = Arc::clone(&self.service);
        let fetches = ids.iter().map(|id| {
            let service = Arc::clone(&service);
            let token = token.clone();
            async move { fetch_one(service.as_ref(), id, &token).await }
        });
        let settled = join_all(fetches).await;

        let mut roots = Vec::new();
        for (index, (id, outcome)) in ids.iter().zip(settled).enumerate() {
            match outcome {
                Ok((quote, rating)) => {
                    let cite = self.service.permalink(id);
                    let rendered = render::render_quote(
                        &mut self.doc,
                        &quote.text,
                        quote.from.as_deref().unwrap_or(UNKNOWN_SOURCE),
                        quote.attributed_to.as_deref().unwrap_or(ANONYMOUS_AUTHOR),
                        cite.as_deref(),
                    );
                    if let Some(rating) = rating {
                        render::attach_rating(&mut self.doc, rendered.content_slot, &rating);
                    }
                    // index is the declaration ordinal; a failed sibling
                    // leaves a gap rather than renumbering survivors
                    self.tracker.tag(&mut self.doc, rendered.root, origin, index);
                    roots.push(rendered.root);
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "quote fetch failed; dropping item");
                    counter!("embed_dropped_items_total").increment(1);
                }
            }
        }
        Some(roots)
    }
}

/// One identifier's resolution: body first, then rating, so a rating
/// failure can never block or retract the primary content.
async fn fetch_one(
    service: &dyn QuoteService,
    id: &str,
    token: &SessionToken,
) -> Result<(RemoteQuote, Option<RatingAnnotation>), ClientError> {
    let quote = service.fetch_quote(id, token).await?;
    let rating = match service.fetch_rating(id, token).await {
        Ok(rating) => rating,
        Err(e) => {
            warn!(id = %id, error = %e, "rating fetch failed; rendering without annotation");
            None
        }
    };
    Ok((quote, rating))
}
