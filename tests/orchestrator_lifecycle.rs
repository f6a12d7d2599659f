// tests/orchestrator_lifecycle.rs
// Batch invariants across re-render and teardown: one active batch per
// site, stable origin id, leak-free detach.

use std::sync::Arc;

use async_trait::async_trait;
use hitokoto_embed::config::Credentials;
use hitokoto_embed::{
    ClientError, NodeId, Orchestrator, QuoteDescriptor, QuoteService, RatingAnnotation,
    RemoteQuote, SessionToken, SiteKind, SiteState, ORIGIN_ATTR,
};

struct NoRemote;

#[async_trait]
impl QuoteService for NoRemote {
    async fn authenticate(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<SessionToken, ClientError> {
        unreachable!("local-only tests never authenticate")
    }
    async fn fetch_quote(
        &self,
        _id: &str,
        _token: &SessionToken,
    ) -> Result<RemoteQuote, ClientError> {
        unreachable!()
    }
    async fn fetch_rating(
        &self,
        _id: &str,
        _token: &SessionToken,
    ) -> Result<Option<RatingAnnotation>, ClientError> {
        unreachable!()
    }
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(
        Arc::new(NoRemote),
        Arc::new(|| {
            Some(Credentials {
                email: "e@example.com".into(),
                password: "pw".into(),
            })
        }),
    )
}

fn local_site(orch: &mut Orchestrator, text: &str) -> NodeId {
    let doc = orch.document_mut();
    let root = doc.root();
    let site = doc.create_element("text-meta");
    doc.set_text(site, text);
    doc.append_child(root, site);
    site
}

fn batch_roots(orch: &Orchestrator, site: NodeId) -> Vec<NodeId> {
    let origin = orch.origin(site).unwrap().to_string();
    orch.document().find_by_attr(ORIGIN_ATTR, &origin)
}

#[tokio::test]
async fn rerender_leaves_exactly_one_batch() {
    let mut orch = orchestrator();
    let site = local_site(&mut orch, "first,A,,\nsecond,B,,");
    orch.attach(site, SiteKind::Local).await;
    assert_eq!(batch_roots(&orch, site).len(), 2);
    let origin_before = orch.origin(site);

    orch.update_text(site, "replacement,C,,").await;

    assert_eq!(orch.origin(site), origin_before, "origin survives re-render");
    let roots = batch_roots(&orch, site);
    assert_eq!(roots.len(), 1, "never the union of old and new nodes");
    let doc = orch.document();
    assert_eq!(doc.text(doc.children(roots[0])[0]), "replacement");
}

#[tokio::test]
async fn batch_inserts_directly_after_the_site() {
    let mut orch = orchestrator();
    let site = local_site(&mut orch, "a,,,\nb,,,");
    // a later sibling must end up after the whole batch
    let trailing = {
        let doc = orch.document_mut();
        let root = doc.root();
        let n = doc.create_element("p");
        doc.append_child(root, n);
        n
    };
    orch.attach(site, SiteKind::Local).await;

    let doc = orch.document();
    let siblings = doc.children(doc.root());
    let roots = batch_roots(&orch, site);
    assert_eq!(siblings, &[site, roots[0], roots[1], trailing]);
}

#[tokio::test]
async fn detach_leaves_no_residual_nodes() {
    let mut orch = orchestrator();
    let site = local_site(&mut orch, "one,,,\ntwo,,,\nthree,,,");
    orch.attach(site, SiteKind::Local).await;
    let origin = orch.origin(site).unwrap().to_string();
    assert_eq!(batch_roots(&orch, site).len(), 3);

    orch.detach(site);

    assert!(orch.document().find_by_attr(ORIGIN_ATTR, &origin).is_empty());
    assert_eq!(orch.state(site), None);
    // teardown is terminal: nothing re-renders afterwards
    orch.update_text(site, "ghost,,,").await;
    assert!(orch.document().find_by_attr(ORIGIN_ATTR, &origin).is_empty());
}

#[tokio::test]
async fn attach_hides_and_stamps_the_site() {
    let mut orch = orchestrator();
    let site = local_site(&mut orch, "a,,,");
    orch.attach(site, SiteKind::Local).await;

    let doc = orch.document();
    assert_eq!(doc.attr(site, "hidden"), Some(""));
    assert_eq!(
        doc.attr(site, "data-uuid"),
        Some(orch.origin(site).unwrap().to_string().as_str())
    );
    assert_eq!(orch.state(site), Some(SiteState::Rendered));
}

#[tokio::test]
async fn invalid_citation_on_write_keeps_the_previous_batch() {
    let mut orch = orchestrator();
    let site = local_site(&mut orch, "original,,,");
    orch.attach(site, SiteKind::Local).await;

    let mut bad = QuoteDescriptor::bare("replacement");
    bad.citation_url = Some("::not a url::".into());
    let err = orch.set_local_quotes(site, &[bad]).await;
    assert!(err.is_err(), "validation surfaces synchronously");

    let roots = batch_roots(&orch, site);
    assert_eq!(roots.len(), 1);
    let doc = orch.document();
    assert_eq!(doc.text(doc.children(roots[0])[0]), "original");
}

#[tokio::test]
async fn typed_setter_round_trips_through_site_text() {
    let mut orch = orchestrator();
    let site = local_site(&mut orch, "");
    orch.attach(site, SiteKind::Local).await;
    assert!(batch_roots(&orch, site).is_empty());

    let mut d = QuoteDescriptor::bare("Knowledge is power");
    d.citation_url = Some("https://example.com/bacon".into());
    orch.set_local_quotes(site, std::slice::from_ref(&d))
        .await
        .unwrap();

    let roots = batch_roots(&orch, site);
    assert_eq!(roots.len(), 1);
    let doc = orch.document();
    assert_eq!(doc.attr(roots[0], "cite"), Some("https://example.com/bacon"));
    assert_eq!(
        hitokoto_embed::parse_local_quotes(doc.text(site)),
        vec![d]
    );
}
