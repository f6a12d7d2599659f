//! Demo that renders one local declaration site (and, given identifiers on
//! the command line, one remote site) and prints the document as HTML.
//!
//! Remote rendering needs HITOKOTO_EMAIL / HITOKOTO_PASSWORD in the
//! environment or a local `.env`; without them the remote site is skipped
//! with a warning and the local quotes still render.

use std::sync::Arc;

use anyhow::Result;
use hitokoto_embed::{HttpQuoteService, Orchestrator, SiteKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut orch = Orchestrator::with_env_credentials(Arc::new(HttpQuoteService::new()));

    let local = {
        let doc = orch.document_mut();
        let root = doc.root();
        let site = doc.create_element("text-meta");
        doc.set_text(
            site,
            "Knowledge is power,Francis Bacon,Meditationes Sacrae,\n\
             Stay hungry. Stay foolish.,Steve Jobs,Stanford commencement,",
        );
        doc.append_child(root, site);
        site
    };
    orch.attach(local, SiteKind::Local).await;

    let ids: Vec<String> = std::env::args().skip(1).collect();
    if !ids.is_empty() {
        let remote = {
            let doc = orch.document_mut();
            let root = doc.root();
            let site = doc.create_element("hitokoto-meta");
            doc.set_text(site, &ids.join(","));
            doc.append_child(root, site);
            site
        };
        orch.attach(remote, SiteKind::Remote).await;
    }

    println!("{}", orch.document().to_html(orch.document().root()));
    Ok(())
}
