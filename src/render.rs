// src/render.rs
//! # Quote renderer
//! Pure document construction mapping one quote to a display fragment.
//! No I/O; cannot fail under valid inputs.
//!
//! Shape: `<blockquote title="who(n.d.).from." cite=...><div>text</div></blockquote>`,
//! with an optional `<sub>` rating annotation appended to the inner `div`.

use crate::document::{Document, NodeId};
use crate::remote::RatingAnnotation;

/// Handles to a rendered quote: the insertable root and the inner content
/// slot a rating can be appended to later without re-querying the tree.
#[derive(Debug, Clone, Copy)]
pub struct RenderedQuote {
    pub root: NodeId,
    pub content_slot: NodeId,
}

/// APA-style attribution, `"<attributed_to>(n.d.).<from>."`.
pub fn attribution_title(from: &str, attributed_to: &str) -> String {
    format!("{attributed_to}(n.d.).{from}.")
}

/// Build the display fragment for one quote. The root stays detached; the
/// caller tags and inserts it.
pub fn render_quote(
    doc: &mut Document,
    text: &str,
    from: &str,
    attributed_to: &str,
    citation_url: Option<&str>,
) -> RenderedQuote {
    let root = doc.create_element("blockquote");
    doc.set_attr(root, "title", &attribution_title(from, attributed_to));
    if let Some(cite) = citation_url {
        doc.set_attr(root, "cite", cite);
    }

    let content_slot = doc.create_element("div");
    doc.set_text(content_slot, text);
    doc.append_child(root, content_slot);

    RenderedQuote { root, content_slot }
}

/// Append the rating annotation to a quote's content slot. The zero rating
/// renders the same way as a real one; absence of a rating renders nothing.
pub fn attach_rating(doc: &mut Document, content_slot: NodeId, rating: &RatingAnnotation) {
    let sub = doc.create_element("sub");
    doc.set_text(sub, &format!("{}", rating.average));
    doc.set_attr(
        sub,
        "title",
        &format!("total:{}\nparticipants:{}", rating.total, rating.participants),
    );
    doc.append_child(content_slot, sub);
}
