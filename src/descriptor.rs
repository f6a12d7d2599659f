// src/descriptor.rs
//! Line/field grammar for declaration sites: local quote descriptors
//! (`text,attributed_to,from,citation_url` per line) and remote identifier
//! lists (comma/whitespace separated). Reads are tolerant, writes validate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribution fallback when a line names no author.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";
/// Source fallback when a line names no work.
pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDescriptor {
    pub text: String,
    pub attributed_to: String,
    pub from: String,
    pub citation_url: Option<String>,
}

impl QuoteDescriptor {
    /// Descriptor with both attribution fields at their fallback values.
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributed_to: ANONYMOUS_AUTHOR.to_string(),
            from: UNKNOWN_SOURCE.to_string(),
            citation_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("quote text must not be empty")]
    EmptyText,
    #[error("invalid citation url {url:?}: {reason}")]
    InvalidCitation {
        url: String,
        #[source]
        reason: url::ParseError,
    },
}

/// Parse local declaration text, one descriptor per non-empty line.
///
/// Each line splits on `,` into up to four trimmed fields. A line whose
/// first field is empty is skipped, not an error. Missing attribution
/// fields fall back to [`ANONYMOUS_AUTHOR`] / [`UNKNOWN_SOURCE`]. The
/// citation field is taken verbatim; URL validation happens on write only.
pub fn parse_local_quotes(raw: &str) -> Vec<QuoteDescriptor> {
    let mut out = Vec::new();
    for line in raw.trim().lines() {
        let mut fields = line.splitn(4, ',').map(str::trim);
        let text = fields.next().unwrap_or("");
        if text.is_empty() {
            continue;
        }
        let attributed_to = fields.next().unwrap_or("");
        let from = fields.next().unwrap_or("");
        let citation = fields.next().unwrap_or("");

        out.push(QuoteDescriptor {
            text: text.to_string(),
            attributed_to: if attributed_to.is_empty() {
                ANONYMOUS_AUTHOR.to_string()
            } else {
                attributed_to.to_string()
            },
            from: if from.is_empty() {
                UNKNOWN_SOURCE.to_string()
            } else {
                from.to_string()
            },
            citation_url: if citation.is_empty() {
                None
            } else {
                Some(citation.to_string())
            },
        });
    }
    out
}

/// Serialize descriptors back to the line format.
///
/// Fields are written in parse order, so parse → serialize → parse is
/// field-equivalent. An empty text field or a citation that does not parse
/// as an absolute URL fails with a [`ValidationError`] naming the value.
pub fn serialize_local_quotes(
    descriptors: &[QuoteDescriptor],
) -> Result<String, ValidationError> {
    let mut s = String::new();
    for d in descriptors {
        if d.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        s.push_str(&d.text);
        s.push(',');
        s.push_str(&d.attributed_to);
        s.push(',');
        s.push_str(&d.from);
        s.push(',');
        if let Some(cite) = &d.citation_url {
            url::Url::parse(cite).map_err(|reason| ValidationError::InvalidCitation {
                url: cite.clone(),
                reason,
            })?;
            s.push_str(cite);
        }
        s.push('\n');
    }
    Ok(s)
}

/// Tokenize remote identifier text: split on commas or whitespace runs,
/// trim, drop empties, collapse duplicates keeping first occurrence.
/// First-occurrence order is what fixes the rendered fragment order.
pub fn parse_remote_ids(raw: &str) -> Vec<String> {
    static RE_SEP: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE_SEP.get_or_init(|| regex::Regex::new(r"[,\s]+").unwrap());

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for token in re.split(raw.trim()) {
        let t = token.trim();
        if t.is_empty() || !seen.insert(t) {
            continue;
        }
        out.push(t.to_string());
    }
    out
}

/// Inverse of [`parse_remote_ids`]; identifiers are opaque, nothing to
/// validate.
pub fn serialize_remote_ids<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_applies_fallbacks_per_field() {
        let got = parse_local_quotes("Knowledge is power\nstay hungry, Jobs");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], QuoteDescriptor::bare("Knowledge is power"));
        assert_eq!(got[1].attributed_to, "Jobs");
        assert_eq!(got[1].from, UNKNOWN_SOURCE);
    }

    #[test]
    fn parse_skips_lines_with_empty_text() {
        let got = parse_local_quotes("\n ,Someone,Somewhere\nreal quote\n\n");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].text, "real quote");
    }

    #[test]
    fn parse_keeps_commas_inside_citation_field() {
        // splitn(4) means the fourth field swallows any later commas
        let got = parse_local_quotes("t,a,f,https://example.com/?x=1,2");
        assert_eq!(got[0].citation_url.as_deref(), Some("https://example.com/?x=1,2"));
    }

    #[test]
    fn serialize_rejects_relative_citation() {
        let mut d = QuoteDescriptor::bare("t");
        d.citation_url = Some("not a url".into());
        let err = serialize_local_quotes(std::slice::from_ref(&d)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCitation { url, .. } if url == "not a url"));
    }

    #[test]
    fn serialize_rejects_empty_text() {
        let d = QuoteDescriptor::bare("  ");
        assert!(matches!(
            serialize_local_quotes(&[d]),
            Err(ValidationError::EmptyText)
        ));
    }

    #[test]
    fn local_round_trip_is_field_equivalent() {
        let raw = "Knowledge is power,Anonymous,Unknown,\nstay hungry,Jobs,Stanford,https://example.com/a\n";
        let first = parse_local_quotes(raw);
        let serialized = serialize_local_quotes(&first).unwrap();
        assert_eq!(parse_local_quotes(&serialized), first);
    }

    #[test]
    fn remote_ids_collapse_duplicates_across_separators() {
        assert_eq!(parse_remote_ids("a, a,b ,b"), vec!["a", "b"]);
        assert_eq!(parse_remote_ids("x\ny\t z,x"), vec!["x", "y", "z"]);
        assert!(parse_remote_ids(" ,, \n").is_empty());
    }

    #[test]
    fn remote_ids_round_trip() {
        let ids = parse_remote_ids("a b,c");
        assert_eq!(serialize_remote_ids(&ids), "a,b,c");
        assert_eq!(parse_remote_ids(&serialize_remote_ids(&ids)), ids);
    }
}
