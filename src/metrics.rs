// src/metrics.rs
//! One-time registration of the embed pipeline's metric series so they show
//! up with descriptions on whatever recorder the host application installs.

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("embed_batches_total", "Render batches inserted.");
        describe_counter!("embed_nodes_total", "Quote nodes inserted across batches.");
        describe_counter!(
            "embed_dropped_items_total",
            "Remote items dropped after a quote-body fetch failure."
        );
        describe_counter!(
            "embed_fetch_errors_total",
            "Non-success responses from the quote/score endpoints."
        );
        describe_counter!("embed_auth_failures_total", "Rejected login exchanges.");
        describe_counter!(
            "embed_config_skips_total",
            "Remote renders skipped because credentials were missing."
        );
        describe_histogram!("embed_fetch_ms", "Quote body fetch time in milliseconds.");
    });
}
