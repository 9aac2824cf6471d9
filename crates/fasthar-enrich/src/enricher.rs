use crate::fetcher::{FetchRequest, FetchResponse, Fetcher};
use fasthar_core::ResourceType;
use fasthar_core::har::{Entry, Har, Response};
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;

/// Outbound requests in flight per document unless configured otherwise
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// How many entries took live data and how many kept their captured data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub enriched: usize,
    pub failed: usize,
}

/// An enriched document and its per-entry tally
#[derive(Debug, Clone)]
pub struct Enriched {
    pub har: Har,
    pub report: EnrichReport,
}

/// Re-issues every captured request and merges the live response back into
/// its entry.
///
/// Entries are fetched concurrently, at most `max_concurrency` at a time, and
/// merged by their original index so the document keeps its captured order
/// whatever order the responses arrive in. A failed re-fetch never discards
/// the document: the entry keeps its captured data, gains `_enrichError`, and
/// the log is flagged `_partial`.
#[derive(Clone)]
pub struct EntryEnricher {
    fetcher: Arc<dyn Fetcher>,
    max_concurrency: usize,
}

impl EntryEnricher {
    pub fn new(fetcher: Arc<dyn Fetcher>, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub async fn enrich(&self, mut har: Har) -> Enriched {
        let requests: Vec<(usize, FetchRequest)> = har
            .log
            .entries
            .iter()
            .map(FetchRequest::from_entry)
            .enumerate()
            .collect();

        tracing::info!(
            "Enriching {} entries (max {} concurrent)",
            requests.len(),
            self.max_concurrency
        );

        let outcomes: Vec<(usize, crate::Result<FetchResponse>)> = stream::iter(requests)
            .map(|(idx, request)| {
                let fetcher = Arc::clone(&self.fetcher);
                async move { (idx, fetcher.fetch(request).await) }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut report = EnrichReport::default();
        for (idx, outcome) in outcomes {
            let entry = &mut har.log.entries[idx];
            match outcome {
                Ok(live) => {
                    apply_live_response(entry, live);
                    report.enriched += 1;
                }
                Err(e) => {
                    tracing::warn!("Re-fetch of {} failed: {}", entry.request.url, e);
                    entry.enrich_error = Some(e.to_string());
                    report.failed += 1;
                }
            }
        }

        har.log.partial = report.failed > 0;

        tracing::info!(
            "Enrichment finished: {} enriched, {} failed",
            report.enriched,
            report.failed
        );

        Enriched { har, report }
    }
}

/// Merge live response metadata into a captured entry. Timings are left as
/// captured.
fn apply_live_response(entry: &mut Entry, live: FetchResponse) {
    let body_size = live.content_length.as_deref().and_then(parse_content_length);

    let response = entry.response.get_or_insert_with(Response::blank);
    response.status = Some(i64::from(live.status));
    response.body_size = body_size;

    if let Some(content) = response.content.as_mut() {
        content.size = body_size;
        content.text = if ResourceType::keeps_body(content.resource_type.as_deref()) {
            live.body
        } else {
            None
        };
    }

    entry.enrich_error = None;
}

fn parse_content_length(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
