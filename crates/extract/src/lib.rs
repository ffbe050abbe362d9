//! Turns rendered job-board pages into typed listing records.
//!
//! Rendering (a real browser behind WebDriver) and parsing are separate:
//! [`jobs::parse_jobs`] and [`events::parse_events`] are pure functions of
//! the markup and can be exercised without a browser.

pub mod details;
pub mod events;
pub mod jobs;
pub mod render;
pub mod selectors;

use std::sync::Arc;
use std::time::Instant;

use cp_domain::error::Result;
use cp_domain::records::{EventRecord, JobRecord};
use cp_domain::trace::TraceEvent;

pub use render::{PageRenderer, RenderedPage, WebDriverRenderer};

/// Records accepted from one page plus how many cards were looked at.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub cards_seen: usize,
}

/// Render-then-parse pipeline for both listing kinds.
#[derive(Clone)]
pub struct Extractor {
    renderer: Arc<dyn PageRenderer>,
}

impl Extractor {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    pub async fn jobs(&self, url: &str) -> Result<Vec<JobRecord>> {
        let page = self.render(url, jobs::CARD_WAIT_SELECTOR).await?;
        let parsed = jobs::parse_jobs(&page.html, url);
        emit_counts("job", &parsed);
        Ok(parsed.records)
    }

    pub async fn events(&self, url: &str) -> Result<Vec<EventRecord>> {
        let page = self.render(url, events::CARD_WAIT_SELECTOR).await?;
        let parsed = events::parse_events(&page.html, url);
        emit_counts("event", &parsed);
        Ok(parsed.records)
    }

    async fn render(&self, url: &str, wait_for: &str) -> Result<RenderedPage> {
        let started = Instant::now();
        let page = self.renderer.render(url, wait_for).await?;
        TraceEvent::PageRendered {
            url: url.to_string(),
            html_chars: page.html.len(),
            timed_out: page.timed_out,
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();
        if page.timed_out {
            tracing::warn!(
                url = %url,
                snapshot = ?page.snapshot,
                "cards did not appear before the wait timeout; parsing best-effort"
            );
        }
        Ok(page)
    }
}

fn emit_counts<T>(kind: &str, parsed: &Parsed<T>) {
    TraceEvent::CardsExtracted {
        kind: kind.to_string(),
        cards_seen: parsed.cards_seen,
        accepted: parsed.records.len(),
    }
    .emit();
}
