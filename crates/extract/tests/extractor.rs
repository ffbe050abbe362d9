use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cp_domain::error::{Error, Result};
use cp_domain::records::NOT_AVAILABLE;
use cp_extract::{Extractor, PageRenderer, RenderedPage};

const JOBS_PAGE: &str = r#"
<html><body>
  <div data-test-id="job-details">
    <p data-test-id="job-title">Data Scientist</p>
    <div class="css-14ldegz">
      <div class="css-70qvj9"><p data-test-id="company-name">Acme Analytics</p></div>
      <div><p>Bengaluru | Work from home | 2-4 Yrs</p></div>
      <div><span>Python • SQL</span></div>
    </div>
  </div>
  <div data-test-id="job-details">
    <p data-test-id="job-title">ML Engineer</p>
    <div class="css-14ldegz">
      <div class="css-70qvj9"></div>
      <div><p>Remote</p></div>
    </div>
  </div>
  <div data-test-id="job-details">
    <p data-test-id="company-name">No Title Inc</p>
  </div>
</body></html>"#;

struct StaticRenderer {
    html: &'static str,
    timed_out: bool,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl PageRenderer for StaticRenderer {
    async fn render(&self, url: &str, _wait_for: &str) -> Result<RenderedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RenderedPage {
            url: url.to_string(),
            html: self.html.to_string(),
            timed_out: self.timed_out,
            snapshot: None,
        })
    }
}

struct BrokenRenderer;

#[async_trait::async_trait]
impl PageRenderer for BrokenRenderer {
    async fn render(&self, _url: &str, _wait_for: &str) -> Result<RenderedPage> {
        Err(Error::Render("webdriver unreachable: connection refused".into()))
    }
}

#[tokio::test]
async fn extracts_jobs_from_rendered_page() {
    let renderer = Arc::new(StaticRenderer {
        html: JOBS_PAGE,
        timed_out: false,
        calls: AtomicUsize::new(0),
    });
    let extractor = Extractor::new(renderer.clone());

    let jobs = extractor.jobs("https://www.herkey.com/jobs").await.unwrap();

    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].title, "Data Scientist");
    assert_eq!(jobs[0].skills, vec!["Python", "SQL"]);
    assert_eq!(jobs[1].title, "ML Engineer");
    assert_eq!(jobs[1].company, NOT_AVAILABLE);
    assert_eq!(jobs[1].location, "Remote");
}

#[tokio::test]
async fn timed_out_render_still_parses_best_effort() {
    let renderer = Arc::new(StaticRenderer {
        html: "<html><body><div id=\"root\"></div></body></html>",
        timed_out: true,
        calls: AtomicUsize::new(0),
    });
    let extractor = Extractor::new(renderer);
    let events = extractor
        .events("https://events.herkey.com/events")
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn render_failure_propagates_to_caller() {
    let extractor = Extractor::new(Arc::new(BrokenRenderer));
    let err = extractor.jobs("https://www.herkey.com/jobs").await.unwrap_err();
    assert!(matches!(err, Error::Render(_)));
}
