//! Page rendering through a W3C WebDriver endpoint.
//!
//! Job and event pages render their cards client-side, so the raw HTTP body
//! holds no listings. A headless browser session loads the page, waits for
//! the card selector, and hands back the rendered DOM.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::Engine;
use cp_domain::config::ExtractConfig;
use cp_domain::error::{Error, Result};
use serde_json::{json, Value};

/// Markup captured from one page load.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
    /// The card selector never appeared; `html` is whatever had rendered.
    pub timed_out: bool,
    /// Screenshot written when the wait timed out.
    pub snapshot: Option<PathBuf>,
}

#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` and return its markup once `wait_for` matches, or once the
    /// wait times out.
    async fn render(&self, url: &str, wait_for: &str) -> Result<RenderedPage>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// WebDriver renderer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct WebDriverRenderer {
    client: reqwest::Client,
    cfg: ExtractConfig,
}

impl WebDriverRenderer {
    pub fn new(cfg: ExtractConfig) -> Result<Self> {
        // Navigation blocks until the page load event, so leave headroom
        // beyond the card wait.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.wait_timeout_secs + 60))
            .build()
            .map_err(|e| Error::Render(format!("build webdriver client: {e}")))?;
        Ok(Self { client, cfg })
    }

    fn endpoint(&self) -> &str {
        self.cfg.webdriver_url.trim_end_matches('/')
    }

    fn capabilities(&self) -> Value {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            format!("user-agent={}", self.cfg.user_agent),
        ];
        if self.cfg.headless {
            args.insert(0, "--headless=new".into());
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }

    async fn open_session(&self) -> Result<Session> {
        let value = call(
            self.client.post(format!("{}/session", self.endpoint())),
            Some(self.capabilities()),
        )
        .await?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Render("webdriver returned no sessionId".into()))?;
        Ok(Session {
            client: self.client.clone(),
            base: format!("{}/session/{id}", self.endpoint()),
            open: true,
        })
    }

    /// Poll for `selector` until it matches or the wait times out.
    async fn wait_for_cards(&self, session: &Session, selector: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(self.cfg.wait_timeout_secs);
        let poll = Duration::from_millis(self.cfg.poll_interval_ms.max(50));
        loop {
            match session.count_elements(selector).await {
                Ok(n) if n > 0 => return true,
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "element poll failed"),
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn save_snapshot(&self, session: &Session, url: &str) -> Option<PathBuf> {
        let result = async {
            let png = session.screenshot().await?;
            tokio::fs::create_dir_all(&self.cfg.snapshot_dir).await?;
            let path = self.cfg.snapshot_dir.join(format!(
                "wait_failed-{}.png",
                chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")
            ));
            tokio::fs::write(&path, png).await?;
            Ok::<_, Error>(path)
        }
        .await;

        match result {
            Ok(path) => {
                tracing::info!(url = %url, path = %path.display(), "saved wait-timeout screenshot");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "could not save screenshot");
                None
            }
        }
    }

    async fn load(&self, session: &Session, url: &str, wait_for: &str) -> Result<RenderedPage> {
        session.navigate(url).await?;

        let appeared = self.wait_for_cards(session, wait_for).await;
        let snapshot = if appeared {
            tokio::time::sleep(Duration::from_millis(self.cfg.settle_delay_ms)).await;
            None
        } else {
            self.save_snapshot(session, url).await
        };

        let html = session.source().await?;
        Ok(RenderedPage {
            url: url.to_string(),
            html,
            timed_out: !appeared,
            snapshot,
        })
    }
}

#[async_trait::async_trait]
impl PageRenderer for WebDriverRenderer {
    async fn render(&self, url: &str, wait_for: &str) -> Result<RenderedPage> {
        let mut session = self.open_session().await?;
        tracing::debug!(url = %url, "webdriver session opened");
        let result = self.load(&session, url, wait_for).await;
        session.close().await;
        result
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session handle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A live browser session. Deleted by [`Session::close`], or from `Drop` if
/// the owning future is dropped before it gets there.
struct Session {
    client: reqwest::Client,
    base: String,
    open: bool,
}

impl Session {
    async fn navigate(&self, url: &str) -> Result<()> {
        call(
            self.client.post(format!("{}/url", self.base)),
            Some(json!({ "url": url })),
        )
        .await
        .map(|_| ())
    }

    async fn count_elements(&self, selector: &str) -> Result<usize> {
        let value = call(
            self.client.post(format!("{}/elements", self.base)),
            Some(json!({ "using": "css selector", "value": selector })),
        )
        .await?;
        Ok(value.as_array().map(Vec::len).unwrap_or(0))
    }

    async fn source(&self) -> Result<String> {
        let value = call(self.client.get(format!("{}/source", self.base)), None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Render("page source was not a string".into()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let value = call(self.client.get(format!("{}/screenshot", self.base)), None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| Error::Render("screenshot was not a string".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::Render(format!("screenshot decode: {e}")))
    }

    async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = call(self.client.delete(&self.base), None).await {
            tracing::warn!(session = %self.base, error = %e, "webdriver session delete failed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(session = %self.base, "browser session leaked: no runtime to close it");
            return;
        };
        let client = self.client.clone();
        let base = std::mem::take(&mut self.base);
        handle.spawn(async move {
            if let Err(e) = call(client.delete(&base), None).await {
                tracing::warn!(session = %base, error = %e, "deferred session delete failed");
            }
        });
    }
}

/// Send a WebDriver command and unwrap its `value` field.
async fn call(req: reqwest::RequestBuilder, body: Option<Value>) -> Result<Value> {
    let req = match body {
        Some(b) => req.json(&b),
        None => req,
    };
    let resp = req.send().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Render(format!("webdriver unreachable: {e}"))
        }
    })?;
    let status = resp.status();
    let mut body: Value = resp
        .json()
        .await
        .map_err(|e| Error::Render(format!("webdriver response: {e}")))?;
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if !status.is_success() {
        let kind = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
        let message = value.get("message").and_then(Value::as_str).unwrap_or("");
        return Err(Error::Render(format!("webdriver {}: {kind}: {message}", status.as_u16())));
    }
    Ok(value)
}
