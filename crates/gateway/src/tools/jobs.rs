//! Live job listings from the job board.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use cp_cache::{canonical_url, RetrievalCache};
use cp_domain::records::JobRecord;
use cp_domain::tool::ToolDefinition;
use cp_extract::Extractor;
use serde_json::{json, Value};

use super::{args, format, ToolContext, ToolHandler, ToolKind};

pub const WORK_MODES: &[&str] = &["work-from-home", "work-from-office", "hybrid"];
pub const JOB_TYPES: &[&str] = &[
    "full-time",
    "part-time",
    "returnee-program",
    "freelance/projects",
    "volunteer",
];

/// Normalized job search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    pub work_mode: Option<String>,
    pub job_type: Option<String>,
    pub keyword: Option<String>,
}

impl JobFilters {
    pub fn from_args(raw: &Value) -> anyhow::Result<Self> {
        let map = args::object(raw)?;
        Ok(Self {
            work_mode: args::optional(&map, "work_mode")?,
            job_type: args::optional(&map, "job_type")?,
            keyword: args::optional(&map, "keyword")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.work_mode.is_none() && self.job_type.is_none() && self.keyword.is_none()
    }

    /// The listing page for these filters: the bare board without filters,
    /// `<board>/search?<sorted params>` with them.
    pub fn page_url(&self, jobs_url: &str) -> String {
        let base = jobs_url.trim_end_matches('/');
        if self.is_empty() {
            return base.to_string();
        }
        canonical_url(
            &format!("{base}/search"),
            &[
                ("work_mode", self.work_mode.as_deref()),
                ("job_type", self.job_type.as_deref()),
                ("keyword", self.keyword.as_deref()),
            ],
        )
    }
}

pub struct JobLookup {
    jobs_url: String,
    cache: Arc<RetrievalCache<JobRecord>>,
    extractor: Extractor,
}

impl JobLookup {
    pub fn new(jobs_url: impl Into<String>, cache: Arc<RetrievalCache<JobRecord>>, extractor: Extractor) -> Self {
        Self {
            jobs_url: jobs_url.into(),
            cache,
            extractor,
        }
    }
}

#[async_trait]
impl ToolHandler for JobLookup {
    fn kind(&self) -> ToolKind {
        ToolKind::JobLookup
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.kind().name().into(),
            description: "Fetch live job listings from the HerKey job board. Every filter is \
                          optional; call with no arguments for the latest openings."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "work_mode": {
                        "type": "string",
                        "description": format!("Work arrangement, one of: {}.", WORK_MODES.join(", ")),
                    },
                    "job_type": {
                        "type": "string",
                        "description": format!("Kind of role, one of: {}.", JOB_TYPES.join(", ")),
                    },
                    "keyword": {
                        "type": "string",
                        "description": "Role or skill to search for, hyphenated, e.g. data-scientist.",
                    }
                }
            }),
        }
    }

    async fn call(&self, _ctx: &ToolContext, raw: &Value) -> anyhow::Result<String> {
        let filters = JobFilters::from_args(raw)?;
        let url = filters.page_url(&self.jobs_url);
        tracing::debug!(url = %url, "job lookup");

        let extractor = self.extractor.clone();
        let page = url.clone();
        let records = self
            .cache
            .get_or_fetch(&url, move || async move { extractor.jobs(&page).await })
            .await
            .with_context(|| format!("job lookup for {url}"))?;
        Ok(format::jobs(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = "https://www.herkey.com/jobs";

    #[test]
    fn no_filters_is_the_bare_board() {
        let f = JobFilters::from_args(&json!({})).unwrap();
        assert_eq!(f.page_url(BOARD), BOARD);
        let f = JobFilters::from_args(&json!({"work_mode": "", "job_type": null})).unwrap();
        assert_eq!(f.page_url(BOARD), BOARD);
    }

    #[test]
    fn filters_build_sorted_search_url() {
        let f = JobFilters::from_args(&json!({"work_mode": "work-from-home", "keyword": "data-scientist"})).unwrap();
        assert_eq!(
            f.page_url(BOARD),
            "https://www.herkey.com/jobs/search?keyword=data-scientist&work_mode=work-from-home"
        );
    }

    #[test]
    fn argument_order_does_not_change_the_url() {
        let a = JobFilters::from_args(&json!({"job_type": "part-time", "work_mode": "hybrid"})).unwrap();
        let b = JobFilters::from_args(&json!({"work_mode": "hybrid", "job_type": "part-time"})).unwrap();
        assert_eq!(a.page_url(BOARD), b.page_url(BOARD));
    }
}
