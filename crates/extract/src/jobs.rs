//! Job card parsing.

use std::sync::LazyLock;

use cp_domain::records::{JobRecord, NOT_AVAILABLE};
use scraper::{ElementRef, Html};

use crate::details::{split_details, split_skills, strip_client_prefix};
use crate::selectors::{absolute_url, or_na, text_of, Chain};
use crate::Parsed;

/// Selector the renderer waits for before capturing the page.
pub const CARD_WAIT_SELECTOR: &str = r#"[data-test-id="job-details"]"#;

static CARD: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"div[data-test-id="job-details"]"#,
        r#"[data-test-id="job-card"]"#,
        r#"div[class*="job-card"]"#,
    ])
});

static TITLE: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"p[data-test-id="job-title"]"#,
        r#"[data-test-id="job-title"]"#,
        r#"[class*="job-title"]"#,
        "h3",
    ])
});

static COMPANY: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"p[data-test-id="company-name"]"#,
        r#"[data-test-id="company-name"]"#,
        r#"[class*="company-name"]"#,
    ])
});

/// The paragraph holding "location | mode | experience".
static DETAILS: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"div[class*="css-14ldegz"] div[class*="css-70qvj9"] + div p"#,
        r#"[data-test-id="job-location"]"#,
        r#"p[class*="location"]"#,
    ])
});

static SKILLS: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[r#"[data-test-id="job-skills"] span"#, r#"[class*="skills"] span"#])
});

static LINK: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"a[data-test-id="job-link"]"#,
        r#"a[href*="/jobs/"]"#,
        "a[href]",
    ])
});

static DESCRIPTION: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"[data-test-id="job-description"]"#,
        r#"div[class*="MuiChip-root"] span[class*="MuiChip-label"]"#,
    ])
});

/// Parse every job card in `html`. `page_url` resolves relative links and
/// names the source.
pub fn parse_jobs(html: &str, page_url: &str) -> Parsed<JobRecord> {
    let doc = Html::parse_document(html);
    let cards = CARD.cards(&doc);
    let source = source_label(page_url);

    let records: Vec<JobRecord> = cards
        .iter()
        .map(|card| parse_card(*card, page_url, &source))
        .filter(JobRecord::is_acceptable)
        .collect();

    Parsed {
        cards_seen: cards.len(),
        records,
    }
}

fn parse_card(card: ElementRef<'_>, page_url: &str, source: &str) -> JobRecord {
    let company = COMPANY.text(card).map(|c| strip_client_prefix(&c));

    let details_el = DETAILS.first(card);
    let details = split_details(&details_el.map(text_of).unwrap_or_default());

    let skills = details_el
        .and_then(|el| skills_after(card, el))
        .or_else(|| SKILLS.text(card))
        .map(|s| split_skills(&s))
        .unwrap_or_default();

    let url = LINK
        .attr(card, "href")
        .and_then(|href| absolute_url(page_url, &href));

    let tags = DESCRIPTION.all_texts(card);
    let description = (!tags.is_empty()).then(|| tags.join(", "));

    JobRecord {
        title: or_na(TITLE.text(card)),
        company: or_na(company),
        location: details.location,
        work_mode: details.work_mode,
        experience: details.experience,
        skills,
        source: source.to_string(),
        url: or_na(url),
        description: or_na(description),
    }
}

/// Skills sit in a `span` inside the first `div` following the details
/// paragraph's parent, never outside the card.
fn skills_after(card: ElementRef<'_>, details: ElementRef<'_>) -> Option<String> {
    let parent = details.parent().and_then(ElementRef::wrap)?;
    if parent.id() == card.id() {
        return None;
    }
    let sibling = parent
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")?;
    let span_sel = scraper::Selector::parse("span").ok()?;
    sibling
        .select(&span_sel)
        .map(text_of)
        .find(|t| !t.is_empty())
}

fn source_label(page_url: &str) -> String {
    url::Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
