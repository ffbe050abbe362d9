//! Event card parsing.

use std::sync::LazyLock;

use cp_domain::records::{is_available, EventRecord};
use scraper::{ElementRef, Html};

use crate::details::split_skills;
use crate::selectors::{absolute_url, or_na, Chain};
use crate::Parsed;

pub const CARD_WAIT_SELECTOR: &str = r#"[data-test-id="event-card"]"#;

static CARD: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"div[data-test-id="event-card"]"#,
        r#"[data-test-id="event-card"]"#,
        r#"div[class*="event-card"]"#,
    ])
});

static TITLE: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"[data-test-id="event-title"]"#,
        r#"[class*="event-title"]"#,
        "h3",
        "h2",
    ])
});

static IMAGE: LazyLock<Chain> =
    LazyLock::new(|| Chain::new(&[r#"img[data-test-id="event-image"]"#, "img[src]"]));

static CATEGORY: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"[data-test-id="event-category"]"#,
        r#"div[class*="MuiChip-root"] span[class*="MuiChip-label"]"#,
    ])
});

static MODE: LazyLock<Chain> =
    LazyLock::new(|| Chain::new(&[r#"[data-test-id="event-mode"]"#, r#"[class*="event-mode"]"#]));

static DATE: LazyLock<Chain> =
    LazyLock::new(|| Chain::new(&[r#"[data-test-id="event-date"]"#, "time[datetime]"]));

static TIME: LazyLock<Chain> =
    LazyLock::new(|| Chain::new(&[r#"[data-test-id="event-time"]"#, r#"[class*="event-time"]"#]));

static VENUE: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[r#"[data-test-id="event-venue"]"#, r#"[class*="event-venue"]"#, "address"])
});

static PRICE: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[r#"[data-test-id="event-price"]"#, r#"[class*="event-price"]"#])
});

static ORIGINAL_PRICE: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[r#"[data-test-id="event-original-price"]"#, "del", "s"])
});

static EVENT_LINK: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[
        r#"a[data-test-id="event-link"]"#,
        r#"a[href*="/event/"]"#,
        r#"a[href*="/events/"]"#,
    ])
});

static REGISTER_LINK: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[r#"a[data-test-id="register-link"]"#, r#"a[href*="register"]"#])
});

static INTERESTED_LINK: LazyLock<Chain> = LazyLock::new(|| {
    Chain::new(&[r#"a[data-test-id="interested-link"]"#, r#"a[href*="interested"]"#])
});

pub fn parse_events(html: &str, page_url: &str) -> Parsed<EventRecord> {
    let doc = Html::parse_document(html);
    let cards = CARD.cards(&doc);

    let records: Vec<EventRecord> = cards
        .iter()
        .map(|card| parse_card(*card, page_url))
        .filter(EventRecord::is_acceptable)
        .collect();

    Parsed {
        cards_seen: cards.len(),
        records,
    }
}

fn parse_card(card: ElementRef<'_>, page_url: &str) -> EventRecord {
    let href = |chain: &Chain| {
        chain
            .attr(card, "href")
            .and_then(|h| absolute_url(page_url, &h))
    };

    let event_url = href(&EVENT_LINK).or_else(|| {
        anchor_href(card).and_then(|h| absolute_url(page_url, &h))
    });
    let id = card
        .value()
        .attr("data-event-id")
        .map(str::to_string)
        .or_else(|| event_url.as_deref().and_then(last_path_segment));

    EventRecord {
        id: or_na(id),
        title: or_na(TITLE.text(card)),
        image_url: or_na(
            IMAGE
                .attr(card, "src")
                .and_then(|src| absolute_url(page_url, &src)),
        ),
        categories: categories(card),
        mode: or_na(MODE.text(card)),
        date: or_na(DATE.text(card)),
        time: or_na(TIME.text(card)),
        venue: or_na(VENUE.text(card)),
        price: or_na(PRICE.text(card)),
        original_price: or_na(ORIGINAL_PRICE.text(card)),
        event_url: or_na(event_url),
        register_url: or_na(href(&REGISTER_LINK)),
        interested_url: or_na(href(&INTERESTED_LINK)),
    }
}

/// Category chips, or one bullet-separated line split into tags.
fn categories(card: ElementRef<'_>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for text in CATEGORY.all_texts(card) {
        for tag in split_skills(&text) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
    }
    out
}

/// Cards are sometimes the anchor themselves.
fn anchor_href(card: ElementRef<'_>) -> Option<String> {
    (card.value().name() == "a")
        .then(|| card.value().attr("href"))
        .flatten()
        .map(str::to_string)
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
        .filter(|s| is_available(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_domain::records::NOT_AVAILABLE;

    const PAGE: &str = "https://events.herkey.com/events";

    #[test]
    fn parses_full_event_card() {
        let html = r#"
            <div data-test-id="event-card" data-event-id="evt-101">
              <img data-test-id="event-image" src="/img/evt-101.png">
              <h3 data-test-id="event-title">Women in Data Summit</h3>
              <span data-test-id="event-category">Data Science</span>
              <span data-test-id="event-category">Networking</span>
              <span data-test-id="event-mode">Online</span>
              <span data-test-id="event-date">12 Nov 2025</span>
              <span data-test-id="event-time">6:00 PM IST</span>
              <span data-test-id="event-venue">Zoom</span>
              <span data-test-id="event-price">Free</span>
              <del>₹499</del>
              <a data-test-id="event-link" href="/event/women-in-data">Details</a>
              <a data-test-id="register-link" href="https://events.herkey.com/register/evt-101">Register</a>
            </div>"#;
        let parsed = parse_events(html, PAGE);
        let e = &parsed.records[0];
        assert_eq!(e.id, "evt-101");
        assert_eq!(e.title, "Women in Data Summit");
        assert_eq!(e.image_url, "https://events.herkey.com/img/evt-101.png");
        assert_eq!(e.categories, vec!["Data Science", "Networking"]);
        assert_eq!(e.mode, "Online");
        assert_eq!(e.price, "Free");
        assert_eq!(e.original_price, "₹499");
        assert_eq!(e.event_url, "https://events.herkey.com/event/women-in-data");
        assert_eq!(e.register_url, "https://events.herkey.com/register/evt-101");
        assert_eq!(e.interested_url, NOT_AVAILABLE);
    }

    #[test]
    fn id_falls_back_to_event_url() {
        let html = r#"
            <div data-test-id="event-card">
              <h3>Resume Clinic</h3>
              <a href="/event/resume-clinic-7">Open</a>
            </div>"#;
        let parsed = parse_events(html, PAGE);
        assert_eq!(parsed.records[0].id, "resume-clinic-7");
        assert_eq!(parsed.records[0].venue, NOT_AVAILABLE);
    }

    #[test]
    fn card_without_id_or_link_is_excluded() {
        let html = r#"<div data-test-id="event-card"><h3>Mystery Meetup</h3></div>"#;
        let parsed = parse_events(html, PAGE);
        assert_eq!(parsed.cards_seen, 1);
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn card_without_title_is_excluded() {
        let html = r#"<div data-test-id="event-card" data-event-id="9"><span>Free</span></div>"#;
        assert!(parse_events(html, PAGE).records.is_empty());
    }

    #[test]
    fn bullet_separated_categories_are_split() {
        let html = r#"
            <div data-test-id="event-card" data-event-id="3">
              <h3>Leadership Circle</h3>
              <span data-test-id="event-category">Leadership • Mentorship • Leadership</span>
            </div>"#;
        let e = &parse_events(html, PAGE).records[0];
        assert_eq!(e.categories, vec!["Leadership", "Mentorship"]);
    }

    #[test]
    fn anchor_cards_supply_their_own_link() {
        let html = r#"
            <a data-test-id="event-card" href="/event/careers-101">
              <h3>Careers 101</h3>
            </a>"#;
        let e = &parse_events(html, PAGE).records[0];
        assert_eq!(e.id, "careers-101");
        assert_eq!(e.event_url, "https://events.herkey.com/event/careers-101");
    }
}
