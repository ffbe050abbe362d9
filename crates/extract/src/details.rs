//! Field-level parsing rules for job cards.

use std::sync::LazyLock;

use cp_domain::records::NOT_AVAILABLE;
use regex::Regex;

/// A year count such as "2-4 Yrs" or "5 Yr".
static EXPERIENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*-\s*\d+\s*Yr|\d+\s*Yr").expect("valid experience regex")
});

static SKILL_OVERFLOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\+\d+$").expect("valid skill overflow regex"));

static CLIENT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Client of\s*").expect("valid client prefix regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    pub location: String,
    pub work_mode: String,
    pub experience: String,
}

/// Split a "location | mode | experience" line.
///
/// Three parts are assigned positionally. With two parts the second is
/// experience only when it contains an explicit numeric year count, and work
/// mode otherwise. A single part is the location.
pub fn split_details(text: &str) -> Details {
    let parts: Vec<&str> = text.split('|').map(str::trim).collect();
    let mut details = Details {
        location: NOT_AVAILABLE.into(),
        work_mode: NOT_AVAILABLE.into(),
        experience: NOT_AVAILABLE.into(),
    };

    match parts.as_slice() {
        [location, work_mode, experience] => {
            details.location = filled(location);
            details.work_mode = filled(work_mode);
            details.experience = filled(experience);
        }
        [location, second] => {
            details.location = filled(location);
            if EXPERIENCE.is_match(second) {
                details.experience = filled(second);
            } else {
                details.work_mode = filled(second);
            }
        }
        [location] => details.location = filled(location),
        _ => {}
    }
    details
}

/// Split a "Python • SQL • Excel +3" skills line.
pub fn split_skills(text: &str) -> Vec<String> {
    text.split('•')
        .map(|s| SKILL_OVERFLOW.replace(s.trim(), "").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Agency postings read "Client of Acme"; keep just the employer.
pub fn strip_client_prefix(company: &str) -> String {
    CLIENT_PREFIX.replace(company.trim(), "").trim().to_string()
}

fn filled(part: &str) -> String {
    if part.is_empty() {
        NOT_AVAILABLE.into()
    } else {
        part.to_string()
    }
}
