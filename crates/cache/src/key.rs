//! Cache key canonicalization.

use url::Url;

/// Build `base?k=v&...` with parameters sorted by name and absent or blank
/// values dropped. With no remaining parameters the bare `base` is returned.
pub fn canonical_url(base: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(k, v)| v.map(str::trim).filter(|v| !v.is_empty()).map(|v| (*k, v)))
        .collect();
    if present.is_empty() {
        return base.to_string();
    }
    present.sort();

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(present)
        .finish();
    format!("{base}?{query}")
}

/// Rewrite an arbitrary URL so its query pairs are sorted.
///
/// Strings that do not parse as URLs are returned unchanged.
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    pairs.sort();
    url.set_fragment(None);
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.herkey.com/jobs/search";

    #[test]
    fn parameter_order_does_not_matter() {
        let a = canonical_url(BASE, &[("job_type", Some("full-time")), ("work_mode", Some("hybrid"))]);
        let b = canonical_url(BASE, &[("work_mode", Some("hybrid")), ("job_type", Some("full-time"))]);
        assert_eq!(a, b);
        assert_eq!(a, "https://www.herkey.com/jobs/search?job_type=full-time&work_mode=hybrid");
    }

    #[test]
    fn absent_and_blank_params_are_dropped() {
        let url = canonical_url(BASE, &[("job_type", None), ("keyword", Some("  ")), ("work_mode", Some("hybrid"))]);
        assert_eq!(url, "https://www.herkey.com/jobs/search?work_mode=hybrid");
        assert_eq!(canonical_url(BASE, &[("job_type", None)]), BASE);
    }

    #[test]
    fn values_are_encoded() {
        let url = canonical_url(BASE, &[("keyword", Some("data scientist"))]);
        assert_eq!(url, "https://www.herkey.com/jobs/search?keyword=data+scientist");
    }

    #[test]
    fn canonicalize_sorts_existing_query() {
        assert_eq!(
            canonicalize("https://www.herkey.com/jobs/search?work_mode=hybrid&job_type=full-time"),
            canonicalize("https://www.herkey.com/jobs/search?job_type=full-time&work_mode=hybrid"),
        );
    }

    #[test]
    fn canonicalize_is_idempotent_on_canonical_urls() {
        let url = canonical_url(BASE, &[("work_mode", Some("work-from-home")), ("keyword", Some("data-scientist"))]);
        assert_eq!(canonicalize(&url), url);
    }

    #[test]
    fn canonicalize_leaves_non_urls_alone() {
        assert_eq!(canonicalize("not a url"), "not a url");
    }
}
