//! Date heading discovery.
//!
//! A heading counts as a date section when its `id` attribute matches the
//! configured [`DatePattern`]. The visible text is never matched against; it
//! only becomes the record's `date` label.

use super::normalize::collapse_whitespace;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use tracing::{debug, info, warn};

/// Lexical predicate for date heading identifiers.
///
/// The default matches the zh-Wikipedia convention `<digits>月<digits>日`.
/// Other locales plug in their own regex through the config file.
#[derive(Clone)]
pub struct DatePattern {
    regex: Regex,
}

impl DatePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, id: &str) -> bool {
        self.regex.is_match(id)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for DatePattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(r"^\d+月\d+日$").expect("built-in date pattern compiles"),
        }
    }
}

impl fmt::Debug for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatePattern").field(&self.regex.as_str()).finish()
    }
}

/// A retained date heading and its display label.
#[derive(Debug, Clone)]
pub struct DateHeading<'a> {
    pub label: String,
    pub element: ElementRef<'a>,
}

/// All headings whose `id` matches `pattern`, in document order.
pub fn find_date_headings<'a>(
    document: &'a Html,
    heading: &Selector,
    pattern: &DatePattern,
) -> Vec<ElementRef<'a>> {
    document
        .select(heading)
        .filter(|el| el.value().attr("id").is_some_and(|id| pattern.matches(id)))
        .collect()
}

/// Date headings left after dropping the first `skip` matches.
///
/// The leading sections are the newest ones on the page and are still being
/// edited. This is purely positional: if the page stops putting "today"
/// first, the wrong section gets dropped. Headings with no visible text are
/// skipped too, after the positional skip has been applied.
pub fn locate_headings<'a>(
    document: &'a Html,
    heading: &Selector,
    pattern: &DatePattern,
    skip: usize,
) -> Vec<DateHeading<'a>> {
    let matched = find_date_headings(document, heading, pattern);
    info!(
        matched = matched.len(),
        skip,
        pattern = pattern.as_str(),
        "Located date headings"
    );

    matched
        .into_iter()
        .enumerate()
        .filter_map(|(position, element)| {
            let id = element.value().attr("id").unwrap_or_default();
            if position < skip {
                debug!(%id, position, "Skipping leading date section");
                return None;
            }
            let label = collapse_whitespace(element.text());
            if label.is_empty() {
                warn!(%id, "Date heading has no visible text; skipping");
                return None;
            }
            Some(DateHeading { label, element })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h2() -> Selector {
        Selector::parse("h2").unwrap()
    }

    const PAGE: &str = r#"
        <h2 id="3月7日">3月7日</h2>
        <h2 id="Archive">Archive</h2>
        <h2 id="3月6日"> 3月6日 </h2>
        <h2 id="x3月5日">3月5日</h2>
        <h2 id="3月5日"><span>3月</span><span>5日</span></h2>
    "#;

    #[test]
    fn test_pattern_matches_only_whole_ids() {
        let pattern = DatePattern::default();
        assert!(pattern.matches("3月5日"));
        assert!(pattern.matches("12月31日"));
        assert!(!pattern.matches("x3月5日"));
        assert!(!pattern.matches("3月"));
        assert!(!pattern.matches("March_5"));
    }

    #[test]
    fn test_find_matches_on_id_not_text() {
        let document = Html::parse_document(PAGE);
        let found = find_date_headings(&document, &h2(), &DatePattern::default());
        let ids: Vec<_> = found
            .iter()
            .map(|el| el.value().attr("id").unwrap())
            .collect();
        assert_eq!(ids, vec!["3月7日", "3月6日", "3月5日"]);
    }

    #[test]
    fn test_locate_skips_leading_and_trims_labels() {
        let document = Html::parse_document(PAGE);
        let headings = locate_headings(&document, &h2(), &DatePattern::default(), 1);
        let labels: Vec<_> = headings.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["3月6日", "3月5日"]);
    }

    #[test]
    fn test_skip_zero_and_skip_past_end() {
        let document = Html::parse_document(PAGE);
        assert_eq!(
            locate_headings(&document, &h2(), &DatePattern::default(), 0).len(),
            3
        );
        assert!(locate_headings(&document, &h2(), &DatePattern::default(), 5).is_empty());
    }

    #[test]
    fn test_no_headings_is_empty_not_error() {
        let document = Html::parse_document("<p>nothing here</p>");
        assert!(locate_headings(&document, &h2(), &DatePattern::default(), 1).is_empty());
    }

    #[test]
    fn test_custom_locale_pattern() {
        let document = Html::parse_document(r#"<h2 id="March_5">March 5</h2>"#);
        let pattern = DatePattern::new(r"^[A-Z][a-z]+_\d+$").unwrap();
        let headings = locate_headings(&document, &h2(), &pattern, 0);
        assert_eq!(headings[0].label, "March 5");
    }

    #[test]
    fn test_empty_label_is_dropped() {
        let document =
            Html::parse_document(r#"<h2 id="3月7日">x</h2><h2 id="3月6日">  </h2>"#);
        assert!(locate_headings(&document, &h2(), &DatePattern::default(), 1).is_empty());
    }
}
