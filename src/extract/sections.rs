//! Locate the list of news items belonging to a date heading.
//!
//! Portal markup for one day looks like:
//!
//! ```html
//! <div class="mw-heading mw-heading2"><h2 id="3月5日">3月5日</h2>…</div>
//! <div class="excerpt-block">
//!   <ul><li>…</li><li>…</li></ul>
//! </div>
//! ```

use crate::errors::StructuralMiss;
use scraper::{ElementRef, Selector};

/// Selectors describing the page layout around each date heading.
#[derive(Debug, Clone)]
pub struct Markup {
    pub heading: Selector,
    pub container: Selector,
    pub excerpt: Selector,
    pub list: Selector,
    pub citation: Selector,
}

impl Markup {
    /// The enclosing heading-group block of `heading`.
    pub fn container_of<'a>(&self, heading: ElementRef<'a>) -> Option<ElementRef<'a>> {
        heading
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| self.container.matches(el))
    }

    /// The excerpt block following `container`.
    ///
    /// Only siblings before the next heading group are considered, so a day
    /// without an excerpt never picks up the next day's list.
    pub fn excerpt_after<'a>(&self, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
        container
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| !self.container.matches(el))
            .find(|el| self.excerpt.matches(el))
    }

    /// The `li` children of the first list inside the day's excerpt block.
    pub fn list_items<'a>(
        &self,
        heading: ElementRef<'a>,
    ) -> Result<Vec<ElementRef<'a>>, StructuralMiss> {
        let container = self
            .container_of(heading)
            .ok_or(StructuralMiss::MissingContainer)?;
        let excerpt = self
            .excerpt_after(container)
            .ok_or(StructuralMiss::MissingExcerpt)?;
        let list = excerpt
            .select(&self.list)
            .next()
            .ok_or(StructuralMiss::MissingList)?;

        Ok(list
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "li")
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractSettings;
    use crate::extract::ExtractOptions;
    use scraper::Html;

    fn markup() -> Markup {
        ExtractOptions::from_settings(&ExtractSettings::default())
            .unwrap()
            .markup
    }

    fn heading<'a>(document: &'a Html, id: &str) -> ElementRef<'a> {
        let selector = Selector::parse("h2").unwrap();
        document
            .select(&selector)
            .find(|el| el.value().attr("id") == Some(id))
            .unwrap()
    }

    fn texts(items: &[ElementRef<'_>]) -> Vec<String> {
        items.iter().map(|li| li.text().collect::<String>()).collect()
    }

    #[test]
    fn test_items_in_list_order() {
        let document = Html::parse_document(
            r#"<div class="mw-heading mw-heading2"><h2 id="3月5日">3月5日</h2></div>
               <div class="excerpt-block"><ul><li>one</li><li>two</li><li>three</li></ul></div>"#,
        );
        let items = markup().list_items(heading(&document, "3月5日")).unwrap();
        assert_eq!(texts(&items), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_ordered_list_and_nested_items() {
        let document = Html::parse_document(
            r#"<div class="mw-heading mw-heading2"><h2 id="3月5日">3月5日</h2></div>
               <p>intro</p>
               <div class="excerpt-block"><div><ol>
                 <li>outer<ul><li>inner</li></ul></li>
                 <li>second</li>
               </ol></div></div>"#,
        );
        let items = markup().list_items(heading(&document, "3月5日")).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(texts(&items)[1], "second");
    }

    #[test]
    fn test_missing_container() {
        let document = Html::parse_document(
            r#"<h2 id="3月5日">3月5日</h2><div class="excerpt-block"><ul><li>x</li></ul></div>"#,
        );
        let err = markup().list_items(heading(&document, "3月5日")).unwrap_err();
        assert_eq!(err, StructuralMiss::MissingContainer);
    }

    #[test]
    fn test_missing_excerpt_does_not_borrow_next_day() {
        let document = Html::parse_document(
            r#"<div class="mw-heading mw-heading2"><h2 id="3月6日">3月6日</h2></div>
               <div class="mw-heading mw-heading2"><h2 id="3月5日">3月5日</h2></div>
               <div class="excerpt-block"><ul><li>belongs to 5th</li></ul></div>"#,
        );
        let err = markup().list_items(heading(&document, "3月6日")).unwrap_err();
        assert_eq!(err, StructuralMiss::MissingExcerpt);

        let items = markup().list_items(heading(&document, "3月5日")).unwrap();
        assert_eq!(texts(&items), vec!["belongs to 5th"]);
    }

    #[test]
    fn test_missing_list() {
        let document = Html::parse_document(
            r#"<div class="mw-heading mw-heading2"><h2 id="3月5日">3月5日</h2></div>
               <div class="excerpt-block"><p>No news today.</p></div>"#,
        );
        let err = markup().list_items(heading(&document, "3月5日")).unwrap_err();
        assert_eq!(err, StructuralMiss::MissingList);
    }
}
