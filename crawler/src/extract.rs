use scraper::{Html, Selector};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Visible text, one space between text nodes.
    pub text: String,
    /// Raw `href` values of every anchor, in document order.
    pub hrefs: Vec<String>,
}

pub trait Extractor: Send + Sync + 'static {
    fn extract(&self, raw: &str) -> Extracted;
}

pub struct HtmlExtractor {
    anchors: Selector,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self { anchors: Selector::parse("a[href]").expect("static selector") }
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self { Self::new() }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, raw: &str) -> Extracted {
        let doc = Html::parse_document(raw);
        let text = doc
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let hrefs = doc
            .select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_owned)
            .collect();
        Extracted { text, hrefs }
    }
}
