//! Structured content extraction from rendered markup
//!
//! This module turns a rendered page into:
//! - Title, headings (with level), paragraphs, list items, code blocks
//! - Table rows and cells
//! - Every anchor's text and absolute href
//!
//! Legacy frameset pages carry no body content; for those only the frame
//! sources are reported.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// A heading and its level (`"H1"` .. `"H6"`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: String,
    pub text: String,
}

/// An anchor's visible text and absolute target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub text: String,
    pub href: String,
}

/// Structured content of one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageContent {
    pub title: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<Vec<String>>,
    pub code: Vec<String>,
    pub tables: Vec<Vec<Vec<String>>>,
    pub links: Vec<PageLink>,
}

/// A `<frame>` of a frameset page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    pub name: Option<String>,
    pub src: Option<String>,
}

/// What a rendered page turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A regular document with extractable body content
    Document(PageContent),

    /// A legacy frameset: content lives in the referenced frames
    Frameset { frames: Vec<FrameSource> },
}

/// Precompiled selectors for content extraction
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    title: Selector,
    title_tag: Selector,
    headings: Selector,
    paragraphs: Selector,
    lists: Selector,
    list_items: Selector,
    code: Selector,
    tables: Selector,
    rows: Selector,
    cells: Selector,
    anchors: Selector,
    frameset: Selector,
    frames: Selector,
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Trimmed text content of an element and its descendants
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl ContentExtractor {
    /// Compiles the configured selectors
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile(&config.title)?,
            title_tag: compile("title")?,
            headings: compile(&config.headings)?,
            paragraphs: compile(&config.paragraphs)?,
            lists: compile(&config.lists)?,
            list_items: compile("li")?,
            code: compile(&config.code)?,
            tables: compile(&config.tables)?,
            rows: compile("tr")?,
            cells: compile("th, td")?,
            anchors: compile("a[href]")?,
            frameset: compile("frameset")?,
            frames: compile("frame")?,
        })
    }

    /// Extracts content from rendered markup
    ///
    /// # Arguments
    ///
    /// * `html` - The rendered markup
    /// * `page_url` - URL the markup was loaded from, used to resolve hrefs
    ///
    /// # Example
    ///
    /// ```
    /// use page_harvest::config::SelectorConfig;
    /// use page_harvest::crawler::{ContentExtractor, Extraction};
    /// use url::Url;
    ///
    /// let extractor = ContentExtractor::new(&SelectorConfig::default()).unwrap();
    /// let page = Url::parse("https://example.com/docs/").unwrap();
    /// let html = r#"<html><body><h1>Guide</h1><a href="intro">Intro</a></body></html>"#;
    ///
    /// match extractor.extract(html, &page) {
    ///     Extraction::Document(content) => {
    ///         assert_eq!(content.title, "Guide");
    ///         assert_eq!(content.links[0].href, "https://example.com/docs/intro");
    ///     }
    ///     Extraction::Frameset { .. } => unreachable!(),
    /// }
    /// ```
    pub fn extract(&self, html: &str, page_url: &Url) -> Extraction {
        let document = Html::parse_document(html);

        if document.select(&self.frameset).next().is_some() {
            let frames = document
                .select(&self.frames)
                .map(|frame| FrameSource {
                    name: frame.value().attr("name").map(str::to_string),
                    src: frame.value().attr("src").map(str::to_string),
                })
                .collect();
            return Extraction::Frameset { frames };
        }

        Extraction::Document(PageContent {
            title: self.extract_title(&document),
            headings: self.extract_headings(&document),
            paragraphs: self.extract_texts(&document, &self.paragraphs),
            lists: self.extract_lists(&document),
            code: self.extract_texts(&document, &self.code),
            tables: self.extract_tables(&document),
            links: self.extract_links(&document, page_url),
        })
    }

    /// Title from the configured selector, falling back to `<title>`
    fn extract_title(&self, document: &Html) -> String {
        document
            .select(&self.title)
            .next()
            .map(text_of)
            .filter(|title| !title.is_empty())
            .or_else(|| document.select(&self.title_tag).next().map(text_of))
            .unwrap_or_default()
    }

    fn extract_headings(&self, document: &Html) -> Vec<Heading> {
        document
            .select(&self.headings)
            .map(|heading| Heading {
                level: heading.value().name().to_ascii_uppercase(),
                text: text_of(heading),
            })
            .collect()
    }

    /// Non-empty trimmed texts of every match
    fn extract_texts(&self, document: &Html, selector: &Selector) -> Vec<String> {
        document
            .select(selector)
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn extract_lists(&self, document: &Html) -> Vec<Vec<String>> {
        document
            .select(&self.lists)
            .map(|list| list.select(&self.list_items).map(text_of).collect())
            .collect()
    }

    fn extract_tables(&self, document: &Html) -> Vec<Vec<Vec<String>>> {
        document
            .select(&self.tables)
            .map(|table| {
                table
                    .select(&self.rows)
                    .map(|row| row.select(&self.cells).map(text_of).collect())
                    .collect()
            })
            .collect()
    }

    /// Every anchor with its href resolved against the page URL
    ///
    /// Hrefs that cannot be resolved are kept verbatim; the frontier drops
    /// them later.
    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<PageLink> {
        document
            .select(&self.anchors)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                let href = page_url
                    .join(href)
                    .map(|absolute| absolute.to_string())
                    .unwrap_or_else(|_| href.to_string());
                Some(PageLink {
                    text: text_of(anchor),
                    href,
                })
            })
            .collect()
    }
}
