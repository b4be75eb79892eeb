//! Heuristic tables for the directory site: selectors, label needles and
//! regexes the navigator and extractors key on.
//!
//! The built-in defaults describe the live site. A YAML file can override
//! any subset of them; missing keys keep their defaults. Everything is
//! compiled once at startup so a bad selector fails the boot, not a request.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use scraper::Selector;
use serde::Deserialize;

use crate::error::ScraperError;
use crate::surface::Locator;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitePatterns {
    pub base_url: String,
    /// Present on every valid results page.
    pub results_heading: String,
    pub consent: ConsentPatterns,
    pub search_form: SearchFormPatterns,
    pub synonyms: SynonymPatterns,
    pub listings: ListingPatterns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsentPatterns {
    pub tag: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchFormPatterns {
    pub what: String,
    #[serde(rename = "where")]
    pub where_: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynonymPatterns {
    pub filter_blocks: String,
    pub label_elements: String,
    pub headings: String,
    pub heading_pattern: String,
    pub section_ancestors: Vec<String>,
    pub text_marker: String,
    /// Characters taken after the marker line.
    pub text_window: usize,
    pub stop_pattern: String,
    /// Labels at or above this many characters are dropped.
    pub max_label_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingPatterns {
    pub cards: String,
    pub name: String,
    pub phone: String,
    pub phone_prefix: String,
    pub address: String,
    pub next_page: String,
}

impl Default for SitePatterns {
    fn default() -> Self {
        Self {
            base_url: "https://www.paginegialle.it".to_string(),
            results_heading: "h1".to_string(),
            consent: ConsentPatterns::default(),
            search_form: SearchFormPatterns::default(),
            synonyms: SynonymPatterns::default(),
            listings: ListingPatterns::default(),
        }
    }
}

impl Default for ConsentPatterns {
    fn default() -> Self {
        Self {
            tag: "button".to_string(),
            labels: vec![
                "Accetta".to_string(),
                "Accept".to_string(),
                "Consenti".to_string(),
            ],
        }
    }
}

impl Default for SearchFormPatterns {
    fn default() -> Self {
        Self {
            what: "input[placeholder*='nome'], input[aria-label*='attività']".to_string(),
            where_: "input[placeholder*='indirizzo'], input[aria-label*='dove']".to_string(),
        }
    }
}

impl Default for SynonymPatterns {
    fn default() -> Self {
        Self {
            filter_blocks: "[class*=filter], [class*=filtri], [id*=filter]".to_string(),
            label_elements: "a, button, span, li".to_string(),
            headings: "h2, h3, [role=heading], strong".to_string(),
            heading_pattern: "tipi di|categorie correlate|specialit|prodotti|settori|servizi"
                .to_string(),
            section_ancestors: vec![
                "section".to_string(),
                "div".to_string(),
                "aside".to_string(),
            ],
            text_marker: "Tipi di".to_string(),
            text_window: 500,
            stop_pattern: "aperto|chiuso|mappa|recensioni|filtri|prenota".to_string(),
            max_label_chars: 60,
        }
    }
}

impl Default for ListingPatterns {
    fn default() -> Self {
        Self {
            cards: "article, .scheda, .results-item, [data-result], .result-card".to_string(),
            name: "h2 a, h2, h3 a, h3".to_string(),
            phone: r#"a[href^="tel:"]"#.to_string(),
            phone_prefix: "tel:".to_string(),
            address: r#"[class*="addr"], [class*="address"], address"#.to_string(),
            next_page: concat!(
                r#"a[rel="next"], a[aria-label*="avanti"], "#,
                r#"a[aria-label*="pagina successiva"], .next, .pagination-next"#
            )
            .to_string(),
        }
    }
}

/// [`SitePatterns`] with every selector and regex compiled.
#[derive(Debug)]
pub struct CompiledPatterns {
    pub base_url: String,
    pub results_heading: String,
    pub consent: Locator,
    pub what_input: Locator,
    pub where_input: Locator,
    pub next_page: Locator,
    pub(crate) filter_blocks: Selector,
    pub(crate) label_elements: Selector,
    pub(crate) headings: Selector,
    pub(crate) heading_pattern: Regex,
    pub(crate) section_ancestors: Vec<String>,
    pub(crate) text_marker: Regex,
    pub(crate) text_window: usize,
    pub(crate) stop_pattern: Regex,
    pub(crate) max_label_chars: usize,
    pub(crate) cards: Selector,
    pub(crate) name: Selector,
    pub(crate) phone: Selector,
    pub(crate) phone_prefix: String,
    pub(crate) address: Selector,
}

impl SitePatterns {
    /// Parses a YAML override; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::PatternsFileParse`] on malformed YAML.
    pub fn from_yaml(content: &str) -> Result<Self, ScraperError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Compiles and validates every table.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] or
    /// [`ScraperError::InvalidPattern`] naming the first entry that does not compile.
    pub fn compile(&self) -> Result<CompiledPatterns, ScraperError> {
        let syn = &self.synonyms;
        let list = &self.listings;

        for selector in [
            &self.results_heading,
            &self.consent.tag,
            &self.search_form.what,
            &self.search_form.where_,
            &list.next_page,
        ] {
            compile_selector(selector)?;
        }
        if self.consent.labels.iter().all(|l| l.trim().is_empty()) {
            return Err(ScraperError::InvalidPattern {
                pattern: "consent.labels".to_string(),
                reason: "at least one non-blank label is required".to_string(),
            });
        }

        Ok(CompiledPatterns {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            results_heading: self.results_heading.clone(),
            consent: Locator::Text {
                tag: self.consent.tag.clone(),
                needles: self.consent.labels.clone(),
            },
            what_input: Locator::css(&self.search_form.what),
            where_input: Locator::css(&self.search_form.where_),
            next_page: Locator::css(&list.next_page),
            filter_blocks: compile_selector(&syn.filter_blocks)?,
            label_elements: compile_selector(&syn.label_elements)?,
            headings: compile_selector(&syn.headings)?,
            heading_pattern: compile_regex(&syn.heading_pattern)?,
            section_ancestors: syn
                .section_ancestors
                .iter()
                .map(|tag| tag.trim().to_ascii_lowercase())
                .collect(),
            text_marker: compile_regex(&format!(
                r"{}[^\n]*\n",
                regex::escape(&syn.text_marker)
            ))?,
            text_window: syn.text_window,
            stop_pattern: compile_regex(&syn.stop_pattern)?,
            max_label_chars: syn.max_label_chars,
            cards: compile_selector(&list.cards)?,
            name: compile_selector(&list.name)?,
            phone: compile_selector(&list.phone)?,
            phone_prefix: list.phone_prefix.clone(),
            address: compile_selector(&list.address)?,
        })
    }
}

impl CompiledPatterns {
    /// The built-in tables, compiled.
    ///
    /// # Errors
    ///
    /// Only if the built-in tables themselves stop compiling.
    pub fn builtin() -> Result<Self, ScraperError> {
        SitePatterns::default().compile()
    }

    /// Whether a candidate synonym label survives the shared filter:
    /// non-empty, shorter than the label cap, no stop phrase.
    #[must_use]
    pub fn accepts_label(&self, label: &str) -> bool {
        !label.is_empty()
            && label.chars().count() < self.max_label_chars
            && !self.stop_pattern.is_match(label)
    }
}

/// Loads the heuristic tables: the YAML file at `path` when given, else the
/// built-in defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any
/// selector or regex fails to compile.
pub fn load_patterns(path: Option<&Path>) -> Result<CompiledPatterns, ScraperError> {
    let Some(path) = path else {
        return CompiledPatterns::builtin();
    };

    let content = std::fs::read_to_string(path).map_err(|e| ScraperError::PatternsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    SitePatterns::from_yaml(&content)?.compile()
}

fn compile_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn compile_regex(pattern: &str) -> Result<Regex, ScraperError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ScraperError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_compile() {
        let patterns = CompiledPatterns::builtin().expect("defaults compile");
        assert_eq!(patterns.base_url, "https://www.paginegialle.it");
        assert_eq!(patterns.results_heading, "h1");
        assert_eq!(patterns.section_ancestors, vec!["section", "div", "aside"]);
    }

    #[test]
    fn accepts_label_applies_length_cap_and_stop_phrases() {
        let patterns = CompiledPatterns::builtin().unwrap();
        assert!(patterns.accepts_label("Pizzerie"));
        assert!(!patterns.accepts_label(""));
        assert!(!patterns.accepts_label("Aperto ora"));
        assert!(!patterns.accepts_label("Vedi MAPPA"));
        assert!(!patterns.accepts_label(&"x".repeat(60)));
        assert!(patterns.accepts_label(&"x".repeat(59)));
    }

    #[test]
    fn yaml_override_keeps_unnamed_defaults() {
        let yaml = r#"
base_url: "https://mirror.test/"
listings:
  cards: ".card"
"#;
        let patterns = SitePatterns::from_yaml(yaml).unwrap().compile().unwrap();
        assert_eq!(patterns.base_url, "https://mirror.test");
        assert_eq!(patterns.phone_prefix, "tel:");
        assert_eq!(patterns.max_label_chars, 60);
    }

    #[test]
    fn search_form_where_key_is_plain_where() {
        let yaml = "search_form:\n  where: \"#dove\"\n";
        let site = SitePatterns::from_yaml(yaml).unwrap();
        assert_eq!(site.search_form.where_, "#dove");
        assert!(site.search_form.what.contains("nome"));
    }

    #[test]
    fn invalid_selector_is_rejected_with_its_text() {
        let mut site = SitePatterns::default();
        site.listings.cards = "article[".to_string();
        let err = site.compile().unwrap_err();
        match err {
            ScraperError::InvalidSelector { selector, .. } => assert_eq!(selector, "article["),
            other => panic!("expected InvalidSelector, got {other:?}"),
        }
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let mut site = SitePatterns::default();
        site.synonyms.stop_pattern = "aperto|(".to_string();
        assert!(matches!(
            site.compile(),
            Err(ScraperError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn blank_consent_labels_are_rejected() {
        let mut site = SitePatterns::default();
        site.consent.labels = vec!["  ".to_string()];
        assert!(matches!(
            site.compile(),
            Err(ScraperError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn missing_patterns_file_is_an_io_error() {
        let err = load_patterns(Some(Path::new("/nonexistent/patterns.yaml"))).unwrap_err();
        assert!(matches!(err, ScraperError::PatternsFileIo { .. }));
    }

    #[test]
    fn shipped_patterns_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("patterns.yaml");
        assert!(path.exists(), "patterns.yaml missing at {path:?}");
        let patterns = load_patterns(Some(&path)).expect("failed to load patterns.yaml");
        assert!(patterns.accepts_label("Trattorie"));
    }
}
