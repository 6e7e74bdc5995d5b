use std::sync::Arc;

use htmd::HtmlToMarkdown;
use skillradar_core::error::AppError;
use skillradar_core::traits::Cleaner;

/// HTML-to-Markdown cleaner using htmd.
///
/// Vacancy descriptions arrive as HTML; extractors get Markdown text with
/// scripts, styles and embedded media stripped.
pub struct HtmdCleaner {
    converter: Arc<HtmlToMarkdown>,
}

impl Clone for HtmdCleaner {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
        }
    }
}

impl HtmdCleaner {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "noscript", "iframe", "svg", "img"])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }
}

impl Default for HtmdCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner for HtmdCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        self.converter
            .convert(html)
            .map(|text| text.trim().to_string())
            .map_err(|e| AppError::Cleaner(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_vacancy_markup() {
        let cleaner = HtmdCleaner::new();
        let html = "<p><strong>Обязанности:</strong></p><ul><li>Rust</li><li>PostgreSQL</li></ul>";
        let text = cleaner.clean(html).unwrap();
        assert!(text.contains("Обязанности:"));
        assert!(text.contains("Rust"));
        assert!(text.contains("PostgreSQL"));
        assert!(!text.contains("<li>"));
    }

    #[test]
    fn strips_script_tags() {
        let cleaner = HtmdCleaner::new();
        let text = cleaner
            .clean("<p>Content</p><script>alert('xss')</script>")
            .unwrap();
        assert!(text.contains("Content"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn empty_input_gives_empty_text() {
        assert_eq!(HtmdCleaner::new().clean("").unwrap(), "");
    }
}
