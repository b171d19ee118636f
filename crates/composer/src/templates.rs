//! Message templates and the creation dialog.
//!
//! The catalog lives in memory for the lifetime of the surface. Titles are
//! unique; comparison trims surrounding whitespace and ignores ASCII case.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub title: String,
    pub body: String,
}

impl Template {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template title is empty")]
    EmptyTitle,
    #[error("template body is empty")]
    EmptyBody,
    #[error("a template named `{0}` already exists")]
    DuplicateTitle(String),
    #[error("no template at index {0}")]
    UnknownTemplate(usize),
}

#[derive(Clone, Debug)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn empty() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Ordered list, insertion order.
    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Template, TemplateError> {
        self.templates
            .get(index)
            .ok_or(TemplateError::UnknownTemplate(index))
    }

    /// Validate and append. Returns the new template's index.
    pub fn add(&mut self, title: &str, body: &str) -> Result<usize, TemplateError> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(TemplateError::EmptyTitle);
        }
        if body.is_empty() {
            return Err(TemplateError::EmptyBody);
        }
        if self
            .templates
            .iter()
            .any(|t| t.title.trim().eq_ignore_ascii_case(title))
        {
            return Err(TemplateError::DuplicateTitle(title.to_string()));
        }
        self.templates.push(Template::new(title, body));
        log::debug!(target: "composer", "template `{title}` added");
        Ok(self.templates.len() - 1)
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self {
            templates: vec![
                Template::new(
                    "Professional Introduction",
                    "Hi, I noticed your profile and would love to connect to discuss potential opportunities in our field.",
                ),
                Template::new(
                    "Follow-up",
                    "Thank you for connecting! I'd be interested in scheduling a brief call to discuss how we might collaborate.",
                ),
                Template::new(
                    "Project Inquiry",
                    "I'm reaching out regarding potential project opportunities. Would you be open to a conversation about how we might work together?",
                ),
            ],
        }
    }
}

/// State of the "new template" dialog. Field values survive a failed save so
/// the user can correct them.
#[derive(Clone, Debug, Default)]
pub struct TemplateDialog {
    open: bool,
    title: String,
    body: String,
    error: Option<TemplateError>,
}

impl TemplateDialog {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
        self.error = None;
    }

    /// Close and discard the fields.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn error(&self) -> Option<&TemplateError> {
        self.error.as_ref()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn set_body(&mut self, body: &str) {
        self.body = body.to_string();
    }

    /// Add the dialog's template to `catalog`. On success the dialog closes
    /// and resets; on failure it stays open with the error recorded.
    pub fn save(&mut self, catalog: &mut TemplateCatalog) -> Result<Template, TemplateError> {
        match catalog.add(&self.title, &self.body) {
            Ok(index) => {
                let template = catalog.get(index)?.clone();
                self.cancel();
                Ok(template)
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_three_templates_in_order() {
        let catalog = TemplateCatalog::default();
        let titles: Vec<_> = catalog.list().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Professional Introduction", "Follow-up", "Project Inquiry"]
        );
        assert!(catalog.get(0).unwrap().body.starts_with("Hi, I noticed"));
    }

    #[test]
    fn add_trims_and_validates() {
        let mut catalog = TemplateCatalog::empty();
        assert_eq!(catalog.add("  ", "body"), Err(TemplateError::EmptyTitle));
        assert_eq!(catalog.add("Title", " \n"), Err(TemplateError::EmptyBody));
        assert_eq!(catalog.add(" Thanks ", " Thank you! "), Ok(0));
        assert_eq!(catalog.get(0).unwrap(), &Template::new("Thanks", "Thank you!"));
        assert_eq!(
            catalog.add("thanks", "again"),
            Err(TemplateError::DuplicateTitle("thanks".to_string()))
        );
        assert_eq!(catalog.get(4), Err(TemplateError::UnknownTemplate(4)));
    }

    #[test]
    fn dialog_keeps_fields_on_failure_and_resets_on_success() {
        let mut catalog = TemplateCatalog::default();
        let mut dialog = TemplateDialog::default();
        dialog.open();
        dialog.set_title("Follow-up");
        dialog.set_body("Another follow-up");

        let err = dialog.save(&mut catalog).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateTitle(_)));
        assert!(dialog.is_open());
        assert_eq!(dialog.title(), "Follow-up");
        assert_eq!(dialog.error(), Some(&err));

        dialog.set_title("Second follow-up");
        let saved = dialog.save(&mut catalog).unwrap();
        assert_eq!(saved.title, "Second follow-up");
        assert!(!dialog.is_open());
        assert_eq!(dialog.title(), "");
        assert_eq!(catalog.len(), 4);
    }
}
