//! User-visible run log messages.
//!
//! The engine never writes log text itself. It emits a [`Message`] (one
//! variant per message kind, carrying exactly that message's arguments) and
//! a [`MessageCatalog`] renders it for the active locale.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EnrolError, Result};

/// Locale every catalog falls back to.
pub const DEFAULT_LOCALE: &str = "en";

/// One log message with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    UserUnknown { identifier: String },
    AlreadyEnrolled { full_name: String },
    EnrolledOk { full_name: String },
    GroupCreateFailed { group: String, course: String },
    GroupUnknown { group: String },
    GroupingCreateFailed { group: String, course: String },
    LinkFailed { group: String },
    AddedToGroup { group: String },
    AddToGroupFailed { group: String },
    AlreadyInGroup { group: String },
    StatsEnrolled { count: usize },
    StatsGroups { count: usize, names: String },
    StatsGroupings { count: usize, names: String },
}

impl Message {
    /// Catalog key of this message kind.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Message::UserUnknown { .. } => "im:user_unknown",
            Message::AlreadyEnrolled { .. } => "im:already_in",
            Message::EnrolledOk { .. } => "im:enrolled_ok",
            Message::GroupCreateFailed { .. } => "im:error_addg",
            Message::GroupUnknown { .. } => "im:error_g_unknown",
            Message::GroupingCreateFailed { .. } => "im:error_add_grp",
            Message::LinkFailed { .. } => "im:error_add_g_grp",
            Message::AddedToGroup { .. } => "im:and_added_g",
            Message::AddToGroupFailed { .. } => "im:error_adding_u_g",
            Message::AlreadyInGroup { .. } => "im:already_in_g",
            Message::StatsEnrolled { .. } => "im:stats_i",
            Message::StatsGroups { .. } => "im:stats_g",
            Message::StatsGroupings { .. } => "im:stats_grp",
        }
    }

    /// Placeholder values, by placeholder name.
    #[must_use]
    pub fn args(&self) -> Vec<(&'static str, String)> {
        match self {
            Message::UserUnknown { identifier } => vec![("identifier", identifier.clone())],
            Message::AlreadyEnrolled { full_name } | Message::EnrolledOk { full_name } => {
                vec![("fullname", full_name.clone())]
            }
            Message::GroupCreateFailed { group, course }
            | Message::GroupingCreateFailed { group, course } => {
                vec![("group", group.clone()), ("courseid", course.clone())]
            }
            Message::GroupUnknown { group }
            | Message::LinkFailed { group }
            | Message::AddedToGroup { group }
            | Message::AddToGroupFailed { group }
            | Message::AlreadyInGroup { group } => vec![("group", group.clone())],
            Message::StatsEnrolled { count } => vec![("count", count.to_string())],
            Message::StatsGroups { count, names } | Message::StatsGroupings { count, names } => {
                vec![("nb", count.to_string()), ("what", names.clone())]
            }
        }
    }
}

/// Renders messages for a locale.
pub trait MessageCatalog: Send + Sync {
    fn format(&self, message: &Message, locale: &str) -> String;
}

const ENGLISH: &[(&str, &str)] = &[
    ("im:user_unknown", "Unknown user {identifier}: row skipped"),
    ("im:already_in", "{fullname} already enrolled; "),
    ("im:enrolled_ok", "{fullname} enrolled ok; "),
    (
        "im:error_addg",
        "Error: could not create group {group} in course {courseid}",
    ),
    ("im:error_g_unknown", "Error: unknown group {group}"),
    (
        "im:error_add_grp",
        "Error: could not create grouping {group} in course {courseid}",
    ),
    (
        "im:error_add_g_grp",
        "Error: could not add group {group} to grouping {group}",
    ),
    ("im:and_added_g", "added to group {group}"),
    ("im:error_adding_u_g", "Error: could not be added to group {group}"),
    ("im:already_in_g", "already in group {group}"),
    ("im:stats_i", "{count} user(s) enrolled"),
    ("im:stats_g", "{nb} group(s) created:{what}"),
    ("im:stats_grp", "{nb} grouping(s) created:{what}"),
];

/// Substitute `{name}` placeholders in one pass. Unknown placeholders are
/// left as is and substituted values are never scanned again.
#[must_use]
pub fn render_template(template: &str, args: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };
        let name = &tail[1..close];
        match args.iter().find(|(arg, _)| *arg == name) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Template tables keyed by locale, then by message key.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    locales: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct CatalogFile(HashMap<String, HashMap<String, String>>);

impl TemplateCatalog {
    /// Catalog holding only the built-in English templates.
    #[must_use]
    pub fn english() -> Self {
        let table = ENGLISH
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            locales: HashMap::from([(DEFAULT_LOCALE.to_string(), table)]),
        }
    }

    /// Add or override templates for a locale.
    #[must_use]
    pub fn with_templates<I, K, V>(mut self, locale: &str, templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = self
            .locales
            .entry(normalize_locale(locale))
            .or_default();
        for (key, template) in templates {
            table.insert(key.into(), template.into());
        }
        self
    }

    /// Merge a TOML document of `[locale]` tables onto the built-in English.
    ///
    /// ```toml
    /// [fr]
    /// "im:and_added_g" = "ajouté au groupe {group}"
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let CatalogFile(tables) = toml::from_str(source)?;
        Ok(tables
            .into_iter()
            .fold(Self::english(), |catalog, (locale, templates)| {
                catalog.with_templates(&locale, templates)
            }))
    }

    /// Load a TOML catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EnrolError::Catalog(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Locales with at least one template.
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<_> = self.locales.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    fn lookup(&self, key: &str, locale: &str) -> Option<&str> {
        let locale = normalize_locale(locale);
        let parent = locale.split('_').next().unwrap_or(DEFAULT_LOCALE);
        let found = [locale.as_str(), parent, DEFAULT_LOCALE]
            .into_iter()
            .find_map(|l| self.locales.get(l).and_then(|t| t.get(key)))
            .map(String::as_str);
        found
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageCatalog for TemplateCatalog {
    fn format(&self, message: &Message, locale: &str) -> String {
        match self.lookup(message.key(), locale) {
            Some(template) => render_template(template, &message.args()),
            None => {
                tracing::warn!(key = message.key(), locale, "Missing message template");
                message.key().to_string()
            }
        }
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('-', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_message_kind_has_an_english_template() {
        let catalog = TemplateCatalog::english();
        let samples = [
            Message::UserUnknown {
                identifier: "ghost".into(),
            },
            Message::AlreadyEnrolled {
                full_name: "A B".into(),
            },
            Message::EnrolledOk {
                full_name: "A B".into(),
            },
            Message::GroupCreateFailed {
                group: "G".into(),
                course: "C".into(),
            },
            Message::GroupUnknown { group: "G".into() },
            Message::GroupingCreateFailed {
                group: "G".into(),
                course: "C".into(),
            },
            Message::LinkFailed { group: "G".into() },
            Message::AddedToGroup { group: "G".into() },
            Message::AddToGroupFailed { group: "G".into() },
            Message::AlreadyInGroup { group: "G".into() },
            Message::StatsEnrolled { count: 1 },
            Message::StatsGroups {
                count: 1,
                names: " G".into(),
            },
            Message::StatsGroupings {
                count: 1,
                names: " G".into(),
            },
        ];
        for message in &samples {
            let text = catalog.format(message, "en");
            assert_ne!(text, message.key(), "no template for {}", message.key());
            assert!(!text.contains('{'), "unfilled placeholder in {text:?}");
        }
    }

    #[test]
    fn test_format_fills_arguments() {
        let catalog = TemplateCatalog::english();
        let text = catalog.format(
            &Message::GroupCreateFailed {
                group: "TeamX".into(),
                course: "42".into(),
            },
            "en",
        );
        assert_eq!(text, "Error: could not create group TeamX in course 42");
    }

    #[test]
    fn test_locale_falls_back_to_parent_then_english() {
        let catalog = TemplateCatalog::english()
            .with_templates("fr", [("im:and_added_g", "ajouté au groupe {group}")]);
        let added = Message::AddedToGroup {
            group: "TeamX".into(),
        };
        let already = Message::AlreadyInGroup {
            group: "TeamX".into(),
        };

        assert_eq!(catalog.format(&added, "fr-CA"), "ajouté au groupe TeamX");
        assert_eq!(catalog.format(&already, "fr"), "already in group TeamX");
        assert_eq!(catalog.format(&added, "de"), "added to group TeamX");
    }

    #[test]
    fn test_from_toml_str_merges_locales() {
        let catalog = TemplateCatalog::from_toml_str(
            r#"
            [fr]
            "im:stats_i" = "{count} inscription(s)"

            [en]
            "im:stats_i" = "Enrolled: {count}"
            "#,
        )
        .unwrap();

        assert_eq!(catalog.locales(), vec!["en", "fr"]);
        let stats = Message::StatsEnrolled { count: 3 };
        assert_eq!(catalog.format(&stats, "fr"), "3 inscription(s)");
        assert_eq!(catalog.format(&stats, "en"), "Enrolled: 3");
        assert_eq!(
            catalog.format(&Message::AlreadyInGroup { group: "G".into() }, "fr"),
            "already in group G"
        );
    }

    #[test]
    fn test_invalid_toml_is_a_catalog_error() {
        let err = TemplateCatalog::from_toml_str("[fr\n").unwrap_err();
        assert!(matches!(err, EnrolError::Catalog(_)));
    }

    #[test]
    fn test_placeholder_text_in_arguments_is_kept_literally() {
        let catalog = TemplateCatalog::english();
        let text = catalog.format(
            &Message::GroupCreateFailed {
                group: "{courseid}".into(),
                course: "42".into(),
            },
            "en",
        );
        assert_eq!(text, "Error: could not create group {courseid} in course 42");

        let grouping = catalog.format(
            &Message::GroupingCreateFailed {
                group: "{group}".into(),
                course: "7".into(),
            },
            "en",
        );
        assert_eq!(grouping, "Error: could not create grouping {group} in course 7");
    }

    #[test]
    fn test_render_template_handles_unterminated_brace() {
        assert_eq!(
            render_template("{a} {b and {", &[("a", "x".to_string())]),
            "x {b and {"
        );
    }

    #[test]
    fn test_render_template_leaves_unknown_placeholders() {
        assert_eq!(
            render_template("{a} and {b}", &[("a", "x".to_string())]),
            "x and {b}"
        );
    }
}
