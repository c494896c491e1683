//! Welcome settings.
//!
//! Loaded once from a JSON file at startup and never mutated. Each key
//! is validated on its own: a bad value is logged and replaced by its
//! default instead of failing the whole load.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::i18n::get_text;
use crate::utils::{id_from_value, parse_group_templates, unescape_newlines};

/// Default bounded wait for the member nickname lookup.
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 3_000;

/// Immutable welcome configuration.
#[derive(Debug, Clone)]
pub struct WelcomeConfig {
    /// Groups where new members are welcomed.
    pub target_groups: HashSet<i64>,

    /// Template used when a group has no override (escapes expanded).
    pub default_template: String,

    /// Per-group template overrides (escapes expanded).
    pub group_templates: HashMap<i64, String>,

    /// Splits one template into several outbound messages. Empty = no split.
    pub segment_separator: String,

    /// Skip join events for the bot's own account.
    pub ignore_self_join: bool,

    /// Upper bound on the nickname lookup.
    pub lookup_timeout: Duration,
}

impl WelcomeConfig {
    /// Defaults for a locale: no target groups, locale greeting.
    pub fn with_locale(locale: &str) -> Self {
        Self {
            target_groups: HashSet::new(),
            default_template: locale_default_template(locale),
            group_templates: HashMap::new(),
            segment_separator: String::new(),
            ignore_self_join: true,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }

    /// Load the settings file.
    ///
    /// A missing file yields the defaults (welcoming disabled everywhere).
    /// An unreadable file or invalid JSON is an error.
    pub fn load(path: &Path, locale: &str) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Welcome config {} not found, welcoming is disabled", path.display());
                return Ok(Self::with_locale(locale));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let value: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self::from_value(&value, locale))
    }

    /// Build settings from an already-parsed JSON document.
    pub fn from_value(value: &Value, locale: &str) -> Self {
        let mut config = Self::with_locale(locale);

        let Some(obj) = value.as_object() else {
            warn!("Welcome config root should be an object, got {}, using defaults", kind_of(value));
            return config;
        };

        config.target_groups = parse_target_groups(obj.get("target_groups"));

        match obj.get("welcome_message") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => config.default_template = unescape_newlines(s),
            Some(other) => warn!(
                "welcome_message should be a string, got {}, using the default greeting",
                kind_of(other)
            ),
        }

        config.group_templates = parse_overrides(obj.get("welcome_messages"));

        match obj.get("segment_separator") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => config.segment_separator = s.clone(),
            Some(other) => warn!(
                "segment_separator should be a string, got {}, segmentation disabled",
                kind_of(other)
            ),
        }

        match obj.get("ignore_self_join") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => config.ignore_self_join = *b,
            Some(other) => warn!(
                "ignore_self_join should be a boolean, got {}, keeping true",
                kind_of(other)
            ),
        }

        match obj.get("lookup_timeout_ms") {
            None | Some(Value::Null) => {}
            Some(v) => match v.as_u64() {
                Some(ms) => config.lookup_timeout = Duration::from_millis(ms),
                None => warn!(
                    "lookup_timeout_ms should be a non-negative integer, got {}, keeping {}ms",
                    v, DEFAULT_LOOKUP_TIMEOUT_MS
                ),
            },
        }

        if !config.segment_separator.is_empty() {
            info!("Segment separator set: {:?}", config.segment_separator);
        }

        config
    }
}

fn locale_default_template(locale: &str) -> String {
    unescape_newlines(&get_text(locale, "welcome.default_message"))
}

fn parse_target_groups(value: Option<&Value>) -> HashSet<i64> {
    let items = match value {
        None | Some(Value::Null) => return HashSet::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!("target_groups should be a list, got {}, ignored", kind_of(other));
            return HashSet::new();
        }
    };

    items
        .iter()
        .filter_map(|item| {
            let parsed = id_from_value(item);
            if parsed.is_none() {
                warn!("Group id {} in target_groups is not an integer, ignored", item);
            }
            parsed
        })
        .collect()
}

fn parse_overrides(value: Option<&Value>) -> HashMap<i64, String> {
    match value {
        None | Some(Value::Null) => HashMap::new(),
        Some(Value::String(s)) => parse_group_templates(s),
        Some(Value::Object(map)) => parse_override_map(map),
        Some(other) => {
            warn!(
                "welcome_messages should be a string or an object, got {}, ignored",
                kind_of(other)
            );
            HashMap::new()
        }
    }
}

fn parse_override_map(map: &Map<String, Value>) -> HashMap<i64, String> {
    let mut templates = HashMap::with_capacity(map.len());

    for (key, value) in map {
        let Ok(group_id) = key.trim().parse::<i64>() else {
            warn!("welcome_messages key {:?} is not a group id, ignored", key);
            continue;
        };
        let Some(text) = value.as_str() else {
            warn!("welcome_messages entry for {} is not a string, ignored", group_id);
            continue;
        };
        templates.insert(group_id, unescape_newlines(text));
    }

    templates
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_config() {
        let value = json!({
            "target_groups": [100, "200", " 300 "],
            "welcome_message": "Hi {at}\\nRead the rules",
            "welcome_messages": "100: Hi\n there\n200: Bye",
            "segment_separator": "|",
            "ignore_self_join": false,
            "lookup_timeout_ms": 500
        });
        let config = WelcomeConfig::from_value(&value, "en");

        assert_eq!(config.target_groups, HashSet::from([100, 200, 300]));
        assert_eq!(config.default_template, "Hi {at}\nRead the rules");
        assert_eq!(config.group_templates[&100], "Hi\n there");
        assert_eq!(config.group_templates[&200], "Bye");
        assert_eq!(config.segment_separator, "|");
        assert!(!config.ignore_self_join);
        assert_eq!(config.lookup_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_group_entries_are_dropped() {
        let value = json!({ "target_groups": [100, "abc", null, 1.5, "42"] });
        let config = WelcomeConfig::from_value(&value, "zh");

        assert_eq!(config.target_groups, HashSet::from([100, 42]));
    }

    #[test]
    fn test_non_list_target_groups_disables_feature() {
        let value = json!({ "target_groups": "100,200" });
        let config = WelcomeConfig::from_value(&value, "zh");

        assert!(config.target_groups.is_empty());
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let value = json!({
            "welcome_message": 12,
            "segment_separator": ["|"],
            "ignore_self_join": "yes",
            "welcome_messages": 5
        });
        let config = WelcomeConfig::from_value(&value, "en");
        let defaults = WelcomeConfig::with_locale("en");

        assert_eq!(config.default_template, defaults.default_template);
        assert_eq!(config.segment_separator, "");
        assert!(config.ignore_self_join);
        assert!(config.group_templates.is_empty());
    }

    #[test]
    fn test_default_template_has_real_newline() {
        let config = WelcomeConfig::with_locale("zh");

        assert!(config.default_template.contains('\n'));
        assert!(!config.default_template.contains("\\n"));
        assert!(config.default_template.contains("{at}"));
    }

    #[test]
    fn test_override_object_form() {
        let value = json!({
            "welcome_messages": { "100": "A\\nB", "x": "ignored", "200": 3 }
        });
        let config = WelcomeConfig::from_value(&value, "zh");

        assert_eq!(config.group_templates.len(), 1);
        assert_eq!(config.group_templates[&100], "A\nB");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = Path::new("/nonexistent/welcome-config-for-tests.json");
        let config = WelcomeConfig::load(path, "zh").unwrap();

        assert!(config.target_groups.is_empty());
    }

    #[test]
    fn test_non_object_root() {
        let config = WelcomeConfig::from_value(&json!([1, 2]), "zh");
        assert!(config.target_groups.is_empty());
    }
}
