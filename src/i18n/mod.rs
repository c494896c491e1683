//! Internationalization (i18n) module.
//!
//! Holds the locale-specific default greeting used when the welcome
//! config does not set `welcome_message`.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

/// Locale used when the requested one has no translation.
pub const FALLBACK_LOCALE: &str = "zh";

/// Global translation store: LangCode -> Key -> Text
static TRANSLATIONS: OnceLock<HashMap<String, Value>> = OnceLock::new();

/// Load the embedded catalogs. Calling it more than once is harmless.
pub fn init() {
    TRANSLATIONS.get_or_init(load_catalogs);
}

fn load_catalogs() -> HashMap<String, Value> {
    let mut map = HashMap::new();

    for (lang, raw) in [("zh", include_str!("zh.json")), ("en", include_str!("en.json"))] {
        match serde_json::from_str(raw) {
            Ok(val) => {
                map.insert(lang.to_string(), val);
            }
            Err(e) => tracing::error!("Embedded catalog {} is invalid: {}", lang, e),
        }
    }

    map
}

/// Get text for a key in a specific language.
/// Supports nested keys via dot notation, e.g., "welcome.default_message".
pub fn get_text(lang: &str, key: &str) -> String {
    let store = TRANSLATIONS.get_or_init(load_catalogs);

    // Try requested language, then the fallback
    for candidate in [lang, FALLBACK_LOCALE] {
        if let Some(text) = store.get(candidate).and_then(|val| resolve_key(val, key)) {
            return text;
        }
    }

    // Key not found
    key.to_string()
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(|s| s.to_string())
}

/// Normalize a locale tag such as `en_US.UTF-8` or `zh-CN` to a catalog key.
pub fn resolve_locale(raw: Option<&str>) -> String {
    raw.map(|s| {
        s.split(['_', '-', '.'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    })
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}
