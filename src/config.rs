use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::errors::Result;

/// Run configuration, loaded from a JSON file. Paths are required; the rule
/// tables all default to the Zurich data set and can be overridden key by key.
#[derive(Deserialize)]
pub struct UserConfig {
    pub data_path: String,
    pub reference_path: String,
    pub dest_path: String,
    #[serde(default = "default_validate")]
    pub validate: bool,
    #[serde(default)]
    pub rules: RuleSet,
}

impl UserConfig {
    pub fn load(path: &Path) -> Result<UserConfig> {
        let file = File::open(path)?;
        serde_json::from_reader(file)
            .map_err(|err| format!("could not parse config: {}", err).into())
    }
}

/// One ordered rewrite entry. Tables of these are first-match-wins; their
/// order is part of the cleaning contract.
#[derive(Deserialize, Debug, Clone)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    fn new(from: &str, to: &str) -> Substitution {
        Substitution {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Cleaning and enrichment rule data.
#[derive(Deserialize, Debug, Clone)]
pub struct RuleSet {
    #[serde(default = "default_canonical_city")]
    pub canonical_city: String,
    /// City value for streets that are not in the reference table but belong
    /// to a same-named locality outside the core city.
    #[serde(default = "default_municipality_label")]
    pub municipality_label: String,
    /// Case-insensitive spelling variants that all mean the canonical city.
    #[serde(default = "default_city_variants")]
    pub city_variants: Vec<String>,
    #[serde(default = "default_expected_postcodes")]
    pub expected_postcodes: Vec<String>,
    /// Exact-match corrections for known alternate spacing/hyphenation.
    #[serde(default = "default_city_spelling_fixes")]
    pub city_spelling_fixes: Vec<Substitution>,
    /// Literal abbreviation expansions, e.g. "a." -> "am".
    #[serde(default = "default_city_abbreviations")]
    pub city_abbreviations: Vec<Substitution>,
    /// Misspelled street-type suffixes and their corrections.
    #[serde(default = "default_street_suffix_fixes")]
    pub street_suffix_fixes: Vec<Substitution>,
    /// A suffix fix is suppressed when the text right before the suffix ends
    /// with one of these, so "terrasse" and "strasse" are never mangled.
    #[serde(default = "default_street_suffix_guards")]
    pub street_suffix_guards: Vec<String>,
    /// Dialect endings rewritten before the reference lookup only; the
    /// emitted street tag keeps its source spelling.
    #[serde(default = "default_street_dialect_suffixes")]
    pub street_dialect_suffixes: Vec<Substitution>,
    #[serde(default = "default_invalid_postcodes")]
    pub invalid_postcodes: Vec<String>,
    /// Known-bad house numbers and their numeric-only corrections.
    #[serde(default = "default_housenumber_fixes")]
    pub housenumber_fixes: Vec<Substitution>,
    /// Characters that disqualify a tag key (the tag is dropped) or a member
    /// role (the role is replaced with the sentinel).
    #[serde(default = "default_disallowed_chars")]
    pub disallowed_chars: String,
    #[serde(default = "default_tag_type")]
    pub default_tag_type: String,
}

impl Default for RuleSet {
    fn default() -> RuleSet {
        RuleSet {
            canonical_city: default_canonical_city(),
            municipality_label: default_municipality_label(),
            city_variants: default_city_variants(),
            expected_postcodes: default_expected_postcodes(),
            city_spelling_fixes: default_city_spelling_fixes(),
            city_abbreviations: default_city_abbreviations(),
            street_suffix_fixes: default_street_suffix_fixes(),
            street_suffix_guards: default_street_suffix_guards(),
            street_dialect_suffixes: default_street_dialect_suffixes(),
            invalid_postcodes: default_invalid_postcodes(),
            housenumber_fixes: default_housenumber_fixes(),
            disallowed_chars: default_disallowed_chars(),
            default_tag_type: default_tag_type(),
        }
    }
}

fn default_validate() -> bool {
    true
}

fn default_canonical_city() -> String {
    "Zürich".to_string()
}

fn default_municipality_label() -> String {
    "Zürich municipality".to_string()
}

fn default_city_variants() -> Vec<String> {
    vec![
        "zürich".to_string(),
        "zurich".to_string(),
        "zuerich".to_string(),
    ]
}

fn default_expected_postcodes() -> Vec<String> {
    [
        "8001", "8002", "8003", "8004", "8005", "8006", "8008", "8032",
        "8037", "8038", "8041", "8044", "8045", "8046", "8047", "8048",
        "8049", "8050", "8051", "8052", "8053", "8055", "8057", "8064",
    ]
    .iter()
    .map(|code| code.to_string())
    .collect()
}

fn default_city_spelling_fixes() -> Vec<Substitution> {
    vec![
        Substitution::new("Aathal - Seegräben", "Aathal-Seegräben"),
        Substitution::new("Uitikon Waldegg", "Uitikon-Waldegg"),
    ]
}

fn default_city_abbreviations() -> Vec<Substitution> {
    vec![
        Substitution::new("a.", "am"),
        Substitution::new("A.", " Albis"),
        Substitution::new("b.", "bei"),
    ]
}

fn default_street_suffix_fixes() -> Vec<Substitution> {
    vec![
        Substitution::new("stasse", "strasse"),
        Substitution::new("strassse", "strasse"),
        Substitution::new("str", "strasse"),
        Substitution::new("str.", "strasse"),
        Substitution::new("strsse", "strasse"),
        Substitution::new("srasse", "strasse"),
        Substitution::new("rasse", "strasse"),
    ]
}

fn default_street_suffix_guards() -> Vec<String> {
    vec!["ter".to_string(), "s".to_string(), "st".to_string()]
}

fn default_street_dialect_suffixes() -> Vec<Substitution> {
    vec![Substitution::new("gass", "gasse")]
}

fn default_invalid_postcodes() -> Vec<String> {
    vec!["q".to_string()]
}

fn default_housenumber_fixes() -> Vec<Substitution> {
    vec![
        Substitution::new("Im Chies 14", "14"),
        Substitution::new("144 Im Hof", "144"),
    ]
}

fn default_disallowed_chars() -> String {
    "=+/&<>;'\"?%#$@,. \t\r\n".to_string()
}

fn default_tag_type() -> String {
    "regular".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_defaults_cover_the_zurich_data() {
        let rules = RuleSet::default();
        assert_eq!(rules.canonical_city, "Zürich");
        assert_eq!(rules.expected_postcodes.len(), 24);
        assert_eq!(rules.street_suffix_fixes[0].from, "stasse");
        assert_eq!(rules.street_suffix_fixes.last().unwrap().from, "rasse");
        assert!(rules.disallowed_chars.contains('='));
        assert!(rules.disallowed_chars.contains('\n'));
    }

    #[test]
    fn config_rules_are_individually_overridable() {
        let raw = r#"{
            "data_path": "map.osm",
            "reference_path": "streets.csv",
            "dest_path": "out",
            "rules": {"canonical_city": "Bern", "invalid_postcodes": ["0000"]}
        }"#;
        let config: UserConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate);
        assert_eq!(config.rules.canonical_city, "Bern");
        assert_eq!(config.rules.invalid_postcodes, vec!["0000".to_string()]);
        // untouched keys keep their defaults
        assert_eq!(config.rules.municipality_label, "Zürich municipality");
        assert_eq!(config.rules.default_tag_type, "regular");
    }
}
