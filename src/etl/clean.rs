use regex::Regex;

use crate::config::{RuleSet, Substitution};
use crate::errors::Result;

/// Per-field value cleaners. Each returns the corrected value, or `None` when
/// the tag carrying the value should be dropped.
///
/// All patterns come from the rule tables in the config; the regexes are
/// compiled once per run.
pub struct Cleaner {
    canonical_city: String,
    spelling_fixes: Vec<Substitution>,
    abbreviations: Vec<Substitution>,
    suffix_fixes: Vec<Substitution>,
    suffix_guards: Vec<String>,
    invalid_postcodes: Vec<String>,
    housenumber_fixes: Vec<Substitution>,
    state_re: Regex,
    state_letters_re: Regex,
    variant_re: Option<Regex>,
    digit_run_re: Regex,
}

impl Cleaner {
    pub fn new(rules: &RuleSet) -> Result<Cleaner> {
        let variant_re = if rules.city_variants.is_empty() {
            None
        } else {
            let pattern = rules
                .city_variants
                .iter()
                .map(|variant| regex::escape(variant))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i){}", pattern))?)
        };
        Ok(Cleaner {
            canonical_city: rules.canonical_city.clone(),
            spelling_fixes: rules.city_spelling_fixes.clone(),
            abbreviations: rules.city_abbreviations.clone(),
            suffix_fixes: rules.street_suffix_fixes.clone(),
            suffix_guards: rules.street_suffix_guards.clone(),
            invalid_postcodes: rules.invalid_postcodes.clone(),
            housenumber_fixes: rules.housenumber_fixes.clone(),
            // trailing state/canton code, e.g "Buchs ZH" or "Buchs (ZH)"
            state_re: Regex::new(r"\W+\w{2}\W?$")?,
            state_letters_re: Regex::new(r"\w{2}")?,
            variant_re,
            digit_run_re: Regex::new(r"\d+(\w+)?")?,
        })
    }

    /// City names: digit-only values are postcodes stored in the wrong field
    /// and get dropped. Otherwise: exact spelling fixes, then trailing state
    /// codes normalized to a `(XX)` parenthetical, then canonical-city
    /// spelling variants, then abbreviation expansion, first match wins.
    pub fn city(&self, raw: &str) -> Option<String> {
        if raw.trim().parse::<i64>().is_ok() {
            return None;
        }

        for fix in &self.spelling_fixes {
            if raw == fix.from {
                return Some(fix.to.clone());
            }
        }

        if let Some(state) = self.state_re.find(raw) {
            if let Some(letters) = self.state_letters_re.find(state.as_str()) {
                return Some(format!("{} ({})", &raw[..state.start()], letters.as_str()));
            }
        }

        if let Some(variant_re) = &self.variant_re {
            if variant_re.is_match(raw) {
                return Some(self.canonical_city.clone());
            }
        }

        for abbreviation in &self.abbreviations {
            if raw.contains(abbreviation.from.as_str()) {
                return Some(raw.replace(abbreviation.from.as_str(), &abbreviation.to));
            }
        }

        Some(raw.to_string())
    }

    /// Street names: digit-only values are dropped, embedded digit runs (with
    /// an attached trailing word-run) are stripped, then the first applicable
    /// suffix correction rewrites the street type at the end of the name.
    pub fn street(&self, raw: &str) -> Option<String> {
        if raw.trim().parse::<i64>().is_ok() {
            return None;
        }
        let stripped = self.digit_run_re.replace_all(raw, "").trim().to_string();

        for fix in &self.suffix_fixes {
            if !stripped.ends_with(fix.from.as_str()) {
                continue;
            }
            let head = &stripped[..stripped.len() - fix.from.len()];
            // a guarded head means the match is inside a different valid
            // suffix ("rasse" inside "terrasse" or "strasse")
            if self.suffix_guards.iter().any(|guard| head.ends_with(guard.as_str())) {
                continue;
            }
            return Some(format!("{}{}", head, fix.to).trim().to_string());
        }

        Some(stripped)
    }

    /// Postcodes pass through unchanged except for the known sentinel junk
    /// values; format auditing happens elsewhere.
    pub fn postcode(&self, raw: &str) -> Option<String> {
        if self.invalid_postcodes.iter().any(|invalid| invalid == raw) {
            return None;
        }
        Some(raw.to_string())
    }

    /// House numbers: the known values that embed a street name are reduced
    /// to their numeric part; anything else starting with a non-digit is
    /// dropped.
    pub fn housenumber(&self, raw: &str) -> Option<String> {
        for fix in &self.housenumber_fixes {
            if raw == fix.from {
                return Some(fix.to.clone());
            }
        }
        match raw.chars().next() {
            Some(first) if first.is_ascii_digit() => Some(raw.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> Cleaner {
        Cleaner::new(&RuleSet::default()).unwrap()
    }

    #[test]
    fn city_rejects_digit_only_values() {
        assert_eq!(cleaner().city("8002"), None);
        assert_eq!(cleaner().city("-5"), None);
    }

    #[test]
    fn city_applies_exact_spelling_fixes() {
        assert_eq!(
            cleaner().city("Uitikon Waldegg"),
            Some("Uitikon-Waldegg".to_string())
        );
        assert_eq!(
            cleaner().city("Aathal - Seegräben"),
            Some("Aathal-Seegräben".to_string())
        );
    }

    #[test]
    fn city_normalizes_trailing_state_codes() {
        assert_eq!(cleaner().city("Buchs ZH"), Some("Buchs (ZH)".to_string()));
        assert_eq!(cleaner().city("Buchs (ZH)"), Some("Buchs (ZH)".to_string()));
    }

    #[test]
    fn city_rewrites_canonical_spelling_variants() {
        assert_eq!(cleaner().city("Zurich"), Some("Zürich".to_string()));
        assert_eq!(cleaner().city("zuerich"), Some("Zürich".to_string()));
        assert_eq!(cleaner().city("Zürich-Oerlikon"), Some("Zürich".to_string()));
    }

    #[test]
    fn city_expands_abbreviations_in_table_order() {
        assert_eq!(
            cleaner().city("Hausen a. Albis"),
            Some("Hausen am Albis".to_string())
        );
        assert_eq!(cleaner().city("Rifferswil b."), Some("Rifferswil bei".to_string()));
    }

    #[test]
    fn city_passes_clean_values_through() {
        assert_eq!(cleaner().city("Winterthur"), Some("Winterthur".to_string()));
    }

    #[test]
    fn city_cleaning_is_idempotent() {
        let cleaner = cleaner();
        for raw in [
            "Buchs ZH",
            "Zurich",
            "Uitikon Waldegg",
            "Hausen a. Albis",
            "Winterthur",
        ] {
            let once = cleaner.city(raw).unwrap();
            let twice = cleaner.city(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn street_rejects_digit_only_values() {
        assert_eq!(cleaner().street("8400"), None);
    }

    #[test]
    fn street_strips_embedded_digit_runs() {
        assert_eq!(
            cleaner().street("Bahnhofstrasse 12a"),
            Some("Bahnhofstrasse".to_string())
        );
        assert_eq!(cleaner().street("76 Hardstrasse"), Some("Hardstrasse".to_string()));
    }

    #[test]
    fn street_output_has_no_digits_or_outer_whitespace() {
        let cleaner = cleaner();
        for raw in ["Seestrasse 17", " 3 Rötelstrasse 22b ", "Weg 5"] {
            let cleaned = cleaner.street(raw).unwrap();
            assert!(!cleaned.chars().any(|c| c.is_ascii_digit()), "{:?}", cleaned);
            assert_eq!(cleaned, cleaned.trim(), "{:?}", cleaned);
        }
    }

    #[test]
    fn street_corrects_misspelled_suffixes() {
        assert_eq!(cleaner().street("Badenerstr"), Some("Badenerstrasse".to_string()));
        assert_eq!(cleaner().street("Zollstasse"), Some("Zollstrasse".to_string()));
        assert_eq!(cleaner().street("Seesrasse"), Some("Seestrasse".to_string()));
    }

    #[test]
    fn street_suffix_match_is_suppressed_inside_valid_suffixes() {
        assert_eq!(
            cleaner().street("Polyterrasse"),
            Some("Polyterrasse".to_string())
        );
        assert_eq!(
            cleaner().street("Limmatstrasse"),
            Some("Limmatstrasse".to_string())
        );
    }

    #[test]
    fn postcode_rejects_only_the_sentinel() {
        assert_eq!(cleaner().postcode("q"), None);
        assert_eq!(cleaner().postcode("8001"), Some("8001".to_string()));
        assert_eq!(cleaner().postcode("CH-8001"), Some("CH-8001".to_string()));
    }

    #[test]
    fn housenumber_corrects_known_bad_values() {
        assert_eq!(cleaner().housenumber("Im Chies 14"), Some("14".to_string()));
        assert_eq!(cleaner().housenumber("144 Im Hof"), Some("144".to_string()));
    }

    #[test]
    fn housenumber_rejects_values_starting_with_a_non_digit() {
        assert_eq!(cleaner().housenumber("-5"), None);
        assert_eq!(cleaner().housenumber("am Bach"), None);
        assert_eq!(cleaner().housenumber("12a"), Some("12a".to_string()));
    }
}
