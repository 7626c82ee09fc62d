use crate::config::RuleSet;
use crate::data::rows::TagRow;
use crate::etl::shape::AddressSlots;
use crate::etl::RunReport;
use crate::reference::ReferenceTable;

/// Fills in or corrects city, postcode, district and quarter from the street
/// reference table. The rule order below is a tie-break contract; changing it
/// changes which of several partially-conflicting inputs wins.
pub struct Enricher<'a> {
    reference: &'a ReferenceTable,
    rules: &'a RuleSet,
}

impl<'a> Enricher<'a> {
    pub fn new(reference: &'a ReferenceTable, rules: &'a RuleSet) -> Enricher<'a> {
        Enricher { reference, rules }
    }

    pub fn enrich(&self, id: &str, slots: &mut AddressSlots, report: &mut RunReport) {
        let street_value = match &slots.street {
            Some(street) => street.value.clone(),
            None => return,
        };
        let rows = self.reference.lookup(&self.lookup_key(&street_value));

        if rows.is_empty() {
            // not a street of the core city: keep a foreign city value, but
            // never stamp the canonical name on it
            report.streets_unmatched += 1;
            let city_is_canonical = slots
                .city
                .as_ref()
                .map_or(false, |city| city.value == self.rules.canonical_city);
            if slots.city.is_none() || city_is_canonical {
                fill(&mut slots.city, id, "city", &self.rules.municipality_label);
            }
        } else if rows.len() == 1 {
            let row = &rows[0];
            let mut confirmed = false;

            let city_is_canonical = slots
                .city
                .as_ref()
                .map_or(false, |city| city.value == self.rules.canonical_city);
            if city_is_canonical {
                fill(&mut slots.postcode, id, "postcode", &row.zipcode);
                confirmed = true;
            }

            let postcode_is_expected = slots.postcode.as_ref().map_or(false, |postcode| {
                self.rules.expected_postcodes.contains(&postcode.value)
            });
            if postcode_is_expected {
                fill(&mut slots.city, id, "city", &self.rules.canonical_city);
                confirmed = true;
            }

            if confirmed {
                fill(&mut slots.district, id, "district", &row.district);
                fill(&mut slots.quarter, id, "quarter", &row.quarter);
            }

            // no city and no postcode on the element at all: assume the
            // canonical city and take everything from the reference row
            if slots.city.is_none() && slots.postcode.is_none() {
                fill(&mut slots.city, id, "city", &self.rules.canonical_city);
                fill(&mut slots.postcode, id, "postcode", &row.zipcode);
                fill(&mut slots.district, id, "district", &row.district);
                fill(&mut slots.quarter, id, "quarter", &row.quarter);
            }
        } else {
            // street spans several districts; only a postcode can pick the row
            match &slots.postcode {
                Some(postcode) => {
                    if let Some(row) = rows.iter().find(|row| row.zipcode == postcode.value) {
                        fill(&mut slots.city, id, "city", &self.rules.canonical_city);
                        fill(&mut slots.district, id, "district", &row.district);
                        fill(&mut slots.quarter, id, "quarter", &row.quarter);
                    } else {
                        report.streets_ambiguous += 1;
                    }
                }
                None => report.streets_ambiguous += 1,
            }
        }
    }

    /// Rewrites known dialect endings so source spellings like "-gass" hit
    /// the "-gasse" rows of the reference table. Lookup only; the emitted
    /// street tag keeps its source spelling.
    fn lookup_key(&self, street: &str) -> String {
        for fix in &self.rules.street_dialect_suffixes {
            if street.ends_with(fix.from.as_str()) {
                return format!("{}{}", &street[..street.len() - fix.from.len()], fix.to);
            }
        }
        street.to_string()
    }
}

fn fill(slot: &mut Option<TagRow>, id: &str, key: &str, value: &str) {
    *slot = Some(TagRow {
        id: id.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        tag_type: "addr".to_string(),
    });
}
