use crate::config::RuleSet;
use crate::data::osm::{ElementKind, RawElement};
use crate::data::rows::{MemberRow, NodeRow, ShapedElement, TagRow, WayNodeRow, WayRow};
use crate::errors::Result;
use crate::etl::clean::Cleaner;
use crate::etl::enrich::Enricher;
use crate::etl::RunReport;

/// Replacement for relation member roles that contain a disallowed character.
pub const ROLE_SENTINEL: &str = "unknown";

/// Splits a compound tag key into `(namespace, field)`. One separator splits
/// in two; with more separators the namespace is the first segment and the
/// field keeps the rest, internal separators included. Keys without a
/// separator get the configured default namespace.
pub fn split_tag_key(key: &str, default_tag_type: &str) -> (String, String) {
    match key.find(':') {
        Some(idx) => (key[..idx].to_string(), key[idx + 1..].to_string()),
        None => (default_tag_type.to_string(), key.to_string()),
    }
}

/// Empty keys count as disallowed too.
pub fn is_disallowed(key: &str, disallowed_chars: &str) -> bool {
    key.is_empty() || key.chars().any(|c| disallowed_chars.contains(c))
}

/// Single-slot accumulators for the recognized address tags of one element.
/// A later duplicate tag of the same kind overwrites the earlier one.
/// District and quarter are never read from the source; only enrichment
/// fills them.
#[derive(Debug, Default)]
pub struct AddressSlots {
    pub city: Option<TagRow>,
    pub street: Option<TagRow>,
    pub postcode: Option<TagRow>,
    pub district: Option<TagRow>,
    pub quarter: Option<TagRow>,
}

impl AddressSlots {
    /// Occupied slots as tag rows, in the fixed output order city, street,
    /// postcode, district, quarter.
    pub fn into_rows(self) -> impl Iterator<Item = TagRow> {
        [
            self.city,
            self.street,
            self.postcode,
            self.district,
            self.quarter,
        ]
        .into_iter()
        .flatten()
    }
}

enum TagKind {
    City,
    Street,
    Postcode,
    Other,
}

/// Runs every sub-tag of the element through the disallowed-character filter
/// and the matching cleaner. Address tags land in their slots, everything
/// else in the generic list. Cleaned house numbers stay generic tags; they
/// take no part in enrichment.
fn collect_tags(
    element: &RawElement,
    id: &str,
    cleaner: &Cleaner,
    rules: &RuleSet,
    report: &mut RunReport,
) -> (Vec<TagRow>, AddressSlots) {
    let mut tags = Vec::new();
    let mut slots = AddressSlots::default();

    for tag in &element.tags {
        let key = tag.key.trim();
        if is_disallowed(key, &rules.disallowed_chars) {
            report.tags_skipped += 1;
            continue;
        }

        let (kind, cleaned) = match key {
            "addr:city" => (TagKind::City, cleaner.city(&tag.value)),
            "addr:street" => (TagKind::Street, cleaner.street(&tag.value)),
            "addr:postcode" => (TagKind::Postcode, cleaner.postcode(&tag.value)),
            "addr:housenumber" => (TagKind::Other, cleaner.housenumber(&tag.value)),
            _ => (TagKind::Other, Some(tag.value.clone())),
        };
        let value = match cleaned {
            Some(value) if !value.is_empty() => value,
            _ => {
                report.values_rejected += 1;
                continue;
            }
        };

        let (tag_type, field) = split_tag_key(key, &rules.default_tag_type);
        let row = TagRow {
            id: id.to_string(),
            key: field,
            value,
            tag_type,
        };
        match kind {
            TagKind::City => slots.city = Some(row),
            TagKind::Street => slots.street = Some(row),
            TagKind::Postcode => slots.postcode = Some(row),
            TagKind::Other => tags.push(row),
        }
    }

    (tags, slots)
}

fn shape_tags(
    element: &RawElement,
    id: &str,
    cleaner: &Cleaner,
    enricher: &Enricher,
    rules: &RuleSet,
    report: &mut RunReport,
) -> Vec<TagRow> {
    let (mut tags, mut slots) = collect_tags(element, id, cleaner, rules, report);
    enricher.enrich(id, &mut slots, report);
    tags.extend(slots.into_rows());
    tags
}

/// Shapes one raw element into its normalized records: primary attributes,
/// cleaned and enriched tags, and the ordered child lists of ways and
/// relations. Missing required attributes surface as errors; attribute
/// values are checked against the declared column types by the schema
/// validator afterwards.
pub fn shape_element(
    element: &RawElement,
    cleaner: &Cleaner,
    enricher: &Enricher,
    rules: &RuleSet,
    report: &mut RunReport,
) -> Result<ShapedElement> {
    match element.kind {
        ElementKind::Node => {
            let node = NodeRow {
                id: element.attribute("id")?.to_string(),
                user: element.attribute("user")?.to_string(),
                uid: element.attribute("uid")?.to_string(),
                version: element.attribute("version")?.to_string(),
                lat: element.attribute("lat")?.to_string(),
                lon: element.attribute("lon")?.to_string(),
                timestamp: element.attribute("timestamp")?.to_string(),
                changeset: element.attribute("changeset")?.to_string(),
            };
            let tags = shape_tags(element, &node.id, cleaner, enricher, rules, report);
            Ok(ShapedElement::Node { node, tags })
        }
        ElementKind::Way => {
            let way = primary_attributes(element)?;
            let tags = shape_tags(element, &way.id, cleaner, enricher, rules, report);
            let nodes = element
                .node_refs
                .iter()
                .enumerate()
                .map(|(position, node_ref)| WayNodeRow {
                    id: way.id.clone(),
                    node_id: node_ref.clone(),
                    position,
                })
                .collect();
            Ok(ShapedElement::Way { way, nodes, tags })
        }
        ElementKind::Relation => {
            let relation = primary_attributes(element)?;
            let tags = shape_tags(element, &relation.id, cleaner, enricher, rules, report);
            let mut node_members = Vec::new();
            let mut way_members = Vec::new();
            // position counts all members in document order, dropped types
            // included
            for (position, member) in element.members.iter().enumerate() {
                let member_role = if is_disallowed(&member.role, &rules.disallowed_chars) {
                    report.roles_sentineled += 1;
                    ROLE_SENTINEL.to_string()
                } else {
                    member.role.clone()
                };
                let row = MemberRow {
                    id: relation.id.clone(),
                    member_id: member.member_ref.clone(),
                    member_role,
                    member_type: member.member_type.clone(),
                    position,
                };
                match member.member_type.as_str() {
                    "node" => node_members.push(row),
                    "way" => way_members.push(row),
                    _ => (),
                }
            }
            Ok(ShapedElement::Relation {
                relation,
                node_members,
                way_members,
                tags,
            })
        }
    }
}

fn primary_attributes(element: &RawElement) -> Result<WayRow> {
    Ok(WayRow {
        id: element.attribute("id")?.to_string(),
        user: element.attribute("user")?.to_string(),
        uid: element.attribute("uid")?.to_string(),
        version: element.attribute("version")?.to_string(),
        timestamp: element.attribute("timestamp")?.to_string(),
        changeset: element.attribute("changeset")?.to_string(),
    })
}
