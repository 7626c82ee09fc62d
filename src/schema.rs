//! Declared structure of the sink tables. Field order here is the column
//! order the sink writes, and the validator checks every shaped record
//! against it before emission. Values travel as strings; `Integer` and
//! `Float` mean the string must parse as that type.

use crate::data::rows::ShapedElement;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    Str,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
}

#[derive(Debug)]
pub struct TableSchema {
    pub group: &'static str,
    pub fields: &'static [FieldSpec],
}

const fn field(name: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec { name, field_type }
}

const TAG_FIELDS: &[FieldSpec] = &[
    field("id", FieldType::Integer),
    field("key", FieldType::Str),
    field("value", FieldType::Str),
    field("type", FieldType::Str),
];

const MEMBER_FIELDS: &[FieldSpec] = &[
    field("id", FieldType::Integer),
    field("member_id", FieldType::Integer),
    field("member_role", FieldType::Str),
    field("member_type", FieldType::Str),
    field("position", FieldType::Integer),
];

pub const NODES: TableSchema = TableSchema {
    group: "node",
    fields: &[
        field("id", FieldType::Integer),
        field("user", FieldType::Str),
        field("uid", FieldType::Integer),
        field("version", FieldType::Str),
        field("lat", FieldType::Float),
        field("lon", FieldType::Float),
        field("timestamp", FieldType::Str),
        field("changeset", FieldType::Integer),
    ],
};

pub const NODE_TAGS: TableSchema = TableSchema {
    group: "node_tags",
    fields: TAG_FIELDS,
};

pub const WAYS: TableSchema = TableSchema {
    group: "way",
    fields: &[
        field("id", FieldType::Integer),
        field("user", FieldType::Str),
        field("uid", FieldType::Integer),
        field("version", FieldType::Str),
        field("timestamp", FieldType::Str),
        field("changeset", FieldType::Integer),
    ],
};

pub const WAY_NODES: TableSchema = TableSchema {
    group: "way_nodes",
    fields: &[
        field("id", FieldType::Integer),
        field("node_id", FieldType::Integer),
        field("position", FieldType::Integer),
    ],
};

pub const WAY_TAGS: TableSchema = TableSchema {
    group: "way_tags",
    fields: TAG_FIELDS,
};

pub const RELATIONS: TableSchema = TableSchema {
    group: "relation",
    fields: &[
        field("id", FieldType::Integer),
        field("user", FieldType::Str),
        field("uid", FieldType::Integer),
        field("version", FieldType::Str),
        field("timestamp", FieldType::Str),
        field("changeset", FieldType::Integer),
    ],
};

pub const RELATION_NODES: TableSchema = TableSchema {
    group: "relation_nodes",
    fields: MEMBER_FIELDS,
};

pub const RELATION_WAYS: TableSchema = TableSchema {
    group: "relation_ways",
    fields: MEMBER_FIELDS,
};

pub const RELATION_TAGS: TableSchema = TableSchema {
    group: "relation_tags",
    fields: TAG_FIELDS,
};

/// Checks one shaped element against the declared schema. Any mismatch is
/// fatal for the run; downstream storage assumes every batch is uniform.
pub fn validate(element: &ShapedElement) -> Result<()> {
    match element {
        ShapedElement::Node { node, tags } => {
            validate_rows(&NODES, &[node.values()])?;
            validate_rows(&NODE_TAGS, &row_values(tags.iter().map(|tag| tag.values())))?;
        }
        ShapedElement::Way { way, nodes, tags } => {
            validate_rows(&WAYS, &[way.values()])?;
            validate_rows(&WAY_NODES, &row_values(nodes.iter().map(|node| node.values())))?;
            validate_rows(&WAY_TAGS, &row_values(tags.iter().map(|tag| tag.values())))?;
        }
        ShapedElement::Relation {
            relation,
            node_members,
            way_members,
            tags,
        } => {
            validate_rows(&RELATIONS, &[relation.values()])?;
            validate_rows(
                &RELATION_NODES,
                &row_values(node_members.iter().map(|member| member.values())),
            )?;
            validate_rows(
                &RELATION_WAYS,
                &row_values(way_members.iter().map(|member| member.values())),
            )?;
            validate_rows(&RELATION_TAGS, &row_values(tags.iter().map(|tag| tag.values())))?;
        }
    }
    Ok(())
}

fn row_values(rows: impl Iterator<Item = Vec<String>>) -> Vec<Vec<String>> {
    rows.collect()
}

fn validate_rows(schema: &TableSchema, rows: &[Vec<String>]) -> Result<()> {
    let mut errors = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        if row.len() != schema.fields.len() {
            errors.push(format!(
                "row {}: expected {} fields, found {}",
                row_idx,
                schema.fields.len(),
                row.len()
            ));
            continue;
        }
        for (spec, value) in schema.fields.iter().zip(row) {
            if let Some(problem) = check_value(spec.field_type, value) {
                errors.push(format!("row {}: {}: {}", row_idx, spec.name, problem));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Element of type '{}' has the following errors: {}",
            schema.group,
            errors.join("; ")
        )
        .into())
    }
}

fn check_value(field_type: FieldType, value: &str) -> Option<String> {
    match field_type {
        FieldType::Integer => value
            .parse::<i64>()
            .err()
            .map(|_| format!("'{}' is not an integer", value)),
        FieldType::Float => value
            .parse::<f64>()
            .err()
            .map(|_| format!("'{}' is not a float", value)),
        FieldType::Str => None,
    }
}
