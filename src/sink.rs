use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::rows::ShapedElement;
use crate::errors::Result;
use crate::schema::{
    TableSchema, NODES, NODE_TAGS, RELATIONS, RELATION_NODES, RELATION_TAGS, RELATION_WAYS,
    WAYS, WAY_NODES, WAY_TAGS,
};

/// Output file per sink table, in the column order declared in the schema.
pub const FILE_NAMES: [&str; 9] = [
    "nodes.csv",
    "nodes_tags.csv",
    "ways.csv",
    "ways_nodes.csv",
    "ways_tags.csv",
    "relations.csv",
    "relations_nodes.csv",
    "relations_ways.csv",
    "relations_tags.csv",
];

struct CsvTable {
    writer: BufWriter<File>,
}

impl CsvTable {
    fn create(dir: &Path, file_name: &str, schema: &TableSchema) -> Result<CsvTable> {
        let file = File::create(dir.join(file_name))?;
        let mut writer = BufWriter::new(file);
        let header: Vec<&str> = schema.fields.iter().map(|field| field.name).collect();
        write_record(&mut writer, header.into_iter())?;
        Ok(CsvTable { writer })
    }

    fn write_row(&mut self, values: &[String]) -> Result<()> {
        write_record(&mut self.writer, values.iter().map(String::as_str))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn write_record<'a>(writer: &mut impl Write, values: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut first = true;
    for value in values {
        if !first {
            writer.write_all(b",")?;
        }
        first = false;
        writer.write_all(escape(value).as_bytes())?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// The tabular sink: one CSV file per table, headers written on creation,
/// row order preserved as handed in.
pub struct CsvSink {
    nodes: CsvTable,
    node_tags: CsvTable,
    ways: CsvTable,
    way_nodes: CsvTable,
    way_tags: CsvTable,
    relations: CsvTable,
    relation_nodes: CsvTable,
    relation_ways: CsvTable,
    relation_tags: CsvTable,
}

impl CsvSink {
    pub fn create(dir: &Path) -> Result<CsvSink> {
        Ok(CsvSink {
            nodes: CsvTable::create(dir, "nodes.csv", &NODES)?,
            node_tags: CsvTable::create(dir, "nodes_tags.csv", &NODE_TAGS)?,
            ways: CsvTable::create(dir, "ways.csv", &WAYS)?,
            way_nodes: CsvTable::create(dir, "ways_nodes.csv", &WAY_NODES)?,
            way_tags: CsvTable::create(dir, "ways_tags.csv", &WAY_TAGS)?,
            relations: CsvTable::create(dir, "relations.csv", &RELATIONS)?,
            relation_nodes: CsvTable::create(dir, "relations_nodes.csv", &RELATION_NODES)?,
            relation_ways: CsvTable::create(dir, "relations_ways.csv", &RELATION_WAYS)?,
            relation_tags: CsvTable::create(dir, "relations_tags.csv", &RELATION_TAGS)?,
        })
    }

    pub fn write(&mut self, element: &ShapedElement) -> Result<()> {
        match element {
            ShapedElement::Node { node, tags } => {
                self.nodes.write_row(&node.values())?;
                for tag in tags {
                    self.node_tags.write_row(&tag.values())?;
                }
            }
            ShapedElement::Way { way, nodes, tags } => {
                self.ways.write_row(&way.values())?;
                for node in nodes {
                    self.way_nodes.write_row(&node.values())?;
                }
                for tag in tags {
                    self.way_tags.write_row(&tag.values())?;
                }
            }
            ShapedElement::Relation {
                relation,
                node_members,
                way_members,
                tags,
            } => {
                self.relations.write_row(&relation.values())?;
                for member in node_members {
                    self.relation_nodes.write_row(&member.values())?;
                }
                for member in way_members {
                    self.relation_ways.write_row(&member.values())?;
                }
                for tag in tags {
                    self.relation_tags.write_row(&tag.values())?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.nodes.flush()?;
        self.node_tags.flush()?;
        self.ways.flush()?;
        self.way_nodes.flush()?;
        self.way_tags.flush()?;
        self.relations.flush()?;
        self.relation_nodes.flush()?;
        self.relation_ways.flush()?;
        self.relation_tags.flush()?;
        Ok(())
    }
}
