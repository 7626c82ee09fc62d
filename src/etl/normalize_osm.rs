use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use log::info;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::config::UserConfig;
use crate::data::osm::{ElementKind, RawElement, RawMember, RawTag};
use crate::data::rows::ShapedElement;
use crate::errors::Result;
use crate::etl::clean::Cleaner;
use crate::etl::enrich::Enricher;
use crate::etl::shape::shape_element;
use crate::etl::{Etl, RunReport};
use crate::reference::ReferenceTable;
use crate::schema;
use crate::sink::{CsvSink, FILE_NAMES};

const ETL_NAME: &str = "normalize_osm";

pub struct Output {
    pub elements: Vec<ShapedElement>,
    pub report: RunReport,
}

/// The stream driver. Walks the source document event by event, holding at
/// most one element subtree at a time; each closed element is shaped,
/// validated and collected, and its subtree dropped before the next event.
pub struct NormalizeOsmEtl<'a> {
    config: &'a UserConfig,
    cleaner: Cleaner,
}

impl<'a> NormalizeOsmEtl<'a> {
    pub fn new(config: &UserConfig) -> Result<NormalizeOsmEtl> {
        Ok(NormalizeOsmEtl {
            cleaner: Cleaner::new(&config.rules)?,
            config,
        })
    }

    fn create_osm_reader(&self) -> Result<Reader<Box<dyn BufRead>>> {
        let file = File::open(&self.config.data_path)?;
        let file_reader = BufReader::new(file);
        let reader: Box<dyn BufRead> = if self.config.data_path.ends_with(".xz") {
            Box::new(BufReader::new(XzDecoder::new(file_reader)))
        } else {
            Box::new(file_reader)
        };
        Ok(Reader::from_reader(reader))
    }

    fn parse_attributes(start: &BytesStart) -> Result<HashMap<String, String>> {
        let mut attributes = HashMap::new();
        for attribute_res in start.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.to_string();
            attributes.insert(key, value);
        }
        Ok(attributes)
    }

    fn open_element(kind: ElementKind, start: &BytesStart) -> Result<RawElement> {
        let mut element = RawElement::new(kind);
        element.attributes = Self::parse_attributes(start)?;
        Ok(element)
    }

    fn add_child(pending: &mut Option<RawElement>, name: &[u8], start: &BytesStart) -> Result<()> {
        // children outside an open node/way/relation are not ours to shape
        let Some(element) = pending.as_mut() else {
            return Ok(());
        };
        let mut attributes = Self::parse_attributes(start)?;
        match name {
            b"tag" => {
                let key = attributes.remove("k").ok_or("tag element missing 'k' attribute")?;
                let value = attributes.remove("v").ok_or("tag element missing 'v' attribute")?;
                element.tags.push(RawTag { key, value });
            }
            b"nd" => {
                let node_ref = attributes
                    .remove("ref")
                    .ok_or("nd element missing 'ref' attribute")?;
                element.node_refs.push(node_ref);
            }
            b"member" => {
                let member_ref = attributes
                    .remove("ref")
                    .ok_or("member element missing 'ref' attribute")?;
                let role = attributes
                    .remove("role")
                    .ok_or("member element missing 'role' attribute")?;
                let member_type = attributes
                    .remove("type")
                    .ok_or("member element missing 'type' attribute")?;
                element.members.push(RawMember {
                    member_ref,
                    role,
                    member_type,
                });
            }
            _ => (),
        }
        Ok(())
    }

    fn finish_element(
        &self,
        element: RawElement,
        enricher: &Enricher,
        elements: &mut Vec<ShapedElement>,
        report: &mut RunReport,
    ) -> Result<()> {
        match element.kind {
            ElementKind::Node => report.nodes += 1,
            ElementKind::Way => report.ways += 1,
            ElementKind::Relation => report.relations += 1,
        }
        let shaped = shape_element(&element, &self.cleaner, enricher, &self.config.rules, report)?;
        if self.config.validate {
            schema::validate(&shaped)?;
        }
        elements.push(shaped);
        Ok(())
    }
}

impl Etl for NormalizeOsmEtl<'_> {
    type Input = ReferenceTable;
    type Output = Output;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        for file_name in FILE_NAMES {
            if !dir.join(file_name).try_exists()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        for file_name in FILE_NAMES {
            let path = dir.join(file_name);
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let reference = ReferenceTable::load(Path::new(&self.config.reference_path))?;
        info!(etl_name = ETL_NAME, reference_rows = reference.len() as u64; "Reference table loaded");
        Ok(reference)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let enricher = Enricher::new(&input, &self.config.rules);
        let mut reader = self.create_osm_reader()?;
        let mut buf = Vec::new();

        let mut pending: Option<RawElement> = None;
        let mut elements: Vec<ShapedElement> = Vec::new();
        let mut report = RunReport::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(e.into()),
                Ok(Event::Eof) => break,
                Ok(Event::Decl(_)) | Ok(Event::Text(_)) | Ok(Event::Comment(_)) => (),
                Ok(Event::Start(e)) => match ElementKind::from_tag_name(e.name().as_ref()) {
                    Some(kind) => pending = Some(Self::open_element(kind, &e)?),
                    None => Self::add_child(&mut pending, e.name().as_ref(), &e)?,
                },
                Ok(Event::Empty(e)) => match ElementKind::from_tag_name(e.name().as_ref()) {
                    Some(kind) => {
                        let element = Self::open_element(kind, &e)?;
                        self.finish_element(element, &enricher, &mut elements, &mut report)?;
                    }
                    None => Self::add_child(&mut pending, e.name().as_ref(), &e)?,
                },
                Ok(Event::End(e)) => {
                    if ElementKind::from_tag_name(e.name().as_ref()).is_some() {
                        if let Some(element) = pending.take() {
                            self.finish_element(element, &enricher, &mut elements, &mut report)?;
                        }
                    }
                }

                // There are several other `Event`s we do not consider here
                event => return Err(format!("Unexpected event {:?} in OSM file.", event).into()),
            }
            // nothing borrows the buffer across iterations; clearing it keeps
            // memory usage bounded by one element's subtree
            buf.clear();
        }

        info!(
            etl_name = ETL_NAME,
            nodes = report.nodes,
            ways = report.ways,
            relations = report.relations,
            tags_skipped = report.tags_skipped,
            values_rejected = report.values_rejected,
            roles_sentineled = report.roles_sentineled,
            streets_unmatched = report.streets_unmatched,
            streets_ambiguous = report.streets_ambiguous;
            "Stream finished"
        );
        Ok(Output { elements, report })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        let mut sink = CsvSink::create(dir)?;
        for element in &output.elements {
            sink.write(element)?;
        }
        sink.finish()?;
        let total = output.report.nodes + output.report.ways + output.report.relations;
        info!(etl_name = ETL_NAME, elements = total; "Wrote sink tables");
        Ok(())
    }
}
