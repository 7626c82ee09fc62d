use std::fs;
use std::io::Write;
use std::path::Path;

use osm_normalize::config::UserConfig;
use osm_normalize::etl::normalize_osm::NormalizeOsmEtl;
use osm_normalize::etl::Etl;

const OSM_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <bounds minlat="47.3" minlon="8.4" maxlat="47.5" maxlon="8.6"/>
  <node id="1001" user="mapper" uid="7" version="2" lat="47.3769" lon="8.5417" timestamp="2017-03-01T12:00:00Z" changeset="101">
    <tag k="addr:street" v="Bahnhofstrasse"/>
    <tag k="addr:housenumber" v="Im Chies 14"/>
  </node>
  <node id="1002" user="mapper" uid="7" version="1" lat="47.3600" lon="8.5300" timestamp="2017-03-01T12:05:00Z" changeset="102">
    <tag k="addr:street" v="Seestrasse"/>
    <tag k="addr:postcode" v="8038"/>
    <tag k="note=1" v="dropped entirely"/>
  </node>
  <node id="1003" user="mapper" uid="8" version="1" lat="47.3000" lon="8.5200" timestamp="2017-03-02T08:00:00Z" changeset="103"/>
  <way id="2001" user="mapper" uid="7" version="3" timestamp="2017-04-01T09:30:00Z" changeset="104">
    <nd ref="1001"/>
    <nd ref="1002"/>
    <nd ref="1003"/>
    <tag k="highway" v="residential"/>
    <tag k="addr:street" v="Dorfstrasse"/>
  </way>
  <relation id="3001" user="mapper" uid="9" version="1" timestamp="2017-05-01T10:00:00Z" changeset="105">
    <member type="way" ref="2001" role="br&amp;idge"/>
    <member type="node" ref="1001" role="stop"/>
    <tag k="type" v="route"/>
  </relation>
</osm>
"#;

const REFERENCE_TABLE: &str = "street,district,quarter,zipcode\n\
                               Bahnhofstrasse,Kreis 1,Rathaus,8001\n\
                               Seestrasse,Kreis 2,Enge,8002\n\
                               Seestrasse,Kreis 2,Wollishofen,8038\n";

fn write_config(dir: &Path, data_file: &str) -> UserConfig {
    let raw = format!(
        r#"{{
            "data_path": "{}",
            "reference_path": "{}",
            "dest_path": "{}"
        }}"#,
        dir.join(data_file).display(),
        dir.join("reference.csv").display(),
        dir.join("out").display(),
    );
    serde_json::from_str(&raw).unwrap()
}

fn lines_of(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn normalizes_a_document_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("zurich.osm"), OSM_DOCUMENT).unwrap();
    fs::write(dir.path().join("reference.csv"), REFERENCE_TABLE).unwrap();
    let config = write_config(dir.path(), "zurich.osm");
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let mut etl = NormalizeOsmEtl::new(&config).unwrap();
    etl.process(&out_dir).unwrap();

    let nodes = lines_of(&out_dir.join("nodes.csv"));
    assert_eq!(nodes[0], "id,user,uid,version,lat,lon,timestamp,changeset");
    assert_eq!(nodes.len(), 4);
    assert!(nodes[1].starts_with("1001,mapper,7,2,47.3769,8.5417,"));
    assert!(nodes[3].starts_with("1003,"));

    // node 1001: unique street match and no city/postcode tags fills all four
    // address fields from the reference row
    let node_tags = lines_of(&out_dir.join("nodes_tags.csv"));
    assert_eq!(node_tags[0], "id,key,value,type");
    assert!(node_tags.contains(&"1001,housenumber,14,addr".to_string()));
    assert!(node_tags.contains(&"1001,city,Zürich,addr".to_string()));
    assert!(node_tags.contains(&"1001,street,Bahnhofstrasse,addr".to_string()));
    assert!(node_tags.contains(&"1001,postcode,8001,addr".to_string()));
    assert!(node_tags.contains(&"1001,district,Kreis 1,addr".to_string()));
    assert!(node_tags.contains(&"1001,quarter,Rathaus,addr".to_string()));

    // node 1002: the ambiguous street resolves through the 8038 row only
    assert!(node_tags.contains(&"1002,city,Zürich,addr".to_string()));
    assert!(node_tags.contains(&"1002,district,Kreis 2,addr".to_string()));
    assert!(node_tags.contains(&"1002,quarter,Wollishofen,addr".to_string()));
    assert!(!node_tags.contains(&"1002,quarter,Enge,addr".to_string()));
    assert!(!node_tags.iter().any(|line| line.contains("note")));

    let way_nodes = lines_of(&out_dir.join("ways_nodes.csv"));
    assert_eq!(way_nodes[0], "id,node_id,position");
    assert_eq!(way_nodes[1], "2001,1001,0");
    assert_eq!(way_nodes[2], "2001,1002,1");
    assert_eq!(way_nodes[3], "2001,1003,2");

    // the way's street is not in the reference table and it carries no city
    let way_tags = lines_of(&out_dir.join("ways_tags.csv"));
    assert!(way_tags.contains(&"2001,highway,residential,regular".to_string()));
    assert!(way_tags.contains(&"2001,street,Dorfstrasse,addr".to_string()));
    assert!(way_tags.contains(&"2001,city,Zürich municipality,addr".to_string()));

    let relation_ways = lines_of(&out_dir.join("relations_ways.csv"));
    assert_eq!(relation_ways[1], "3001,2001,unknown,way,0");
    let relation_nodes = lines_of(&out_dir.join("relations_nodes.csv"));
    assert_eq!(relation_nodes[1], "3001,1001,stop,node,1");
    let relation_tags = lines_of(&out_dir.join("relations_tags.csv"));
    assert!(relation_tags.contains(&"3001,type,route,regular".to_string()));
}

#[test]
fn reads_xz_compressed_documents() {
    let dir = tempfile::tempdir().unwrap();
    let compressed = fs::File::create(dir.path().join("zurich.osm.xz")).unwrap();
    let mut encoder = xz::write::XzEncoder::new(compressed, 6);
    encoder.write_all(OSM_DOCUMENT.as_bytes()).unwrap();
    encoder.finish().unwrap();
    fs::write(dir.path().join("reference.csv"), REFERENCE_TABLE).unwrap();
    let config = write_config(dir.path(), "zurich.osm.xz");
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let mut etl = NormalizeOsmEtl::new(&config).unwrap();
    etl.process(&out_dir).unwrap();

    let nodes = lines_of(&out_dir.join("nodes.csv"));
    assert_eq!(nodes.len(), 4);
}

#[test]
fn schema_violations_abort_the_whole_run() {
    let dir = tempfile::tempdir().unwrap();
    let broken = OSM_DOCUMENT.replace("lat=\"47.3769\"", "lat=\"forty-seven\"");
    fs::write(dir.path().join("zurich.osm"), broken).unwrap();
    fs::write(dir.path().join("reference.csv"), REFERENCE_TABLE).unwrap();
    let config = write_config(dir.path(), "zurich.osm");
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let mut etl = NormalizeOsmEtl::new(&config).unwrap();
    let err = etl.process(&out_dir).unwrap_err();
    assert!(err.message.contains("'node'"), "{}", err.message);
    assert!(err.message.contains("lat"), "{}", err.message);
}
