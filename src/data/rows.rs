//! Normalized output records. Field values stay string-typed the whole way
//! through; the schema validator checks that they parse as their declared
//! column types before anything is handed to the sink.
//!
//! The `values()` methods return fields in sink column order.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub id: String,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub lat: String,
    pub lon: String,
    pub timestamp: String,
    pub changeset: String,
}

impl NodeRow {
    pub fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user.clone(),
            self.uid.clone(),
            self.version.clone(),
            self.lat.clone(),
            self.lon.clone(),
            self.timestamp.clone(),
            self.changeset.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayRow {
    pub id: String,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub timestamp: String,
    pub changeset: String,
}

impl WayRow {
    pub fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.user.clone(),
            self.uid.clone(),
            self.version.clone(),
            self.timestamp.clone(),
            self.changeset.clone(),
        ]
    }
}

/// Relations carry the same primary attributes as ways.
pub type RelationRow = WayRow;

/// One key/value annotation attached to an element, with the key already
/// decomposed into its namespace (`tag_type`) and field (`key`) parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub id: String,
    pub key: String,
    pub value: String,
    pub tag_type: String,
}

impl TagRow {
    pub fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.key.clone(),
            self.value.clone(),
            self.tag_type.clone(),
        ]
    }
}

/// Ordered node reference of a way. `position` is the 0-based document order;
/// it is the only record of ordering once the rows are in the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayNodeRow {
    pub id: String,
    pub node_id: String,
    pub position: usize,
}

impl WayNodeRow {
    pub fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.node_id.clone(),
            self.position.to_string(),
        ]
    }
}

/// Ordered member of a relation. `position` counts over all members of the
/// relation in document order, including members of dropped types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub id: String,
    pub member_id: String,
    pub member_role: String,
    pub member_type: String,
    pub position: usize,
}

impl MemberRow {
    pub fn values(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.member_id.clone(),
            self.member_role.clone(),
            self.member_type.clone(),
            self.position.to_string(),
        ]
    }
}

/// The shaped output for one source element, partitioned by element kind.
#[derive(Debug)]
pub enum ShapedElement {
    Node {
        node: NodeRow,
        tags: Vec<TagRow>,
    },
    Way {
        way: WayRow,
        nodes: Vec<WayNodeRow>,
        tags: Vec<TagRow>,
    },
    Relation {
        relation: RelationRow,
        node_members: Vec<MemberRow>,
        way_members: Vec<MemberRow>,
        tags: Vec<TagRow>,
    },
}
