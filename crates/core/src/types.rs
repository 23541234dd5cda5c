/// Node identifiers as assigned by the graph editor.
pub type NodeId = i64;

/// Link identifiers keying the graph's link table.
pub type LinkId = i64;
