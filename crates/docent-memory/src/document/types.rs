/// Raw text of one ingested file. Dropped once chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: String,
    pub raw_text: String,
    pub content_type: &'static str,
    pub page_count: Option<usize>,
}

/// A bounded window of a [`SourceDocument`]; the unit that gets embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: u64,
    pub source_path: String,
    pub text: String,
    /// Offset of the first character of `text` in the source, counted in chars.
    pub start_offset: usize,
}
