/// Position of a construct in a schema document.
///
/// All fields are optional: patterns synthesized by a driver rather than read
/// from a document carry no location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub uri: Option<String>,
    pub line: Option<u64>,
    pub column: Option<u64>,
}

impl SourceLocation {
    pub fn new(uri: impl Into<String>, line: u64, column: u64) -> Self {
        Self {
            uri: Some(uri.into()),
            line: Some(line),
            column: Some(column),
        }
    }

    pub const fn unknown() -> Self {
        Self {
            uri: None,
            line: None,
            column: None,
        }
    }

    pub const fn is_known(&self) -> bool {
        self.uri.is_some()
    }
}
