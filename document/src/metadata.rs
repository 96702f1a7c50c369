//! Document-level metadata that belongs to neither tree: save state, file
//! identity, encoding and line-ending convention.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    pub fn parse(s: &str) -> Option<LineEnding> {
        match s {
            "lf" => Some(LineEnding::Lf),
            "crlf" => Some(LineEnding::Crlf),
            "cr" => Some(LineEnding::Cr),
            _ => None,
        }
    }
}

impl Default for LineEnding {
    fn default() -> LineEnding {
        LineEnding::Lf
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub file_path: Option<String>,
    pub encoding: String,
    pub line_ending: LineEnding,
    pub is_dirty: bool,
    pub last_saved: Option<u64>,
}

impl DocumentMetadata {
    pub fn new(encoding: String, line_ending: LineEnding) -> DocumentMetadata {
        DocumentMetadata {
            file_path: None,
            encoding,
            line_ending,
            is_dirty: false,
            last_saved: None,
        }
    }

    pub fn with_dirty(&self, is_dirty: bool) -> DocumentMetadata {
        DocumentMetadata {
            is_dirty,
            ..self.clone()
        }
    }

    pub fn with_saved(&self, at_version: u64) -> DocumentMetadata {
        DocumentMetadata {
            is_dirty: false,
            last_saved: Some(at_version),
            ..self.clone()
        }
    }
}
