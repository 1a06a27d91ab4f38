use serde::{Deserialize, Serialize};

/// One page of the layout view.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub elements: Vec<TextElement>,
}

/// A text-bearing layout element: a block of consecutive lines.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextElement {
    pub lines: Vec<String>,
}

impl TextElement {
    /// Lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// A layout line that matched the active title pattern.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub text: String,
    /// 1-based page the line was found on.
    pub page: usize,
    /// Position in the overall encounter order, starting at 0.
    pub order: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
}
