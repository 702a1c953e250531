use serde::{Deserialize, Serialize};

/// Whether a text is embedded as a search query or as indexed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Query,
    Passage,
}

/// Role-marker convention of an embedding model.
///
/// Asymmetric models such as the multilingual E5 family are trained with
/// `query: ` / `passage: ` prefixes. If the index was built with passage
/// prefixes, queries must carry the query prefix or scores are skewed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixStyle {
    /// Text is embedded verbatim regardless of role
    #[default]
    None,
    /// `query: ` for queries, `passage: ` for indexed content
    E5,
}

impl PrefixStyle {
    /// Render `text` the way the model expects it for `role`.
    pub fn apply(&self, role: TextRole, text: &str) -> String {
        match (self, role) {
            (PrefixStyle::None, _) => text.to_string(),
            (PrefixStyle::E5, TextRole::Query) => format!("query: {text}"),
            (PrefixStyle::E5, TextRole::Passage) => format!("passage: {text}"),
        }
    }
}
