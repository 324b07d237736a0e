use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub error: Option<ApiError>,
}

/// One result of a Custom Search request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    /// Set by the API for non-HTML results (e.g. "PDF/Adobe Acrobat").
    pub file_format: Option<String>,
}

impl SearchItem {
    /// Text fed to the expander when the item is judged relevant.
    pub fn document_text(&self) -> String {
        match (self.title.is_empty(), self.snippet.is_empty()) {
            (false, false) => format!("{} {}", self.title, self.snippet),
            (false, true) => self.title.clone(),
            _ => self.snippet.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: Option<String>,
}
