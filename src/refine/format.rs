use crate::google::SearchItem;

use super::RoundReport;

pub struct Parameters<'a> {
    pub engine_id: &'a str,
    pub query: &'a str,
    pub target_precision: f64,
}

/// Banner printed before the first round. The API key is never echoed.
pub fn format_parameters(params: &Parameters<'_>) -> String {
    format!(
        "Parameters:\n\
         Engine key  = {}\n\
         Query       = {}\n\
         Precision   = {}\n\
         Google Search Results:\n\
         ======================\n",
        params.engine_id, params.query, params.target_precision
    )
}

pub fn format_result(index: usize, item: &SearchItem) -> String {
    let mut out = format!("Result {index}\n[\n URL: {}\n Title: {}\n", item.link, item.title);
    if let Some(format) = &item.file_format {
        out.push_str(&format!(" Format: {format}\n"));
    }
    out.push_str(&format!(" Summary: {}\n]\n\n", item.snippet));
    out
}

pub fn format_summary(report: &RoundReport) -> String {
    format!(
        "======================\n\
         FEEDBACK SUMMARY\n\
         Query {}\n\
         Precision {:.2}\n",
        report.query,
        report.precision()
    )
}
