//! Catalog Name Filtering
//!
//! Autocomplete for the query editor: turns a controller catalog listing
//! (applications, or the metric tree under an application) into candidate
//! strings the user can pick from.

use crate::controller::CatalogEntry;
use crate::query::pattern::PATH_DELIMITER;

/// Entry type the controller uses for metric tree branches
pub const FOLDER_TYPE: &str = "folder";

/// Everything in `query` up to and including its last delimiter
pub fn query_prefix(query: &str) -> &str {
    match query.rfind(PATH_DELIMITER) {
        Some(pos) => &query[..pos + PATH_DELIMITER.len_utf8()],
        None => "",
    }
}

/// Folder path to list upstream for a metric-name query, if the query has
/// descended into the tree at all.
///
/// `"Business Transactions|Ja"` lists `"Business Transactions"`.
pub fn upstream_metric_path(query: &str) -> Option<&str> {
    query.rfind(PATH_DELIMITER).map(|pos| &query[..pos])
}

/// Build candidates from catalog entries and keep the ones containing `query`.
///
/// Candidates carry the query's path prefix; folders get a trailing delimiter
/// so the user can keep descending. Matching is case-insensitive substring
/// containment, not a prefix test and not a regex.
pub fn filter_names(query: &str, entries: &[CatalogEntry]) -> Vec<String> {
    let prefix = query_prefix(query);
    let needle = query.to_lowercase();

    entries
        .iter()
        .map(|entry| {
            let mut candidate = format!("{}{}", prefix, entry.name);
            if entry.is_folder() {
                candidate.push(PATH_DELIMITER);
            }
            candidate
        })
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .collect()
}
