//! Content type lookup by file extension.

use std::path::Path;


pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";

/// Extension to content type; new entries go here.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("htm", TEXT_HTML),
    ("html", TEXT_HTML),
];


/// Content type of a served file, `text/plain` when the extension is unknown or missing.
pub fn get_content_type<P: AsRef<Path>>(path: P) -> &'static str {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            CONTENT_TYPES.iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, content_type)| *content_type)
        })
        .unwrap_or(TEXT_PLAIN)
}
