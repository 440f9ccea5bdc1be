//! Output-side HTML cleaning. Bodies are stored exactly as submitted and
//! cleaned every time they are read.

/// Strips scripts, event handlers and other unsafe markup while keeping
/// ordinary formatting tags.
pub fn clean_body(body: &str) -> String {
    ammonia::clean(body)
}

/// Visible text only, for the search index: every tag is dropped and
/// entities are decoded, so markup never matches a query.
pub fn plain_text(body: &str) -> String {
    let stripped = ammonia::Builder::empty().clean(body).to_string();
    html_escape::decode_html_entities(&stripped).into_owned()
}
