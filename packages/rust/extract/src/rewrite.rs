//! Textual rewrites applied to each formatted section.
//!
//! Each pass is a function `&str -> String` applied in sequence.

/// Run all rewrite passes on a formatted section.
pub fn run_pipeline(html: &str, site_origin: &str, label: &str) -> String {
    let mut result = open_details(html);
    result = absolutize_links(&result, site_origin);
    result = tag_heading(&result, label);
    result
}

/// Render every bare `<details>` expanded.
fn open_details(html: &str) -> String {
    html.replace("<details>", "<details open>")
}

/// Prefix root-relative `href`s with the site origin.
fn absolutize_links(html: &str, site_origin: &str) -> String {
    html.replace("href=\"/", &format!("href=\"{site_origin}/"))
}

/// Append ` (<label>)` inside the first closing `</h1>`.
fn tag_heading(html: &str, label: &str) -> String {
    html.replacen("</h1>", &format!(" ({label})</h1>"), 1)
}
