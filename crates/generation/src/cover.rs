//! Placeholder cover art

use reqwest::Url;

const PLACEHOLDER_ORIGIN: &str = "https://picsum.photos";
const PLACEHOLDER_WIDTH: &str = "400";
const PLACEHOLDER_HEIGHT: &str = "600";

/// Deterministic placeholder image for a title
///
/// The same title always yields the same URL; the title is percent-encoded
/// as a single path segment.
pub fn placeholder_cover(title: &str) -> String {
    match Url::parse(PLACEHOLDER_ORIGIN) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments
                    .clear()
                    .push("seed")
                    .push(title)
                    .push(PLACEHOLDER_WIDTH)
                    .push(PLACEHOLDER_HEIGHT);
            }
            url.to_string()
        }
        Err(_) => format!(
            "{}/seed/{}/{}/{}",
            PLACEHOLDER_ORIGIN, title, PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT
        ),
    }
}

/// Wraps inline image bytes (already base64) as a data URI
pub fn data_uri(mime_type: Option<&str>, base64_data: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type.unwrap_or("image/png"),
        base64_data
    )
}
