/// Width requested from the thumbnail endpoint.
const THUMBNAIL_WIDTH: u32 = 1000;

/// A Drive share-link shape that can be rewritten to a thumbnail URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriveLink {
    /// `drive.google.com/file/d/<id>/view?...`
    FileView,
    /// `drive.google.com/open?id=<id>`
    Open,
    /// `drive.google.com/uc?export=view&id=<id>`
    Uc,
}

const DRIVE_LINKS: [DriveLink; 3] = [DriveLink::FileView, DriveLink::Open, DriveLink::Uc];

impl DriveLink {
    fn file_id(self, url: &str) -> Option<String> {
        match self {
            DriveLink::FileView => id_after(url, "drive.google.com/file/d/"),
            DriveLink::Open => id_after(url, "drive.google.com/open?id="),
            DriveLink::Uc => {
                let query_at = url.find("drive.google.com/uc?")?;
                let query = &url[query_at..];
                // the last `id=` carrying a value wins
                query
                    .rmatch_indices("id=")
                    .find_map(|(idx, m)| id_prefix(&query[idx + m.len()..]))
            }
        }
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn id_prefix(s: &str) -> Option<String> {
    let id: String = s.chars().take_while(|&c| is_id_char(c)).collect();
    (!id.is_empty()).then_some(id)
}

fn id_after(url: &str, marker: &str) -> Option<String> {
    let start = url.find(marker)? + marker.len();
    id_prefix(&url[start..])
}

/// Rewrite Drive share links into an embeddable thumbnail URL.
///
/// Other URLs are returned trimmed but otherwise unchanged.
pub fn normalize_image_url(url: &str) -> String {
    let url = url.trim().trim_matches('"').trim_matches('\'');
    if url.is_empty() {
        return String::new();
    }

    DRIVE_LINKS
        .iter()
        .find_map(|shape| shape.file_id(url))
        .map(|id| {
            format!(
                "https://drive.google.com/thumbnail?id={}&sz=w{}",
                id, THUMBNAIL_WIDTH
            )
        })
        .unwrap_or_else(|| url.to_string())
}
