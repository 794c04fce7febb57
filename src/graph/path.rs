// ABOUTME: Path helpers for drive addressing
// ABOUTME: Percent-encodes user supplied paths and file names segment by segment

/// Encode a drive-relative path for `root:/<path>` addressing.
/// Leading slashes are dropped and `/` separators are kept.
pub fn encode_drive_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Path-based item id, as used in `/drives/{drive}/root:/{path}` requests.
pub fn path_based_id(path: &str) -> String {
    format!("root:/{}", encode_drive_path(path))
}
