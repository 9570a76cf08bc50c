const DIRECT_FILE_NAME: &str = "stream.mp4";

/// Rewrites a stream URL to its direct-file form. The manifest filename is
/// replaced; query and auth parameters are kept as they are.
pub fn direct_file_url(url: &str) -> String {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    let path = if path.ends_with(".mp4") {
        path.to_string()
    } else {
        match path.rsplit_once('/') {
            Some((dir, file)) if file.ends_with(".m3u8") => format!("{dir}/{DIRECT_FILE_NAME}"),
            _ => format!("{}/{DIRECT_FILE_NAME}", path.trim_end_matches('/')),
        }
    };

    match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path,
    }
}
