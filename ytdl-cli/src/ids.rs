use url::Url;

/// Pulls the video id out of a YouTube URL.
///
/// Supported forms:
/// - `https://youtube.com/watch?v=<VIDEO_ID>`
/// - `https://youtube.com/embed/<VIDEO_ID>`
/// - `https://youtu.be/<VIDEO_ID>`
pub fn extract_video_id(url: &str) -> Result<String, String> {
    let uri = Url::parse(url.trim()).map_err(|e| e.to_string())?;
    let host = uri.host_str().unwrap_or("");

    let mut video_id = None;
    if host.contains("youtube.com") {
        if uri.path() == "/watch" {
            video_id = uri
                .query_pairs()
                .find(|(key, _)| key.eq_ignore_ascii_case("v"))
                .map(|(_, value)| value.to_string());
        } else if let Some(rest) = uri.path().strip_prefix("/embed/") {
            video_id = Some(rest.to_string());
        }
    } else if host.contains("youtu.be") {
        video_id = Some(uri.path().trim_start_matches('/').to_string());
    }

    let mut video_id = video_id.ok_or_else(|| String::from("No video ID found."))?;
    for separator in ['&', '?', '/'] {
        if let Some(index) = video_id.find(separator) {
            video_id.truncate(index);
        }
    }

    if video_id.is_empty() {
        return Err(String::from("No video ID found."));
    }
    Ok(video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_watch() {
        let result = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(result, String::from("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_video_id_watch_extra_params() {
        let result =
            extract_video_id("https://youtube.com/watch?list=PL1&V=dQw4w9WgXcQ&t=42").unwrap();
        assert_eq!(result, String::from("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_video_id_embed() {
        let result = extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?start=10").unwrap();
        assert_eq!(result, String::from("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_video_id_short() {
        let result = extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc").unwrap();
        assert_eq!(result, String::from("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_video_id_unsupported() {
        assert!(extract_video_id("https://youtube.com/feed/trending").is_err());
        assert!(extract_video_id("https://youtube.com/watch?list=PL1").is_err());
        assert!(extract_video_id("https://example.com/watch?v=abc").is_err());
        assert!(extract_video_id("https://youtu.be/").is_err());
        assert!(extract_video_id("not a url").is_err());
    }
}
