use url::Url;

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

const SHORT_HOST: &str = "youtu.be";

const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live"];

/// Pulls the video id out of any of the URL shapes YouTube hands out.
pub fn video_id(input: &str) -> Option<String> {
    let parsed = Url::parse(input.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();

    let candidate = if host == SHORT_HOST {
        parsed.path_segments()?.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        let mut segments = parsed.path_segments()?;
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => {
                segments.next().map(str::to_string)
            }
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| is_video_id(id))
}

pub fn is_youtube_url(input: &str) -> bool {
    video_id(input).is_some()
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_shapes() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(video_id("https://youtu.be/abc123").as_deref(), Some("abc123"));
        assert_eq!(
            video_id("https://m.youtube.com/shorts/a_b-C").as_deref(),
            Some("a_b-C")
        );
        assert_eq!(
            video_id("http://www.youtube.com/embed/xyz?autoplay=1").as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn rejects_foreign_or_idless_urls() {
        assert!(!is_youtube_url("https://vimeo.com/12345"));
        assert!(!is_youtube_url("https://www.youtube.com/"));
        assert!(!is_youtube_url("https://www.youtube.com/watch?list=PL123"));
        assert!(!is_youtube_url("https://youtu.be/"));
        assert!(!is_youtube_url("ftp://youtu.be/abc123"));
        assert!(!is_youtube_url("not a url"));
        assert!(!is_youtube_url("https://youtu.be/abc%20123"));
    }
}
