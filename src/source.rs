//! Remote media source: video id extraction, audio format selection and
//! the HTTP client that resolves a video into downloadable streams.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::Error;

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("trackstash/", env!("CARGO_PKG_VERSION"));

/// Extract the 11-character video id from the known URL shapes, or accept
/// a bare id as-is.
pub fn extract_video_id(input: &str) -> Result<String, Error> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})",
            r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
            r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect()
    });

    for pattern in patterns {
        if let Some(captures) = pattern.captures(input) {
            return Ok(captures[1].to_string());
        }
    }

    static BARE_ID: OnceLock<Regex> = OnceLock::new();
    let bare = BARE_ID.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("static pattern"));
    if bare.is_match(input) {
        return Ok(input.to_string());
    }

    Err(Error::Validation(format!(
        "could not extract a video id from: {input}"
    )))
}

/// One downloadable stream variant of a video.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Format {
    pub itag: u32,
    pub url: String,
    pub mime_type: String,
    pub bitrate: u64,
    pub audio_channels: u16,
    pub quality: String,
}

impl Format {
    fn is_audio_only(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    fn has_audio(&self) -> bool {
        self.is_audio_only() || self.audio_channels > 0
    }

    fn is_mp4_container(&self) -> bool {
        self.mime_type.contains("mp4") || self.mime_type.contains("m4a")
    }
}

/// Pick the format to download: pure-audio formats beat muxed video+audio;
/// among audio formats higher bitrate wins, with a secondary preference
/// for MP4/M4A containers for compatibility.
pub fn select_audio_format(formats: &[Format]) -> Option<&Format> {
    let audio_only: Vec<&Format> = formats.iter().filter(|f| f.is_audio_only()).collect();

    if audio_only.is_empty() {
        return formats.iter().find(|f| f.has_audio());
    }

    let mut best = audio_only[0];
    for format in &audio_only {
        if format.bitrate > best.bitrate {
            best = format;
        }
        if format.is_mp4_container() && !best.is_mp4_container() {
            best = format;
        }
    }
    Some(best)
}

/// Replace filesystem-hostile characters, collapse spaces to underscores
/// and cap the length so the result is a safe file name.
pub fn sanitize_file_name(name: &str) -> String {
    static BAD_CHARS: OnceLock<Regex> = OnceLock::new();
    let bad = BAD_CHARS.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static pattern"));

    let cleaned = bad.replace_all(name, "_");
    let mut cleaned = cleaned.trim().replace(' ', "_");
    if cleaned.len() > 200 {
        let mut cut = 200;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    cleaned
}

#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub title: String,
    pub author: String,
    pub formats: Vec<Format>,
}

/// Something that can resolve a video id into stream metadata and open the
/// chosen format for reading.
pub trait MediaSource {
    fn resolve(&self, video_id: &str) -> Result<MediaInfo, Error>;
    fn open_format(&self, format: &Format) -> Result<Box<dyn Read>, Error>;
}

/// Client for the public player endpoint.
pub struct InnertubeClient {
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    video_details: Option<VideoDetails>,
    streaming_data: Option<StreamingData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingData {
    #[serde(default)]
    formats: Vec<Format>,
    #[serde(default)]
    adaptive_formats: Vec<Format>,
}

impl InnertubeClient {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| Error::Connection(err.to_string()))?;
        Ok(Self { client })
    }
}

impl MediaSource for InnertubeClient {
    fn resolve(&self, video_id: &str) -> Result<MediaInfo, Error> {
        // The Android client context gets plain stream URLs back without a
        // signature-decipher step.
        let body = json!({
            "videoId": video_id,
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "19.09.37",
                    "androidSdkVersion": 30,
                }
            }
        });

        let response = self
            .client
            .post(PLAYER_ENDPOINT)
            .query(&[("prettyPrint", "false")])
            .json(&body)
            .send()
            .map_err(|err| Error::Connection(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        let parsed: PlayerResponse = response
            .json()
            .map_err(|err| Error::Validation(format!("unexpected player response: {err}")))?;

        let details = parsed.video_details.unwrap_or(VideoDetails {
            title: String::new(),
            author: String::new(),
        });
        let mut formats = Vec::new();
        if let Some(streaming) = parsed.streaming_data {
            formats.extend(streaming.formats);
            formats.extend(streaming.adaptive_formats);
        }
        formats.retain(|f| !f.url.is_empty());

        debug!(video_id, formats = formats.len(), "video resolved");

        Ok(MediaInfo {
            title: details.title,
            author: details.author,
            formats,
        })
    }

    fn open_format(&self, format: &Format) -> Result<Box<dyn Read>, Error> {
        let response = self
            .client
            .get(&format.url)
            .send()
            .map_err(|err| Error::Connection(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        Ok(Box::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(itag: u32, mime: &str, bitrate: u64, channels: u16) -> Format {
        Format {
            itag,
            url: format!("https://stream.example/{itag}"),
            mime_type: mime.to_string(),
            bitrate,
            audio_channels: channels,
            quality: String::new(),
        }
    }

    #[test]
    fn extracts_id_from_known_url_shapes() {
        let id = "dQw4w9WgXcQ";
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).unwrap(), id, "failed for {url}");
        }
    }

    #[test]
    fn rejects_unrecognized_input() {
        assert!(matches!(
            extract_video_id("https://example.com/watch?v=nope"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            extract_video_id("tooshort"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn prefers_pure_audio_over_muxed() {
        let formats = vec![
            format(18, "video/mp4; codecs=\"avc1, mp4a\"", 500_000, 2),
            format(140, "audio/mp4; codecs=\"mp4a.40.2\"", 130_000, 2),
        ];
        assert_eq!(select_audio_format(&formats).unwrap().itag, 140);
    }

    #[test]
    fn prefers_higher_bitrate_among_audio() {
        let formats = vec![
            format(249, "audio/webm; codecs=\"opus\"", 50_000, 2),
            format(251, "audio/webm; codecs=\"opus\"", 160_000, 2),
        ];
        assert_eq!(select_audio_format(&formats).unwrap().itag, 251);
    }

    #[test]
    fn mp4_container_wins_the_tiebreak() {
        let formats = vec![
            format(251, "audio/webm; codecs=\"opus\"", 160_000, 2),
            format(140, "audio/mp4; codecs=\"mp4a.40.2\"", 130_000, 2),
        ];
        assert_eq!(select_audio_format(&formats).unwrap().itag, 140);
    }

    #[test]
    fn falls_back_to_muxed_when_no_pure_audio() {
        let formats = vec![
            format(137, "video/mp4; codecs=\"avc1\"", 2_000_000, 0),
            format(18, "video/mp4; codecs=\"avc1, mp4a\"", 500_000, 2),
        ];
        assert_eq!(select_audio_format(&formats).unwrap().itag, 18);
        assert!(select_audio_format(&[format(137, "video/mp4", 1, 0)]).is_none());
    }

    #[test]
    fn sanitize_replaces_hostile_characters() {
        assert_eq!(
            sanitize_file_name("AC/DC: Back In Black?"),
            "AC_DC__Back_In_Black_"
        );
        assert_eq!(sanitize_file_name("  plain title  "), "plain_title");

        let long = "x".repeat(300);
        assert_eq!(sanitize_file_name(&long).len(), 200);
    }
}
