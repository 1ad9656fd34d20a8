// Timed-text XML handling.
// Track lists: <transcript_list><track lang_code="en" kind="asr" .../></transcript_list>
// Tracks: <transcript><text start=".." dur="..">line</text>...</transcript> -> "line line ..."

use std::sync::LazyLock;

use regex::Regex;

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static TRACK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<track\s([^>]*?)/?>").unwrap());

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).unwrap());

/// One caption track a video offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub lang_code: String,
    /// Track name; required to fetch named manual tracks.
    pub name: String,
    /// "asr" for speech-recognized tracks.
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Parse a `type=list` response into its tracks, in listed order.
pub fn parse_track_list(xml: &str) -> Vec<CaptionTrack> {
    TRACK_RE
        .captures_iter(xml)
        .filter_map(|cap| {
            let attrs = cap.get(1)?.as_str();
            let mut track = CaptionTrack {
                lang_code: String::new(),
                name: String::new(),
                kind: None,
            };
            for attr in ATTR_RE.captures_iter(attrs) {
                let value = decode_entities(&attr[2]);
                match &attr[1] {
                    "lang_code" => track.lang_code = value,
                    "name" => track.name = value,
                    "kind" if !value.is_empty() => track.kind = Some(value),
                    _ => {}
                }
            }
            (!track.lang_code.is_empty()).then_some(track)
        })
        .collect()
}

/// Choose the track to read: a manual track in `lang`, then a generated one
/// in `lang`, then any manual track, then any generated track.
pub fn pick_track<'a>(tracks: &'a [CaptionTrack], lang: &str) -> Option<&'a CaptionTrack> {
    let in_lang = |t: &&CaptionTrack| t.lang_code == lang || t.lang_code.starts_with(&format!("{lang}-"));
    tracks
        .iter()
        .filter(in_lang)
        .find(|t| !t.is_generated())
        .or_else(|| tracks.iter().filter(in_lang).find(|t| t.is_generated()))
        .or_else(|| tracks.iter().find(|t| !t.is_generated()))
        .or_else(|| tracks.first())
}

/// Join every caption segment into one space-separated string.
/// Returns `None` when the document has no non-empty segments.
pub fn flatten(xml: &str) -> Option<String> {
    let segments: Vec<String> = SEGMENT_RE
        .captures_iter(xml)
        .filter_map(|cap| {
            let raw = cap.get(1)?.as_str();
            // Entities are double-encoded in some tracks (&amp;#39;).
            let text = decode_entities(&decode_entities(raw));
            let text = TAG_RE.replace_all(&text, "");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join(" "))
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
