/*!
 * ASS (Advanced SubStation Alpha) rendering.
 *
 * A rendered file is made of a fixed `[Script Info]` block, a `[V4+ Styles]`
 * table with one style per speaker, and an `[Events]` table with one
 * `Dialogue` line per cue. Cues keep their input order.
 */

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::segment::{TranslatedCue, UNKNOWN_SPEAKER};
use super::timestamp::to_timestamp;

/// Colour used for speakers missing from the lookup table (gray)
pub const FALLBACK_COLOR: &str = "&H00C0C0C0";

/// Speaker colours in ASS `&HAABBGGRR` notation
const SPEAKER_COLORS: &[(&str, &str)] = &[
    ("SPEAKER_00", "&H00FFFFFF"), // white
    ("SPEAKER_01", "&H0000FFFF"), // yellow
    ("SPEAKER_02", "&H00FF8080"), // light blue
    ("SPEAKER_03", "&H008000FF"), // orange
    (UNKNOWN_SPEAKER, FALLBACK_COLOR),
];

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENTS_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Header and style settings of a rendered file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssOptions {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_font_name")]
    pub font_name: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_play_res_x")]
    pub play_res_x: u32,
    #[serde(default = "default_play_res_y")]
    pub play_res_y: u32,
}

impl Default for AssOptions {
    fn default() -> Self {
        Self {
            title: default_title(),
            font_name: default_font_name(),
            font_size: default_font_size(),
            play_res_x: default_play_res_x(),
            play_res_y: default_play_res_y(),
        }
    }
}

fn default_title() -> String {
    "Generated Subtitles".to_string()
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    48
}

fn default_play_res_x() -> u32 {
    1920
}

fn default_play_res_y() -> u32 {
    1080
}

/// Looks up the colour of a speaker, falling back to gray
pub fn speaker_color(speaker: &str) -> &'static str {
    SPEAKER_COLORS
        .iter()
        .find(|(name, _)| *name == speaker)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

/// Speaker label to colour bindings, in render order.
///
/// Always ends up containing the `UNKNOWN` style.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerStyleTable {
    entries: Vec<(String, &'static str)>,
}

impl SpeakerStyleTable {
    /// Builds the table for the distinct speakers of `cues`, sorted by label
    pub fn from_cues(cues: &[TranslatedCue]) -> Self {
        let speakers: BTreeSet<&str> = cues.iter().map(|cue| cue.speaker.as_str()).collect();
        Self::from_speakers(speakers)
    }

    /// Builds the table for the given labels, keeping their order
    pub fn from_speakers<'a>(speakers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries: Vec<(String, &'static str)> = speakers
            .into_iter()
            .map(|speaker| (speaker.to_string(), speaker_color(speaker)))
            .collect();

        if !entries.iter().any(|(name, _)| name == UNKNOWN_SPEAKER) {
            entries.push((UNKNOWN_SPEAKER.to_string(), FALLBACK_COLOR));
        }

        Self { entries }
    }

    pub fn color_of(&self, speaker: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(name, _)| name == speaker)
            .map(|(_, color)| *color)
    }

    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders one `Style:` line per entry
    pub fn render(&self, options: &AssOptions) -> String {
        self.entries
            .iter()
            .map(|(name, color)| style_line(name, color, options))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn style_line(name: &str, color: &str, options: &AssOptions) -> String {
    format!(
        "Style: {},{},{},{},&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,10,10,10,1",
        name, options.font_name, options.font_size, color
    )
}

/// Escapes newlines and override-tag braces
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => escaped.push_str("\\N"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Text field of a dialogue line: the original, then the translation on a
/// second line when there is one
pub fn cue_text(cue: &TranslatedCue, include_translation: bool) -> String {
    if include_translation && !cue.translation.is_empty() {
        format!("{}\\N{}", escape_text(&cue.text), escape_text(&cue.translation))
    } else {
        escape_text(&cue.text)
    }
}

/// Formats one `Dialogue:` event line
pub fn dialogue_line(start: f64, end: f64, speaker: &str, text: &str) -> String {
    format!(
        "Dialogue: 0,{},{},{},,0,0,0,,{}",
        to_timestamp(start),
        to_timestamp(end),
        speaker,
        text
    )
}

fn header(options: &AssOptions) -> String {
    format!(
        "[Script Info]\n\
         Title: {}\n\
         ScriptType: v4.00+\n\
         PlayResX: {}\n\
         PlayResY: {}\n\
         WrapStyle: 0\n\
         \n\
         [V4+ Styles]\n\
         {}\n",
        options.title, options.play_res_x, options.play_res_y, STYLE_FORMAT
    )
}

/// Renders a complete ASS file with default options
pub fn render(cues: &[TranslatedCue], include_translation: bool) -> Result<String, SubtitleError> {
    render_with_options(cues, include_translation, &AssOptions::default())
}

/// Renders a complete ASS file
pub fn render_with_options(
    cues: &[TranslatedCue],
    include_translation: bool,
    options: &AssOptions,
) -> Result<String, SubtitleError> {
    if cues.is_empty() {
        return Err(SubtitleError::EmptyInput);
    }

    let styles = SpeakerStyleTable::from_cues(cues);

    let mut content = header(options);
    content.push_str(&styles.render(options));
    content.push_str("\n\n[Events]\n");
    content.push_str(EVENTS_FORMAT);
    content.push('\n');

    for (idx, cue) in cues.iter().enumerate() {
        let text = cue_text(cue, include_translation);
        if include_translation && text.is_empty() {
            debug!("Skipping cue {} with empty text at {}", idx + 1, to_timestamp(cue.start));
            continue;
        }
        // Writing to a String cannot fail
        let _ = writeln!(content, "{}", dialogue_line(cue.start, cue.end, &cue.speaker, &text));
    }

    Ok(content)
}

/// Renders and writes an ASS file, replacing any existing file
pub fn write_ass<P: AsRef<Path>>(
    cues: &[TranslatedCue],
    path: P,
    include_translation: bool,
    options: &AssOptions,
) -> Result<PathBuf, SubtitleError> {
    let path = path.as_ref();
    let content = render_with_options(cues, include_translation, options)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;

    Ok(path.to_path_buf())
}
