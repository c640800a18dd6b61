use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// A parsed command. Built once per raw text command, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "intent")]
pub enum Intent {
    Navigate { bar: u32 },
    SelectTrack { target: TrackTarget },
    ReplaceRegion,
    ImportMidi { path: String },
    NewTrack,
    SetTempo { bpm: u32 },
    SetKey { key: String },
    Playback { action: PlaybackAction },
    Help,
    Unknown { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackTarget {
    Index(u32),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackAction {
    Start,
    Stop,
}

/// Keyword-based parse over a lower-cased copy of the input. Rules are
/// evaluated top to bottom and the first rule whose keywords are all
/// present wins, so inputs matching several rules resolve
/// deterministically to the earliest one. Keywords match whole words,
/// not substrings: "stop playing" stops, "tracks" does not satisfy
/// "track".
///
/// Free-text parameters (track name, file path) are taken as the last
/// whitespace-delimited token of the command, excluding the rule's own
/// keywords. Known limitation: only the final word of a multi-word
/// name or path is captured.
pub fn parse(text: &str) -> Result<Intent, EngineError> {
    let lower = text.to_ascii_lowercase();
    let has = |kw: &str| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == kw)
    };

    if (has("go") && has("bar")) || has("navigate") {
        let bar = first_number(&lower).ok_or(EngineError::ParameterMissing("bar"))?;
        return Ok(Intent::Navigate { bar });
    }

    if has("select") && has("track") {
        let target = match first_number(&lower) {
            Some(index) => TrackTarget::Index(index),
            None => {
                let name = last_token(text)
                    .filter(|t| !is_keyword(t, &["select", "track"]))
                    .ok_or(EngineError::ParameterMissing("track"))?;
                TrackTarget::Name(name)
            }
        };
        return Ok(Intent::SelectTrack { target });
    }

    if has("replace") && has("region") {
        return Ok(Intent::ReplaceRegion);
    }

    if has("import") && has("midi") {
        let path = last_token(text)
            .filter(|t| !is_keyword(t, &["import", "midi", "file"]))
            .ok_or(EngineError::ParameterMissing("file"))?;
        return Ok(Intent::ImportMidi { path });
    }

    if has("new") && has("track") {
        return Ok(Intent::NewTrack);
    }

    if has("tempo") {
        let bpm = first_number(&lower).ok_or(EngineError::ParameterMissing("tempo"))?;
        return Ok(Intent::SetTempo { bpm });
    }

    if has("key") {
        return Ok(Intent::SetKey {
            key: key_name(text, &lower),
        });
    }

    if has("play") {
        return Ok(Intent::Playback {
            action: PlaybackAction::Start,
        });
    }

    if has("stop") {
        return Ok(Intent::Playback {
            action: PlaybackAction::Stop,
        });
    }

    if has("help") {
        return Ok(Intent::Help);
    }

    Ok(Intent::Unknown {
        text: text.to_string(),
    })
}

/// First run of ASCII digits anywhere in the text.
fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn last_token(text: &str) -> Option<String> {
    text.split_whitespace().last().map(str::to_string)
}

/// True when the token is one of the rule's own keywords, meaning no
/// actual parameter followed them.
fn is_keyword(token: &str, keywords: &[&str]) -> bool {
    let lower = token.to_ascii_lowercase();
    keywords.iter().any(|kw| lower == *kw)
}

/// Everything after the "key" keyword, in the original casing. The
/// source substitutes a hard-coded "A minor" when no key is named; that
/// default is preserved here.
fn key_name(text: &str, lower: &str) -> String {
    let rest = lower
        .find("key")
        .map(|pos| text[pos + "key".len()..].trim())
        .unwrap_or("");
    if rest.is_empty() {
        "A minor".to_string()
    } else {
        rest.to_string()
    }
}
