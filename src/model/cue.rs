use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A named presentation unit. Serializes flat as `{id, name, type, value}`
/// to stay wire-compatible with the admin and audience clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub payload: CuePayload,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CueKind {
    Color,
    Animation,
}

/// The cue's display payload. `Color` carries a `#RRGGBB` hex string,
/// `Animation` a URL to the animation resource. The kind/value pairing is
/// enforced at construction via [`CuePayload::new`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CuePayload {
    Color(String),
    Animation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CueError {
    #[error("invalid color value '{0}': expected '#RRGGBB'")]
    InvalidColor(String),
    #[error("invalid animation value '{0}': expected a URL or absolute path")]
    InvalidAnimation(String),
}

impl CuePayload {
    pub fn new(kind: CueKind, value: String) -> Result<Self, CueError> {
        match kind {
            CueKind::Color => {
                if is_hex_color(&value) {
                    Ok(CuePayload::Color(value))
                } else {
                    Err(CueError::InvalidColor(value))
                }
            }
            CueKind::Animation => {
                if is_animation_ref(&value) {
                    Ok(CuePayload::Animation(value))
                } else {
                    Err(CueError::InvalidAnimation(value))
                }
            }
        }
    }

    pub fn kind(&self) -> CueKind {
        match self {
            CuePayload::Color(_) => CueKind::Color,
            CuePayload::Animation(_) => CueKind::Animation,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            CuePayload::Color(value) | CuePayload::Animation(value) => value,
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_animation_ref(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/')
}

/// Client-supplied cue fields, used for both create and update. The update
/// contract is a full-field replacement, not a partial patch.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CueDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CueKind,
    pub value: String,
}

impl CueDraft {
    pub fn into_parts(self) -> Result<(String, CuePayload), CueError> {
        let payload = CuePayload::new(self.kind, self.value)?;
        Ok((self.name, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_payload_requires_hex() {
        assert_eq!(
            CuePayload::new(CueKind::Color, "#ff0000".to_string()),
            Ok(CuePayload::Color("#ff0000".to_string()))
        );
        assert!(CuePayload::new(CueKind::Color, "#ff00".to_string()).is_err());
        assert!(CuePayload::new(CueKind::Color, "ff0000".to_string()).is_err());
        assert!(CuePayload::new(CueKind::Color, "#gg0000".to_string()).is_err());
    }

    #[test]
    fn animation_payload_requires_reference() {
        assert!(
            CuePayload::new(CueKind::Animation, "https://example.com/a.json".to_string()).is_ok()
        );
        assert!(CuePayload::new(CueKind::Animation, "/animations/a.json".to_string()).is_ok());
        assert!(CuePayload::new(CueKind::Animation, "not a url".to_string()).is_err());
    }

    #[test]
    fn cue_serializes_flat() {
        let cue = Cue {
            id: Uuid::nil(),
            name: "Red".to_string(),
            payload: CuePayload::Color("#ff0000".to_string()),
        };

        let json = serde_json::to_value(&cue).unwrap();
        assert_eq!(json["name"], "Red");
        assert_eq!(json["type"], "color");
        assert_eq!(json["value"], "#ff0000");

        let back: Cue = serde_json::from_value(json).unwrap();
        assert_eq!(back, cue);
    }
}
