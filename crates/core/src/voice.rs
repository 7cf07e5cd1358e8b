//! Voice selection vocabulary
//!
//! The reference catalog tags every sample with four categorical attributes.
//! Parsing is case-insensitive; unknown values are input errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

macro_rules! voice_attribute {
    ($(#[$meta:meta])* $name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InputError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(InputError::InvalidFilter {
                        field: $field,
                        value: s.to_string(),
                        allowed: Self::ALL,
                    }),
                }
            }
        }
    };
}

voice_attribute!(
    /// Speaker gender
    Gender, "gender", {
        Male => "male",
        Female => "female",
    }
);

voice_attribute!(
    /// Speaking style of the recording
    Group, "group", {
        Story => "story",
        News => "news",
        Audiobook => "audiobook",
        Interview => "interview",
        Review => "review",
    }
);

voice_attribute!(
    /// Regional accent
    Area, "area", {
        Northern => "northern",
        Southern => "southern",
        Central => "central",
    }
);

voice_attribute!(
    Emotion, "emotion", {
        Neutral => "neutral",
        Serious => "serious",
        Monotone => "monotone",
        Sad => "sad",
        Surprised => "surprised",
        Happy => "happy",
        Angry => "angry",
    }
);

/// Optional criteria for picking a reference sample
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceFilter {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub group: Option<Group>,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(default)]
    pub emotion: Option<Emotion>,
}

impl VoiceFilter {
    /// Build from loosely-typed strings, e.g. CLI or query parameters
    pub fn parse(
        gender: Option<&str>,
        group: Option<&str>,
        area: Option<&str>,
        emotion: Option<&str>,
    ) -> Result<Self, InputError> {
        Ok(Self {
            gender: gender.map(str::parse).transpose()?,
            group: group.map(str::parse).transpose()?,
            area: area.map(str::parse).transpose()?,
            emotion: emotion.map(str::parse).transpose()?,
        })
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = Some(emotion);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && self.group.is_none() && self.area.is_none() && self.emotion.is_none()
    }
}

impl fmt::Display for VoiceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(g) = self.gender {
            parts.push(format!("gender={}", g));
        }
        if let Some(g) = self.group {
            parts.push(format!("group={}", g));
        }
        if let Some(a) = self.area {
            parts.push(format!("area={}", a));
        }
        if let Some(e) = self.emotion {
            parts.push(format!("emotion={}", e));
        }
        if parts.is_empty() {
            f.write_str("any")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" NEWS ".parse::<Group>().unwrap(), Group::News);
        assert_eq!("southern".parse::<Area>().unwrap(), Area::Southern);
    }

    #[test]
    fn test_invalid_value() {
        let err = "robot".parse::<Emotion>().unwrap_err();
        match err {
            InputError::InvalidFilter { field, value, allowed } => {
                assert_eq!(field, "emotion");
                assert_eq!(value, "robot");
                assert_eq!(allowed.len(), 7);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_filter_parse() {
        let filter = VoiceFilter::parse(Some("male"), None, Some("central"), None).unwrap();
        assert_eq!(filter.gender, Some(Gender::Male));
        assert_eq!(filter.area, Some(Area::Central));
        assert!(filter.group.is_none());
        assert_eq!(filter.to_string(), "gender=male, area=central");

        assert!(VoiceFilter::parse(None, Some("podcast"), None, None).is_err());
    }

    #[test]
    fn test_empty_filter() {
        let filter = VoiceFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "any");
        assert!(!filter.with_emotion(Emotion::Sad).is_empty());
    }

    #[test]
    fn test_serde_lowercase() {
        let filter: VoiceFilter = serde_yaml::from_str("gender: female\nemotion: happy\n").unwrap();
        assert_eq!(filter.gender, Some(Gender::Female));
        assert_eq!(filter.emotion, Some(Emotion::Happy));
        assert_eq!(serde_json::to_string(&Group::Audiobook).unwrap(), "\"audiobook\"");
    }
}
