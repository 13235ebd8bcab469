// Inline formatting models
// Positions are stored as "<line>.<column>" strings (line from 1, column from 0)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decoration kind - one of three flat, non-nested tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Bold,
    Italic,
    Underline,
}

impl FormatTag {
    /// Capture order
    pub const ALL: [FormatTag; 3] = [FormatTag::Bold, FormatTag::Italic, FormatTag::Underline];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
        }
    }

    pub fn fromName(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "underline" => Some(Self::Underline),
            _ => None,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Line/column address inside note content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextPos {
    pub line: usize,
    pub column: usize,
}

impl TextPos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// First character of the content
    pub fn start() -> Self {
        Self { line: 1, column: 0 }
    }
}

impl fmt::Display for TextPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.column)
    }
}

impl FromStr for TextPos {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .split_once('.')
            .ok_or_else(|| format!("position '{}' is not in <line>.<column> form", s))?;
        let line: usize = line
            .parse()
            .map_err(|_| format!("position '{}' has an invalid line", s))?;
        let column: usize = column
            .parse()
            .map_err(|_| format!("position '{}' has an invalid column", s))?;
        if line == 0 {
            return Err(format!("position '{}' has line 0; lines start at 1", s));
        }
        Ok(Self { line, column })
    }
}

impl Serialize for TextPos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TextPos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One contiguous decoration, field order matches the stored JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRange {
    pub start: TextPos,
    pub end: TextPos,
    pub tag: FormatTag,
}

impl FormatRange {
    pub fn new(tag: FormatTag, start: TextPos, end: TextPos) -> Self {
        Self { start, end, tag }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        assert_eq!("1.0".parse::<TextPos>().unwrap(), TextPos::new(1, 0));
        assert_eq!("12.34".parse::<TextPos>().unwrap(), TextPos::new(12, 34));
        assert!("0.3".parse::<TextPos>().is_err());
        assert!("1".parse::<TextPos>().is_err());
        assert!("end".parse::<TextPos>().is_err());
        assert!("1.x".parse::<TextPos>().is_err());
    }

    #[test]
    fn test_range_json_shape() {
        let range = FormatRange::new(FormatTag::Bold, TextPos::new(1, 0), TextPos::new(1, 4));
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#"{"start":"1.0","end":"1.4","tag":"bold"}"#);

        let back: FormatRange = serde_json::from_str(r#"{"start":"2.1","end":"3.0","tag":"underline"}"#).unwrap();
        assert_eq!(back.tag, FormatTag::Underline);
        assert_eq!(back.end, TextPos::new(3, 0));
    }

    #[test]
    fn test_tag_names() {
        for tag in FormatTag::ALL {
            assert_eq!(FormatTag::fromName(tag.name()), Some(tag));
        }
        assert_eq!(FormatTag::fromName("BOLD"), Some(FormatTag::Bold));
        assert_eq!(FormatTag::fromName("strike"), None);
        assert_eq!(TextPos::start().to_string(), "1.0");
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let result = serde_json::from_str::<FormatRange>(r#"{"start":"1.0","end":"1.1","tag":"strike"}"#);
        assert!(result.is_err());
    }
}
