use std::fmt;

use serde::{Deserialize, Serialize};

/// A value held in an attribute set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keeps_the_variant() {
        let parse = |json: &str| serde_json::from_str::<AttrValue>(json);
        assert_eq!(parse("\"x\"").unwrap(), AttrValue::from("x"));
        assert_eq!(parse("7").unwrap(), AttrValue::Int(7));
        assert_eq!(parse("1.5").unwrap(), AttrValue::Float(1.5));
        assert_eq!(parse("true").unwrap(), AttrValue::Bool(true));
        assert!(parse("[1]").is_err());
        assert_eq!(serde_json::to_string(&AttrValue::from("x")).unwrap(), "\"x\"");
    }

    #[test]
    fn display_is_unquoted() {
        assert_eq!(AttrValue::from("Sensor data").to_string(), "Sensor data");
        assert_eq!(AttrValue::Int(-3).to_string(), "-3");
    }

    #[test]
    fn accessors() {
        assert_eq!(AttrValue::from("a").as_str(), Some("a"));
        assert_eq!(AttrValue::Int(1).as_str(), None);
        assert_eq!(AttrValue::Int(1).as_int(), Some(1));
    }
}
