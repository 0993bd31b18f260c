//! Cache keys: a shader name plus an ordered list of defines.
//!
//! Encoded as `name:define1:define2:...`. Colons are not escaped, so a
//! define containing `:` cannot round-trip through the string form.

use crate::text_utils::{join, split};
use std::fmt;
use std::str::FromStr;

pub const KEY_DELIMITER: &str = ":";

/// Identifies one build variant of a shader.
///
/// Define order is significant: `a:X:Y` and `a:Y:X` are different keys and
/// get separate cache entries. Use [`ShaderKey::normalized`] to collapse them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderKey {
    name: String,
    defines: Vec<String>,
}

impl ShaderKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defines: Vec::new(),
        }
    }

    /// Append a define (`FOO` or `FOO=1`). Empty defines are ignored.
    pub fn with_define(mut self, define: impl Into<String>) -> Self {
        let define = define.into();
        if !define.is_empty() {
            self.defines.push(define);
        }
        self
    }

    pub fn with_defines<I, S>(self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        defines
            .into_iter()
            .fold(self, |key, define| key.with_define(define))
    }

    /// Decode `name:define1:...`.
    ///
    /// The name is the text before the first delimiter; empty define tokens
    /// are dropped, so `basic`, `basic:` and `basic::` are the same key.
    pub fn parse(key: &str) -> Self {
        let mut parts = split(key, KEY_DELIMITER).into_iter();
        let name = parts.next().unwrap_or_default();
        Self::new(name).with_defines(parts)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    /// Copy with defines sorted and deduplicated.
    pub fn normalized(&self) -> Self {
        let mut defines = self.defines.clone();
        defines.sort();
        defines.dedup();
        Self {
            name: self.name.clone(),
            defines,
        }
    }
}

impl fmt::Display for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.name,
            KEY_DELIMITER,
            join(&self.defines, KEY_DELIMITER)
        )
    }
}

impl FromStr for ShaderKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for ShaderKey {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for ShaderKey {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&ShaderKey> for ShaderKey {
    fn from(key: &ShaderKey) -> Self {
        key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_defines() {
        let key = ShaderKey::parse("volume:LIGHTING:NSAMPLES=64");
        assert_eq!(key.name(), "volume");
        assert_eq!(key.defines(), ["LIGHTING", "NSAMPLES=64"]);
    }

    #[test]
    fn test_parse_without_defines() {
        assert_eq!(ShaderKey::parse("basic"), ShaderKey::new("basic"));
        assert_eq!(ShaderKey::parse("basic:"), ShaderKey::new("basic"));
        assert_eq!(ShaderKey::parse("basic::"), ShaderKey::new("basic"));
        assert!(ShaderKey::parse("basic:").defines().is_empty());
    }

    #[test]
    fn test_display_encoding() {
        assert_eq!(ShaderKey::new("basic").to_string(), "basic:");
        let key = ShaderKey::new("iso").with_define("A").with_define("B=2");
        assert_eq!(key.to_string(), "iso:A:B=2");
        assert_eq!(ShaderKey::parse(&key.to_string()), key);
    }

    #[test]
    fn test_define_order_is_significant() {
        let a = ShaderKey::parse("s:X:Y");
        let b = ShaderKey::parse("s:Y:X");
        assert_ne!(a, b);
        assert_eq!(a.normalized(), b.normalized());
    }

    #[test]
    fn test_normalized_dedups() {
        let key = ShaderKey::parse("s:B:A:B");
        assert_eq!(key.normalized().defines(), ["A", "B"]);
    }

    #[test]
    fn test_conversions() {
        let from_str: ShaderKey = "s:A".parse().expect("infallible");
        let from_ref: ShaderKey = "s:A".into();
        let from_owned: ShaderKey = String::from("s:A").into();
        assert_eq!(from_str, from_ref);
        assert_eq!(from_ref, from_owned);
    }
}
