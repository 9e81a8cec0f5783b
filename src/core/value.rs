//! The unit of data flowing through a pipeline.

use std::fmt;

/// An enumerated value with the tags stages attached to it.
///
/// The identity is fixed at creation. Tags can only be appended, so their
/// order is the order in which tagging stages were composed.
///
/// # Examples
///
/// ```rust
/// use fizzpipe::core::Value;
///
/// let value = Value::new(15).with_tag("fizz").with_tag("buzz");
/// assert_eq!(value.to_string(), "fizz buzz");
/// assert_eq!(Value::new(7).to_string(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Value {
    identity: u64,
    tags: Vec<String>,
}

impl Value {
    /// Create an untagged value
    pub fn new(identity: u64) -> Self {
        Self {
            identity,
            tags: Vec::with_capacity(1),
        }
    }

    /// The identity assigned at creation
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// Tags in the order they were appended
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Append a tag
    pub fn push_tag<S: Into<String>>(&mut self, tag: S) {
        self.tags.push(tag.into());
    }

    /// Append a tag, builder style
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.push_tag(tag);
        self
    }

    /// Render as the space-joined tags, or the identity when untagged
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            write!(f, "{}", self.identity)
        } else {
            f.write_str(&self.tags.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_renders_identity() {
        let value = Value::new(42);
        assert!(!value.is_tagged());
        assert_eq!(value.render(), "42");
    }

    #[test]
    fn test_tags_render_space_joined_without_identity() {
        let mut value = Value::new(45);
        value.push_tag("fizz");
        value.push_tag("buzz");
        value.push_tag("bang");

        assert_eq!(value.render(), "fizz buzz bang");
        assert_eq!(value.identity(), 45);
        assert_eq!(value.tags(), ["fizz", "buzz", "bang"]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let value = Value::new(9).with_tag("fizz").with_tag("bang");
        assert_eq!(value.render(), value.render());
        assert_eq!(value.render(), value.to_string());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_shape() {
        let value = Value::new(3).with_tag("fizz");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"identity":3,"tags":["fizz"]}"#);
    }
}
