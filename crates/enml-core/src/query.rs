//! Element matchers used by tree searches.

use crate::node::Element;

/// Predicate deciding which elements a search returns.
///
/// All comparisons are exact and case-sensitive.
pub enum Matcher {
    /// Match a single tag name
    Tag(String),
    /// Match elements carrying an attribute
    HasAttr(String),
    /// Match elements whose attribute equals a value
    AttrEquals(String, String),
    /// Match a tag whose attribute equals a value
    TagWithAttr {
        tag: String,
        name: String,
        value: String,
    },
    /// Match when the tag name or any attribute name is in the set
    AnyTagOrAttr(Vec<String>),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&Element) -> bool + Send + Sync>),
}

impl Matcher {
    /// Create a matcher for a single tag
    pub fn tag(name: &str) -> Self {
        Matcher::Tag(name.to_string())
    }

    /// Create a matcher for an attribute's presence
    pub fn has_attr(name: &str) -> Self {
        Matcher::HasAttr(name.to_string())
    }

    /// Create a matcher for an attribute value
    pub fn attr_equals(name: &str, value: &str) -> Self {
        Matcher::AttrEquals(name.to_string(), value.to_string())
    }

    /// Create a matcher for a tag with a specific attribute value
    pub fn tag_with_attr(tag: &str, name: &str, value: &str) -> Self {
        Matcher::TagWithAttr {
            tag: tag.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Create a matcher over a set of tag or attribute names
    pub fn any_tag_or_attr(names: &[&str]) -> Self {
        Matcher::AnyTagOrAttr(names.iter().map(|s| s.to_string()).collect())
    }

    /// Create a matcher with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Box::new(f))
    }

    /// Check if this matcher accepts an element
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Matcher::Tag(tag) => element.tag == *tag,
            Matcher::HasAttr(name) => element.has_attr(name),
            Matcher::AttrEquals(name, value) => element.attr(name) == Some(value.as_str()),
            Matcher::TagWithAttr { tag, name, value } => {
                element.tag == *tag && element.attr(name) == Some(value.as_str())
            }
            Matcher::AnyTagOrAttr(names) => {
                names.contains(&element.tag)
                    || element.attributes.keys().any(|key| names.contains(key))
            }
            Matcher::Predicate(f) => f(element),
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Matcher::HasAttr(name) => f.debug_tuple("HasAttr").field(name).finish(),
            Matcher::AttrEquals(name, value) => {
                f.debug_tuple("AttrEquals").field(name).field(value).finish()
            }
            Matcher::TagWithAttr { tag, name, value } => f
                .debug_struct("TagWithAttr")
                .field("tag", tag)
                .field("name", name)
                .field("value", value)
                .finish(),
            Matcher::AnyTagOrAttr(names) => f.debug_tuple("AnyTagOrAttr").field(names).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
