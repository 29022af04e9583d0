//! Property lists for Horizon Interact.
//!
//! A [`PropertyList`] is a string-keyed bag of loosely typed values. It is the
//! storage behind data node properties (for example the `"visible"` flag the
//! default event filter looks at) and behind the free-form `<param>` entries of
//! an event configuration.
//!
//! # Example
//!
//! ```
//! use horizon_interact_core::property::{PropertyList, PropertyValue};
//!
//! let mut props = PropertyList::new();
//! props.set("visible", true);
//! props.set("closing_distance", "4.5");
//!
//! assert_eq!(props.get_bool("visible"), Some(true));
//! // String values are parsed on typed access.
//! assert_eq!(props.get_float("closing_distance"), Some(4.5));
//! assert_eq!(props.get("missing"), None::<&PropertyValue>);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A single loosely typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Free-form text.
    String(String),
}

impl PropertyValue {
    /// Name of the stored type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Interpret the value as a boolean.
    ///
    /// Strings `"true"`/`"false"` (any case) and `"1"`/`"0"` are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Float(_) => None,
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// Interpret the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            Self::Float(_) => None,
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret the value as a float. Integers widen, strings are parsed.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Bool(_) => None,
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Borrow the value as text if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A string-keyed collection of [`PropertyValue`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyList {
    entries: HashMap<String, PropertyValue>,
}

impl PropertyList {
    /// Create an empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Get a property value.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    /// Remove a property, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.entries.remove(name)
    }

    /// Check whether a property is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Property names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over all `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove all properties.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy every property of `other` into this list. Values from `other` win.
    pub fn merge(&mut self, other: &PropertyList) {
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    /// Get a property as a boolean, see [`PropertyValue::as_bool`].
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropertyValue::as_bool)
    }

    /// Get a property as an integer, see [`PropertyValue::as_int`].
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_int)
    }

    /// Get a property as a float, see [`PropertyValue::as_float`].
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropertyValue::as_float)
    }

    /// Get a property as text. Non-string values are formatted.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }

    /// Get a property that must be stored as a real boolean.
    ///
    /// Unlike [`get_bool`](Self::get_bool) no coercion takes place.
    pub fn try_get_bool(&self, name: &str) -> CoreResult<bool> {
        match self.get(name) {
            Some(PropertyValue::Bool(b)) => Ok(*b),
            Some(other) => Err(CoreError::PropertyTypeMismatch {
                name: name.to_string(),
                expected: "bool",
                got: other.type_name(),
            }),
            None => Err(CoreError::PropertyNotFound(name.to_string())),
        }
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (name, value) in iter {
            list.set(name, value);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces() {
        let mut props = PropertyList::new();
        props.set("layer", 1);
        props.set("layer", 7);
        assert_eq!(props.len(), 1);
        assert_eq!(props.get_int("layer"), Some(7));
    }

    #[test]
    fn test_coercion() {
        let props: PropertyList = [("a", "TRUE"), ("b", "12"), ("c", "x")].into_iter().collect();
        assert_eq!(props.get_bool("a"), Some(true));
        assert_eq!(props.get_int("b"), Some(12));
        assert_eq!(props.get_float("b"), Some(12.0));
        assert_eq!(props.get_int("c"), None);
        assert_eq!(props.get_string("b").as_deref(), Some("12"));
    }

    #[test]
    fn test_try_get_bool_is_strict() {
        let mut props = PropertyList::new();
        props.set("visible", "true");
        assert_eq!(
            props.try_get_bool("visible"),
            Err(CoreError::PropertyTypeMismatch {
                name: "visible".into(),
                expected: "bool",
                got: "string",
            })
        );
        assert_eq!(
            props.try_get_bool("hidden"),
            Err(CoreError::PropertyNotFound("hidden".into()))
        );

        props.set("visible", false);
        assert_eq!(props.try_get_bool("visible"), Ok(false));
    }

    #[test]
    fn test_merge_other_wins() {
        let mut base = PropertyList::new();
        base.set("step", 1);
        base.set("name", "base");

        let mut overlay = PropertyList::new();
        overlay.set("step", 3);

        base.merge(&overlay);
        assert_eq!(base.get_int("step"), Some(3));
        assert_eq!(base.get_string("name").as_deref(), Some("base"));
        assert_eq!(base.names(), vec!["name", "step"]);
    }
}
