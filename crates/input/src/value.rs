//! Request input values.
//!
//! Every source of request input (query string, form body, cookies, server
//! variables, uploaded files) is represented as an [`InputMap`]. Values are
//! either plain strings or, for bracket style parameters such as
//! `user[name]=zava` or `tags[]=a&tags[]=b`, nested maps and lists.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A string keyed map of request input values.
pub type InputMap = HashMap<String, InputValue>;

/// A single input value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Str(String),
    List(Vec<InputValue>),
    Map(InputMap),
}

impl InputValue {
    /// Returns the string content, or `None` for lists and maps.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InputValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&InputMap> {
        match self {
            InputValue::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[InputValue]> {
        match self {
            InputValue::List(list) => Some(list.as_slice()),
            _ => None,
        }
    }

    /// Steps one level down: a key for maps, an index for lists.
    fn child(&self, segment: &str) -> Option<&InputValue> {
        match self {
            InputValue::Map(map) => map.get(segment),
            InputValue::List(list) => segment.parse::<usize>().ok().and_then(|index| list.get(index)),
            InputValue::Str(_) => None,
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Str(value.to_owned())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Str(value)
    }
}

impl From<InputMap> for InputValue {
    fn from(value: InputMap) -> Self {
        InputValue::Map(value)
    }
}

impl From<Vec<InputValue>> for InputValue {
    fn from(value: Vec<InputValue>) -> Self {
        InputValue::List(value)
    }
}

impl PartialEq<str> for InputValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for InputValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Looks up `key` in `map`, treating dots as path separators.
///
/// An exact key match wins, so `a.b` stored literally is still reachable.
/// Otherwise `user.name` walks into nested maps and `tags.1` indexes lists.
pub fn lookup<'a>(map: &'a InputMap, key: &str) -> Option<&'a InputValue> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }

    let mut segments = key.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = current.child(segment)?;
    }
    Some(current)
}

/// Shallow merge, values from `other` replace existing entries.
pub(crate) fn merge_into(target: &mut InputMap, other: &InputMap) {
    target.extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
}
