//! Access
//!
//! Admin capabilities as a flat set of permission tags such as
//! `"products.create"`. The storefront reports them as nested boolean records;
//! only `true` leaves become tags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between nesting levels in a permission tag.
pub const TAG_SEPARATOR: char = '.';

/// A set of granted permission tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    tags: BTreeSet<String>,
}

impl PermissionSet {
    /// Flatten a nested boolean record into tags.
    ///
    /// `{"products": {"create": true, "delete": false}, "orders": true}` yields
    /// `orders` and `products.create`. Non-boolean leaves are ignored.
    pub fn from_nested(record: &Value) -> Self {
        let mut set = Self::default();
        set.collect(String::new(), record);
        set
    }

    /// Whether `tag` is granted.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether every tag in `tags` is granted.
    pub fn contains_all<'t>(&self, tags: impl IntoIterator<Item = &'t str>) -> bool {
        tags.into_iter().all(|tag| self.contains(tag))
    }

    /// Grant `tag`; returns `false` if it was already granted.
    pub fn grant(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Revoke `tag`; returns `false` if it was not granted.
    pub fn revoke(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Granted tags in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of granted tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether nothing is granted.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    fn collect(&mut self, prefix: String, value: &Value) {
        match value {
            Value::Bool(true) if !prefix.is_empty() => {
                self.tags.insert(prefix);
            }
            Value::Object(fields) => {
                for (key, nested) in fields {
                    let tag = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}{TAG_SEPARATOR}{key}")
                    };

                    self.collect(tag, nested);
                }
            }
            _ => {}
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
