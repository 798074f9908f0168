//! Loosely-typed KEP metadata record.
//!
//! A KEP's metadata arrives as an arbitrary YAML mapping. Before validation it
//! is lowered into a [`Record`]: an ordered list of keys and [`FieldValue`]s
//! that keeps exactly the distinctions the rules care about (null, string,
//! list, anything else) plus enough text to render an error.

use std::fmt;

use serde_yaml::Value;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Present but empty (`key:` or `key: ~`)
    Null,
    String(String),
    List(Vec<FieldValue>),
    /// Any other scalar or a nested mapping.
    Other {
        type_name: &'static str,
        rendered: String,
    },
}

impl FieldValue {
    /// Lower a YAML value.
    pub fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Sequence(items) => FieldValue::List(items.iter().map(Self::from_yaml).collect()),
            Value::Bool(b) => FieldValue::Other {
                type_name: "bool",
                rendered: b.to_string(),
            },
            Value::Number(n) => FieldValue::Other {
                type_name: if n.is_f64() { "float" } else { "int" },
                rendered: n.to_string(),
            },
            Value::Mapping(map) => FieldValue::Other {
                type_name: "map",
                rendered: render_mapping(map),
            },
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::String(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Other { type_name, .. } => type_name,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            FieldValue::Other { rendered, .. } => f.write_str(rendered),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(FieldValue::from).collect())
    }
}

fn render_mapping(map: &serde_yaml::Mapping) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{}: {}", FieldValue::from_yaml(k), FieldValue::from_yaml(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// A metadata key. YAML allows non-string keys; the engine rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Text(String),
    NonText(FieldValue),
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        RecordKey::Text(s.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        RecordKey::Text(s)
    }
}

/// KEP metadata in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    entries: Vec<(RecordKey, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower a YAML document. Returns `None` when the document is not a mapping.
    pub fn from_yaml(value: &Value) -> Option<Self> {
        let map = match value {
            Value::Mapping(map) => map,
            Value::Tagged(tagged) => return Self::from_yaml(&tagged.value),
            _ => return None,
        };
        let entries = map
            .iter()
            .map(|(k, v)| {
                let key = match k {
                    Value::String(s) => RecordKey::Text(s.clone()),
                    other => RecordKey::NonText(FieldValue::from_yaml(other)),
                };
                (key, FieldValue::from_yaml(v))
            })
            .collect();
        Some(Self { entries })
    }

    /// Append an entry (builder pattern).
    pub fn with(mut self, key: impl Into<RecordKey>, value: impl Into<FieldValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Exact, case-sensitive key presence.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find_map(|(k, v)| match k {
            RecordKey::Text(text) if text == key => Some(v),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(RecordKey, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (RecordKey, FieldValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
