//! Query string encoding.
//!
//! Flattens a serializable query value into ordered `name=value` pairs. The
//! top-level value must be a struct or a map; nested structs, maps and lists
//! are laid out according to the encoder's strategies:
//!
//! | Value                         | Default encoding            |
//! |-------------------------------|-----------------------------|
//! | `tags: vec!["a", "b"]`        | `tags.1=a&tags.2=b`         |
//! | `labels: {"env": "prod"}`     | `labels.env=prod`           |
//! | `filter: Filter { name }`     | `filter.name=...`           |
//!
//! Keys are emitted in sorted order at every level; list indices start at 1.

mod ser;

use relay_core::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use ser::QueryNode;

/// How nested maps are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapEncodingStrategy {
    /// `labels.env=prod`
    #[default]
    SingleQueryEntry,
    /// `labels.1.Key=env&labels.1.Value=prod`
    SeparateQueryEntriesWith {
        /// Name of the key entry.
        key_tag: String,
        /// Name of the value entry.
        value_tag: String,
    },
}

/// How lists are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListEncodingStrategy {
    /// `tags.1=a&tags.2=b`
    #[default]
    CollapseListWithIndex,
    /// `tags.member.1=a&tags.member.2=b`
    ExpandListWithIndexAndItemTag(String),
}

/// How the segments of a nested key are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncodingStrategy {
    /// `filtername`
    NoSeparator,
    /// `filter.name` for `'.'`
    UseAsShapeSeparator(char),
    /// Members of a nested struct are keyed by the struct's type name rather
    /// than the field that holds it: `Filter.name`.
    UseShapePrefix,
}

impl Default for KeyEncodingStrategy {
    fn default() -> Self {
        Self::UseAsShapeSeparator('.')
    }
}

/// Rewrites struct field names before they are used as keys.
///
/// Map keys are data and are never transformed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncodeTransformStrategy {
    /// Field names are used as serialized.
    #[default]
    None,
    /// `maxResults` becomes `MaxResults`.
    CapitalizeFirstCharacter,
    /// A caller-supplied rewrite.
    #[serde(skip)]
    Custom(fn(&str) -> String),
}

impl KeyEncodeTransformStrategy {
    fn apply(self, key: &str) -> String {
        match self {
            Self::None => key.to_string(),
            Self::CapitalizeFirstCharacter => {
                let mut chars = key.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            Self::Custom(transform) => transform(key),
        }
    }
}

/// Flattens query values into name/value pairs.
///
/// # Example
///
/// ```
/// use relay_transform::{QueryEncoder, MapEncodingStrategy};
/// use serde::Serialize;
/// use std::collections::BTreeMap;
///
/// #[derive(Serialize)]
/// struct ListItems {
///     limit: u32,
///     labels: BTreeMap<String, String>,
/// }
///
/// let query = ListItems {
///     limit: 10,
///     labels: BTreeMap::from([("env".to_string(), "prod".to_string())]),
/// };
///
/// let pairs = QueryEncoder::new()
///     .with_map_strategy(MapEncodingStrategy::SeparateQueryEntriesWith {
///         key_tag: "Key".to_string(),
///         value_tag: "Value".to_string(),
///     })
///     .encode(&query)
///     .unwrap();
///
/// assert_eq!(
///     pairs,
///     vec![
///         ("labels.1.Key".to_string(), "env".to_string()),
///         ("labels.1.Value".to_string(), "prod".to_string()),
///         ("limit".to_string(), "10".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryEncoder {
    map_strategy: MapEncodingStrategy,
    list_strategy: ListEncodingStrategy,
    key_strategy: KeyEncodingStrategy,
    key_transform: KeyEncodeTransformStrategy,
}

impl QueryEncoder {
    /// Creates an encoder with the default strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the map strategy.
    #[must_use]
    pub fn with_map_strategy(mut self, strategy: MapEncodingStrategy) -> Self {
        self.map_strategy = strategy;
        self
    }

    /// Sets the list strategy.
    #[must_use]
    pub fn with_list_strategy(mut self, strategy: ListEncodingStrategy) -> Self {
        self.list_strategy = strategy;
        self
    }

    /// Sets the key strategy.
    #[must_use]
    pub const fn with_key_strategy(mut self, strategy: KeyEncodingStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    /// Sets the key transform.
    #[must_use]
    pub const fn with_key_transform(mut self, strategy: KeyEncodeTransformStrategy) -> Self {
        self.key_transform = strategy;
        self
    }

    /// Encodes `value` into query pairs.
    ///
    /// `None` and `()` produce no pairs. A bare scalar or list at the top
    /// level has no key and is rejected with [`ClientError::Encoding`].
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> ClientResult<Vec<(String, String)>> {
        let node = ser::to_node(value)
            .map_err(|e| ClientError::encoding_with_source("query could not be encoded", e))?;

        let mut pairs = Vec::new();
        match node {
            QueryNode::Absent => {}
            QueryNode::Struct { fields, .. } => self.push_fields(&[], fields, &mut pairs),
            QueryNode::Map(entries) => {
                for (key, child) in sorted(entries) {
                    self.flatten(vec![key], child, &mut pairs);
                }
            }
            QueryNode::Scalar(_) | QueryNode::List(_) => {
                return Err(ClientError::encoding(
                    "query must be a struct or a map at the top level",
                ));
            }
        }
        Ok(pairs)
    }

    fn push_fields(
        &self,
        base: &[String],
        fields: Vec<(&'static str, QueryNode)>,
        pairs: &mut Vec<(String, String)>,
    ) {
        let mut fields: Vec<(String, QueryNode)> = fields
            .into_iter()
            .map(|(name, child)| (self.key_transform.apply(name), child))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, child) in fields {
            self.flatten(extend(base, [name]), child, pairs);
        }
    }

    fn flatten(&self, path: Vec<String>, node: QueryNode, pairs: &mut Vec<(String, String)>) {
        match node {
            QueryNode::Absent => {}
            QueryNode::Scalar(value) => pairs.push((self.join(&path), value)),
            QueryNode::List(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    let position = (index + 1).to_string();
                    let item_path = match &self.list_strategy {
                        ListEncodingStrategy::CollapseListWithIndex => extend(&path, [position]),
                        ListEncodingStrategy::ExpandListWithIndexAndItemTag(tag) => {
                            extend(&path, [tag.clone(), position])
                        }
                    };
                    self.flatten(item_path, item, pairs);
                }
            }
            QueryNode::Map(entries) => match &self.map_strategy {
                MapEncodingStrategy::SingleQueryEntry => {
                    for (key, child) in sorted(entries) {
                        self.flatten(extend(&path, [key]), child, pairs);
                    }
                }
                MapEncodingStrategy::SeparateQueryEntriesWith { key_tag, value_tag } => {
                    for (index, (key, child)) in sorted(entries).into_iter().enumerate() {
                        let position = (index + 1).to_string();
                        pairs.push((
                            self.join(&extend(&path, [position.clone(), key_tag.clone()])),
                            key,
                        ));
                        self.flatten(extend(&path, [position, value_tag.clone()]), child, pairs);
                    }
                }
            },
            QueryNode::Struct { shape, fields } => {
                let base = match self.key_strategy {
                    KeyEncodingStrategy::UseShapePrefix => vec![shape.to_string()],
                    _ => path,
                };
                self.push_fields(&base, fields, pairs);
            }
        }
    }

    fn join(&self, path: &[String]) -> String {
        match self.key_strategy {
            KeyEncodingStrategy::NoSeparator => path.concat(),
            KeyEncodingStrategy::UseAsShapeSeparator(separator) => {
                path.join(separator.to_string().as_str())
            }
            KeyEncodingStrategy::UseShapePrefix => path.join("."),
        }
    }
}

fn sorted(mut entries: Vec<(String, QueryNode)>) -> Vec<(String, QueryNode)> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn extend<const N: usize>(path: &[String], segments: [String; N]) -> Vec<String> {
    let mut extended = Vec::with_capacity(path.len() + N);
    extended.extend_from_slice(path);
    extended.extend(segments);
    extended
}
