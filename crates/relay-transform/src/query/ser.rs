//! Serde serializer that captures a value as a [`QueryNode`] tree.
//!
//! Unlike going through `serde_json::Value`, the tree keeps structs and maps
//! apart, so map strategies apply only to real maps and the shape prefix
//! strategy can see struct names.

use serde::ser::{self, Impossible, Serialize};
use thiserror::Error;

/// A value as seen by the query encoder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QueryNode {
    /// `None`, `()` or a unit struct; produces no entries.
    Absent,
    Scalar(String),
    List(Vec<QueryNode>),
    Map(Vec<(String, QueryNode)>),
    Struct {
        shape: &'static str,
        fields: Vec<(&'static str, QueryNode)>,
    },
}

#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct QueryError(String);

impl ser::Error for QueryError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

fn unsupported(what: &str) -> QueryError {
    QueryError(format!("{what} cannot be encoded into a query string"))
}

pub(crate) struct NodeSerializer;

pub(crate) fn to_node<T: Serialize + ?Sized>(value: &T) -> Result<QueryNode, QueryError> {
    value.serialize(NodeSerializer)
}

fn scalar(value: impl ToString) -> Result<QueryNode, QueryError> {
    Ok(QueryNode::Scalar(value.to_string()))
}

impl ser::Serializer for NodeSerializer {
    type Ok = QueryNode;
    type Error = QueryError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = Impossible<QueryNode, QueryError>;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = Impossible<QueryNode, QueryError>;

    fn serialize_bool(self, v: bool) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_u8(self, v: u8) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_f32(self, v: f32) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_f64(self, v: f64) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_char(self, v: char) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_str(self, v: &str) -> Result<QueryNode, QueryError> {
        scalar(v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<QueryNode, QueryError> {
        Err(unsupported("raw bytes"))
    }

    fn serialize_none(self) -> Result<QueryNode, QueryError> {
        Ok(QueryNode::Absent)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<QueryNode, QueryError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<QueryNode, QueryError> {
        Ok(QueryNode::Absent)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<QueryNode, QueryError> {
        Ok(QueryNode::Absent)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<QueryNode, QueryError> {
        scalar(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<QueryNode, QueryError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<QueryNode, QueryError> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, QueryError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or_default()),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, QueryError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, QueryError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, QueryError> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, QueryError> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or_default()),
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<StructBuilder, QueryError> {
        Ok(StructBuilder {
            shape: name,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, QueryError> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }
}

pub(crate) struct SeqBuilder {
    items: Vec<QueryNode>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = QueryNode;
    type Error = QueryError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), QueryError> {
        self.items.push(to_node(value)?);
        Ok(())
    }

    fn end(self) -> Result<QueryNode, QueryError> {
        Ok(QueryNode::List(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = QueryNode;
    type Error = QueryError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), QueryError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<QueryNode, QueryError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = QueryNode;
    type Error = QueryError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), QueryError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<QueryNode, QueryError> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct MapBuilder {
    entries: Vec<(String, QueryNode)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = QueryNode;
    type Error = QueryError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), QueryError> {
        match to_node(key)? {
            QueryNode::Scalar(key) => {
                self.pending_key = Some(key);
                Ok(())
            }
            _ => Err(unsupported("a non-scalar map key")),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), QueryError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| QueryError("map value serialized before its key".to_string()))?;
        self.entries.push((key, to_node(value)?));
        Ok(())
    }

    fn end(self) -> Result<QueryNode, QueryError> {
        Ok(QueryNode::Map(self.entries))
    }
}

pub(crate) struct StructBuilder {
    shape: &'static str,
    fields: Vec<(&'static str, QueryNode)>,
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = QueryNode;
    type Error = QueryError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), QueryError> {
        self.fields.push((key, to_node(value)?));
        Ok(())
    }

    fn end(self) -> Result<QueryNode, QueryError> {
        Ok(QueryNode::Struct {
            shape: self.shape,
            fields: self.fields,
        })
    }
}
