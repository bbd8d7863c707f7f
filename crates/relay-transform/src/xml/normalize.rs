//! Rewrites response XML so that wrapped lists and key/value maps decode
//! with plain serde derives.
//!
//! With `CollapseListUsingItemTag("member")`:
//!
//! ```text
//! <Items><member>a</member><member>b</member></Items>
//! ```
//!
//! becomes `<Items>a</Items><Items>b</Items>`, which quick-xml reads as a
//! sequence field named `Items`. An element with no content at all is
//! dropped, so an empty list decodes through `#[serde(default)]`. Names
//! listed in `keep_empty` are left in place instead, for empty scalars such
//! as `<Description/>`.
//!
//! With `SeparateEntriesWith { key_tag: "key", value_tag: "value" }`:
//!
//! ```text
//! <Tags><entry><key>env</key><value>prod</value></entry></Tags>
//! ```
//!
//! becomes `<Tags><env>prod</env></Tags>`, which reads as a map.

use super::{ListDecodingStrategy, MapDecodingStrategy};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use relay_core::{ClientError, ClientResult};
use std::borrow::Cow;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> ClientResult<Self> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(malformed)?;
            let value = attribute.unescape_value().map_err(malformed)?;
            attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        })
    }

    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) | Node::CData(_) => None,
        })
    }

    fn has_text(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, Node::Text(_) | Node::CData(_)))
    }

    fn text(&self) -> Option<String> {
        let mut text = String::new();
        for child in &self.children {
            match child {
                Node::Text(value) | Node::CData(value) => text.push_str(value),
                Node::Element(_) => return None,
            }
        }
        Some(text)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|element| element.name == name)
    }
}

fn malformed(error: impl Into<relay_core::BoxError>) -> ClientError {
    ClientError::decoding_with_source("response body is not well-formed XML", error)
}

/// Output of [`normalize`].
#[derive(Debug)]
pub(crate) struct Normalized<'a> {
    pub xml: Cow<'a, str>,
    /// Names of empty elements removed as empty lists.
    pub dropped: BTreeSet<String>,
}

/// Applies the decoding strategies to `xml`.
///
/// Returns the input unchanged when both strategies preserve structure.
/// Empty elements named in `keep_empty` are never treated as empty lists.
pub(crate) fn normalize<'a>(
    xml: &'a str,
    lists: &ListDecodingStrategy,
    maps: &MapDecodingStrategy,
    keep_empty: &BTreeSet<String>,
) -> ClientResult<Normalized<'a>> {
    let unchanged = |xml| Normalized {
        xml,
        dropped: BTreeSet::new(),
    };
    if matches!(lists, ListDecodingStrategy::PreserveStructure)
        && matches!(maps, MapDecodingStrategy::PreserveStructure)
    {
        return Ok(unchanged(Cow::Borrowed(xml)));
    }

    let Some(mut root) = parse(xml)? else {
        return Ok(unchanged(Cow::Borrowed(xml)));
    };
    let mut rewrite = Rewrite {
        lists,
        maps,
        keep_empty,
        dropped: BTreeSet::new(),
    };
    rewrite.children(&mut root);
    Ok(Normalized {
        xml: Cow::Owned(write(&root)?),
        dropped: rewrite.dropped,
    })
}

fn parse(xml: &str) -> ClientResult<Option<Element>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ClientError::decoding("unexpected closing tag in response XML"))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(malformed)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(value.into_owned()));
                }
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::CData(value));
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(ClientError::decoding("response XML ended inside an element"));
    }
    Ok(root)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

struct Rewrite<'s> {
    lists: &'s ListDecodingStrategy,
    maps: &'s MapDecodingStrategy,
    keep_empty: &'s BTreeSet<String>,
    dropped: BTreeSet<String>,
}

impl Rewrite<'_> {
    fn children(&mut self, element: &mut Element) {
        let children = std::mem::take(&mut element.children);
        for child in children {
            let mut child = match child {
                Node::Element(child) => child,
                other => {
                    element.children.push(other);
                    continue;
                }
            };
            self.children(&mut child);

            if let ListDecodingStrategy::CollapseListUsingItemTag(item_tag) = self.lists {
                if let Some(items) = self.collapse_list(&child, item_tag) {
                    element.children.extend(items.into_iter().map(Node::Element));
                    continue;
                }
            }
            if let MapDecodingStrategy::SeparateEntriesWith { key_tag, value_tag } = self.maps {
                if let Some(entries) = flatten_map(&child, key_tag, value_tag) {
                    child.children = entries.into_iter().map(Node::Element).collect();
                }
            }
            element.children.push(Node::Element(child));
        }
    }

    /// Returns the repeated elements that replace a wrapped list, or `None`
    /// if `element` is not one.
    fn collapse_list(&mut self, element: &Element, item_tag: &str) -> Option<Vec<Element>> {
        if element.children.is_empty() {
            if self.keep_empty.contains(&element.name) {
                return None;
            }
            self.dropped.insert(element.name.clone());
            return Some(Vec::new());
        }
        if element.has_text() || element.child_elements().any(|item| item.name != item_tag) {
            return None;
        }
        Some(
            element
                .child_elements()
                .map(|item| Element {
                    name: element.name.clone(),
                    attributes: item.attributes.clone(),
                    children: item.children.clone(),
                })
                .collect(),
        )
    }
}

/// Returns the keyed elements that replace a map's entries, or `None` if
/// `element` is not a map in the expected layout.
fn flatten_map(element: &Element, key_tag: &str, value_tag: &str) -> Option<Vec<Element>> {
    if element.children.is_empty() || element.has_text() {
        return None;
    }
    element
        .child_elements()
        .map(|entry| {
            let key = entry.child(key_tag)?.text()?;
            if !is_xml_name(&key) {
                return None;
            }
            let value = entry.child(value_tag)?;
            Some(Element {
                name: key,
                attributes: Vec::new(),
                children: value.children.clone(),
            })
        })
        .collect()
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn write(root: &Element) -> ClientResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(malformed)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> ClientResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(malformed);
    }

    writer.write_event(Event::Start(start)).map_err(malformed)?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(malformed)?,
            Node::CData(data) => writer
                .write_event(Event::CData(BytesCData::new(data.as_str())))
                .map_err(malformed)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists() -> ListDecodingStrategy {
        ListDecodingStrategy::CollapseListUsingItemTag("member".to_string())
    }

    fn none() -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn maps() -> MapDecodingStrategy {
        MapDecodingStrategy::SeparateEntriesWith {
            key_tag: "key".to_string(),
            value_tag: "value".to_string(),
        }
    }

    #[test]
    fn test_preserve_structure_is_untouched() {
        let xml = "<A>\n  <B>1</B>\n</A>";
        let result = normalize(
            xml,
            &ListDecodingStrategy::PreserveStructure,
            &MapDecodingStrategy::PreserveStructure,
            &BTreeSet::new(),
        )
        .unwrap()
        .xml;
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, xml);
    }

    #[test]
    fn test_collapses_lists() {
        let xml = "<Result><Items><member>a</member><member>b &amp; c</member></Items><Count>2</Count></Result>";
        let result = normalize(
            xml,
            &lists(),
            &MapDecodingStrategy::PreserveStructure,
            &none(),
        )
        .unwrap()
        .xml;
        assert_eq!(
            result,
            "<Result><Items>a</Items><Items>b &amp; c</Items><Count>2</Count></Result>"
        );
    }

    #[test]
    fn test_empty_list_is_dropped() {
        let xml = "<Result><Items/><Count>0</Count></Result>";
        let result = normalize(
            xml,
            &lists(),
            &MapDecodingStrategy::PreserveStructure,
            &none(),
        )
        .unwrap();
        assert_eq!(result.xml, "<Result><Count>0</Count></Result>");
        assert!(result.dropped.contains("Items"));
    }

    #[test]
    fn test_keep_empty_leaves_scalar_in_place() {
        let xml = "<R><Description></Description><Tags><member>a</member></Tags></R>";
        let keep = BTreeSet::from(["Description".to_string()]);
        let result = normalize(
            xml,
            &lists(),
            &MapDecodingStrategy::PreserveStructure,
            &keep,
        )
        .unwrap();
        assert_eq!(result.xml, "<R><Description/><Tags>a</Tags></R>");
        assert!(result.dropped.is_empty());
    }

    #[test]
    fn test_nested_list_items_keep_structure() {
        let xml = "<R><Users><member><Name>ann</Name></member><member><Name>bob</Name></member></Users></R>";
        let result = normalize(
            xml,
            &lists(),
            &MapDecodingStrategy::PreserveStructure,
            &none(),
        )
        .unwrap()
        .xml;
        assert_eq!(
            result,
            "<R><Users><Name>ann</Name></Users><Users><Name>bob</Name></Users></R>"
        );
    }

    #[test]
    fn test_flattens_maps() {
        let xml = "<R><Tags><entry><key>env</key><value>prod</value></entry><entry><key>team</key><value>core</value></entry></Tags></R>";
        let result = normalize(
            xml,
            &ListDecodingStrategy::PreserveStructure,
            &maps(),
            &none(),
        )
        .unwrap()
        .xml;
        assert_eq!(result, "<R><Tags><env>prod</env><team>core</team></Tags></R>");
    }

    #[test]
    fn test_map_with_unusable_key_is_left_alone() {
        let xml = "<R><Tags><entry><key>1 bad</key><value>x</value></entry></Tags></R>";
        let result = normalize(
            xml,
            &ListDecodingStrategy::PreserveStructure,
            &maps(),
            &none(),
        )
        .unwrap()
        .xml;
        assert_eq!(result, xml);
    }

    #[test]
    fn test_malformed_xml() {
        let err = normalize("<R><A></R>", &lists(), &maps(), &none()).unwrap_err();
        assert_eq!(err.kind(), relay_core::ErrorKind::Decoding);
    }
}
