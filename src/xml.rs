//! Normalization of XML API responses.
//!
//! Every API answer is an envelope of the form
//!
//! ```xml
//! <response status="success" code="19">
//!   <msg>optional text, or <line> children</msg>
//!   <result>operation specific tree</result>
//! </response>
//! ```
//!
//! [`parse_response`] turns it into a [`NormalizedResponse`] whose `data` is
//! the `<result>` subtree folded into an [`XmlValue`]:
//!
//! - attributes go under an `"@attributes"` map entry;
//! - child elements become map entries keyed by tag, repeated tags become a
//!   [`XmlValue::List`] in document order;
//! - a text-only leaf collapses to a [`XmlValue::Scalar`]; text next to
//!   attributes or children is kept under `"#text"`;
//! - an element with nothing in it is [`XmlValue::Absent`].
//!
//! The folding is lossy: relative order of differently named siblings,
//! comments and processing instructions are dropped.

use std::collections::BTreeMap;

use log::trace;
use roxmltree::{Document, Node};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::PanosError;

/// Map key holding an element's attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";

/// Map key holding text of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Shared `Absent` value for lookups that need a fallback reference.
pub static ABSENT: XmlValue = XmlValue::Absent;

/// Maximum payload prefix kept in a parse error.
const SNIPPET_CHARS: usize = 500;

/// Structured value produced from an XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum XmlValue {
    /// Empty element.
    #[default]
    Absent,
    /// Text-only leaf.
    Scalar(String),
    /// Repeated same-named siblings.
    List(Vec<XmlValue>),
    /// Element with attributes and/or children.
    Map(BTreeMap<String, XmlValue>),
}

impl XmlValue {
    /// Child value under `key` when this is a map.
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Follows a sequence of map keys.
    pub fn path(&self, keys: &[&str]) -> Option<&XmlValue> {
        keys.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Text of a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlValue::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Text of the scalar child `key`, or `default`.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(XmlValue::as_str).unwrap_or(default)
    }

    /// Attribute `name` from the `"@attributes"` entry.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.path(&[ATTRIBUTES_KEY, name]).and_then(XmlValue::as_str)
    }

    /// Views the value as a list of entries.
    ///
    /// A single element is indistinguishable from a one-item list after
    /// folding, so non-list values are returned as a one-item slice and
    /// `Absent` as an empty one.
    pub fn entries(&self) -> &[XmlValue] {
        match self {
            XmlValue::Absent => &[],
            XmlValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// True for `Absent` and for empty maps, lists or strings.
    pub fn is_empty(&self) -> bool {
        match self {
            XmlValue::Absent => true,
            XmlValue::Scalar(text) => text.is_empty(),
            XmlValue::List(items) => items.is_empty(),
            XmlValue::Map(map) => map.is_empty(),
        }
    }

    fn empty_map() -> Self {
        XmlValue::Map(BTreeMap::new())
    }
}

/// A decoded API response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedResponse {
    /// Root `status` attribute, `"unknown"` when missing.
    pub status: String,
    /// Root `code` attribute.
    pub code: Option<String>,
    /// `status == "success"`.
    pub success: bool,
    /// Text of the first `<msg>` element.
    pub message: Option<String>,
    /// Folded `<result>` subtree; an empty map when there is no `<result>`.
    pub data: XmlValue,
}

impl NormalizedResponse {
    /// Message text, or `default` when the appliance sent none.
    pub fn message_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(default)
    }
}

/// Parses an API response envelope.
pub fn parse_response(xml: &str) -> Result<NormalizedResponse, PanosError> {
    let doc = Document::parse(xml).map_err(|e| PanosError::XmlParse {
        reason: e.to_string(),
        snippet: xml.chars().take(SNIPPET_CHARS).collect(),
    })?;
    let root = doc.root_element();

    let status = root.attribute("status").unwrap_or("unknown").to_string();
    let code = root.attribute("code").map(str::to_string);
    let message = first_descendant(root, "msg").and_then(message_text);
    let data = match first_descendant(root, "result") {
        Some(result) => element_to_value(result),
        None => XmlValue::empty_map(),
    };

    trace!("Parsed response status={} code={:?}", status, code);

    Ok(NormalizedResponse {
        success: status == "success",
        status,
        code,
        message,
        data,
    })
}

/// Folds one element and its subtree into an [`XmlValue`].
pub fn element_to_value(node: Node<'_, '_>) -> XmlValue {
    let mut map = BTreeMap::new();

    let attributes: BTreeMap<String, XmlValue> = node
        .attributes()
        .map(|attr| (attr.name().to_string(), XmlValue::Scalar(attr.value().to_string())))
        .collect();
    if !attributes.is_empty() {
        map.insert(ATTRIBUTES_KEY.to_string(), XmlValue::Map(attributes));
    }

    // A folded element is never a List, so an existing List is a run of siblings.
    for child in node.children().filter(Node::is_element) {
        let tag = child.tag_name().name().to_string();
        let value = element_to_value(child);
        match map.remove(&tag) {
            None => {
                map.insert(tag, value);
            }
            Some(XmlValue::List(mut items)) => {
                items.push(value);
                map.insert(tag, XmlValue::List(items));
            }
            Some(previous) => {
                map.insert(tag, XmlValue::List(vec![previous, value]));
            }
        }
    }

    let text = leading_text(node);
    match (text, map.is_empty()) {
        (Some(text), true) => XmlValue::Scalar(text),
        (Some(text), false) => {
            map.insert(TEXT_KEY.to_string(), XmlValue::Scalar(text));
            XmlValue::Map(map)
        }
        (None, true) => XmlValue::Absent,
        (None, false) => XmlValue::Map(map),
    }
}

/// Trimmed text preceding the first child element, if not blank.
fn leading_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .children()
        .take_while(|c| !c.is_element())
        .filter(Node::is_text)
        .filter_map(|c| c.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn first_descendant<'a, 'input>(
    root: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    root.descendants()
        .skip(1)
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// Direct text of `<msg>`, or its `<line>` descendants joined by newlines.
///
/// Blank direct text is skipped and line texts are trimmed.
fn message_text(msg: Node<'_, '_>) -> Option<String> {
    if let Some(text) = leading_text(msg) {
        return Some(text);
    }
    let lines: Vec<String> = msg
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "line")
        .filter_map(|line| {
            let text: String = line
                .descendants()
                .filter(Node::is_text)
                .filter_map(|t| t.text())
                .collect();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_children_become_ordered_list() {
        let resp = parse_response(r#"<response status="success"><result><a>1</a><a>2</a></result></response>"#)
            .expect("parse");
        assert!(resp.success);
        assert_eq!(
            resp.data.get("a"),
            Some(&XmlValue::List(vec![
                XmlValue::Scalar("1".to_string()),
                XmlValue::Scalar("2".to_string()),
            ]))
        );
    }

    #[test]
    fn three_repeated_children_stay_flat() {
        let resp = parse_response(
            r#"<response status="success"><result><e>1</e><e>2</e><e>3</e></result></response>"#,
        )
        .expect("parse");
        let items = resp.data.get("e").expect("e").entries();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].as_str(), Some("3"));
    }

    #[test]
    fn attributes_text_and_empty_elements() {
        let resp = parse_response(
            r#"<response status="success" code="19"><result>
                 <entry name="0071"><hostname> fw01 </hostname><empty/></entry>
                 <job id="7">queued</job>
               </result></response>"#,
        )
        .expect("parse");
        assert_eq!(resp.code.as_deref(), Some("19"));
        let entry = resp.data.get("entry").expect("entry");
        assert_eq!(entry.attribute("name"), Some("0071"));
        assert_eq!(entry.str_or("hostname", ""), "fw01");
        assert_eq!(entry.get("empty"), Some(&XmlValue::Absent));
        let job = resp.data.get("job").expect("job");
        assert_eq!(job.attribute("id"), Some("7"));
        assert_eq!(job.str_or(TEXT_KEY, ""), "queued");
    }

    #[test]
    fn message_prefers_direct_text_then_lines() {
        let direct = parse_response(r#"<response status="error"><msg>Invalid credentials.</msg></response>"#)
            .expect("parse");
        assert!(!direct.success);
        assert_eq!(direct.message.as_deref(), Some("Invalid credentials."));

        let lines = parse_response(
            r#"<response status="error"><msg>
                 <line>first problem</line>
                 <line><![CDATA[ second problem ]]></line>
                 <line/>
               </msg></response>"#,
        )
        .expect("parse");
        assert_eq!(lines.message.as_deref(), Some("first problem\nsecond problem"));
    }

    #[test]
    fn missing_result_yields_empty_map_and_empty_result_is_absent() {
        let none = parse_response(r#"<response status="success"/>"#).expect("parse");
        assert_eq!(none.data, XmlValue::Map(BTreeMap::new()));
        assert_eq!(none.message, None);

        let empty = parse_response(r#"<response status="success"><result/></response>"#)
            .expect("parse");
        assert_eq!(empty.data, XmlValue::Absent);
    }

    #[test]
    fn success_is_exact_match() {
        let resp = parse_response(r#"<response status="Success"/>"#).expect("parse");
        assert!(!resp.success);
        let resp = parse_response("<response/>").expect("parse");
        assert_eq!(resp.status, "unknown");
        assert!(!resp.success);
    }

    #[test]
    fn malformed_xml_reports_truncated_snippet() {
        let payload = format!("<response status=\"success\"><result>{}", "x".repeat(800));
        let err = parse_response(&payload).expect_err("malformed");
        assert_eq!(err.code(), "XML_PARSE_ERROR");
        match err {
            PanosError::XmlParse { snippet, .. } => assert_eq!(snippet.chars().count(), 500),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn entries_treats_single_value_as_one_item() {
        let single = XmlValue::Scalar("x".to_string());
        assert_eq!(single.entries().len(), 1);
        assert!(XmlValue::Absent.entries().is_empty());
    }

    #[test]
    fn serializes_to_plain_json_shapes() {
        let resp = parse_response(
            r#"<response status="success"><result><a>1</a><a>2</a><b/></result></response>"#,
        )
        .expect("parse");
        let json = serde_json::to_value(&resp.data).expect("serialize");
        assert_eq!(json, serde_json::json!({ "a": ["1", "2"], "b": null }));
    }
}
