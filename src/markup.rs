//! Markup tree used for persistence.
//!
//! A document is a tree of named elements carrying string attributes. Numbers
//! are stored in their shortest round-trip text form, so geometry survives a
//! save/load cycle bit for bit. Trees are written to disk as JSON; an XML
//! rendering is available for interchange.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PanelError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn set_attr_u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.set_attr(name, value.to_string())
    }

    pub fn set_attr_f32(&mut self, name: &str, value: f32) -> &mut Self {
        self.set_attr(name, value.to_string())
    }

    pub fn set_attr_bool(&mut self, name: &str, value: bool) -> &mut Self {
        self.set_attr(name, if value { "1" } else { "0" })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attr_u32(&self, name: &str) -> Option<u32> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn attr_f32(&self, name: &str) -> Option<f32> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attr(name).and_then(parse_bool)
    }

    pub fn require_u32(&self, name: &str) -> Result<u32> {
        let raw = self.require(name)?;
        raw.trim().parse().map_err(|_| self.invalid(name, raw))
    }

    pub fn require_f32(&self, name: &str) -> Result<f32> {
        let raw = self.require(name)?;
        raw.trim().parse().map_err(|_| self.invalid(name, raw))
    }

    pub fn require_bool(&self, name: &str) -> Result<bool> {
        let raw = self.require(name)?;
        parse_bool(raw).ok_or_else(|| self.invalid(name, raw))
    }

    fn require(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| PanelError::MissingAttribute {
            element: self.tag.clone(),
            attribute: name.to_string(),
        })
    }

    fn invalid(&self, name: &str, raw: &str) -> PanelError {
        PanelError::InvalidAttribute {
            element: self.tag.clone(),
            attribute: name.to_string(),
            value: raw.to_string(),
        }
    }

    /// Append `child` and return a reference to it in place.
    pub fn push_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Fails with `UnexpectedElement` unless this element is tagged `expected`.
    pub fn expect_tag(&self, expected: &str) -> Result<()> {
        if self.tag == expected {
            Ok(())
        } else {
            Err(PanelError::UnexpectedElement {
                expected: expected.to_string(),
                found: self.tag.clone(),
            })
        }
    }

    pub fn to_json_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json_value(v: Value) -> Result<Element> {
        Ok(serde_json::from_value(v)?)
    }

    pub fn from_json_str(s: &str) -> Result<Element> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_xml_string(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?>\n");
        write_xml(&mut xml, self, 0);
        xml
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn write_xml(out: &mut String, e: &Element, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{}<{}", indent, xml_escape(&e.tag)));
    for (k, v) in &e.attributes {
        out.push_str(&format!(" {}=\"{}\"", xml_escape(k), xml_escape(v)));
    }
    if e.children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    for c in &e.children {
        write_xml(out, c, depth + 1);
    }
    out.push_str(&format!("{}</{}>\n", indent, xml_escape(&e.tag)));
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
