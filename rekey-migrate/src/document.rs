//! Userstore configuration documents.
//!
//! Only the direct children of the root element are inspected. A child is a
//! secret field when its `name` attribute is `password` or
//! `ConnectionPassword`; it is eligible for migration when its `encrypted`
//! attribute is exactly `true`.
//!
//! Replacement values are spliced into the original text, so everything
//! outside a replaced field's content stays byte-identical.

use crate::error::{TransformError, TransformResult};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

/// The closed set of secret field names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretName {
    Password,
    ConnectionPassword,
}

impl SecretName {
    fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "password" => Some(SecretName::Password),
            "ConnectionPassword" => Some(SecretName::ConnectionPassword),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretName::Password => "password",
            SecretName::ConnectionPassword => "ConnectionPassword",
        }
    }
}

/// A secret field located in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretField {
    /// Tag of the element, e.g. `Property`.
    pub element_name: String,
    pub name: SecretName,
    pub is_encrypted_flag: bool,
    /// Unescaped text content.
    pub raw_value: String,
    span: Range<usize>,
}

impl SecretField {
    pub fn is_eligible(&self) -> bool {
        self.is_encrypted_flag
    }
}

/// An in-memory configuration document with pending replacements.
#[derive(Debug)]
pub struct ConfigDocument {
    source: String,
    fields: Vec<SecretField>,
    replacements: Vec<Option<String>>,
}

struct OpenField {
    element_name: String,
    name: SecretName,
    is_encrypted_flag: bool,
    text: String,
    content_start: usize,
}

fn parse_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> TransformError {
    TransformError::Parse(format!("{err} (at byte {})", reader.buffer_position()))
}

/// Reads the `name`/`encrypted` attributes of a child element. Returns
/// `None` for elements that are not secret fields.
fn secret_attributes(reader: &Reader<&[u8]>, start: &BytesStart) -> TransformResult<Option<(SecretName, bool)>> {
    let mut name = None;
    let mut encrypted = false;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(reader, e))?;
        let value = attr.unescape_value().map_err(|e| parse_error(reader, e))?;
        match attr.key.as_ref() {
            b"name" => name = SecretName::from_attribute(&value),
            b"encrypted" => encrypted = value == "true",
            _ => {}
        }
    }
    Ok(name.map(|name| (name, encrypted)))
}

impl ConfigDocument {
    /// Parses a document and locates its secret fields.
    pub fn parse(source: String) -> TransformResult<Self> {
        let mut fields = Vec::new();
        {
            let mut reader = Reader::from_str(&source);
            let mut depth = 0usize;
            let mut saw_root = false;
            let mut open: Option<OpenField> = None;

            loop {
                let event = reader.read_event().map_err(|e| parse_error(&reader, e))?;
                match event {
                    Event::Start(start) => {
                        if depth == 0 {
                            if saw_root {
                                return Err(parse_error(&reader, "more than one root element"));
                            }
                            saw_root = true;
                        }
                        depth += 1;
                        if depth == 2 {
                            open = secret_attributes(&reader, &start)?.map(|(name, is_encrypted_flag)| OpenField {
                                element_name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                                name,
                                is_encrypted_flag,
                                text: String::new(),
                                content_start: reader.buffer_position() as usize,
                            });
                        }
                    }
                    Event::End(_) => {
                        if depth == 2 {
                            if let Some(field) = open.take() {
                                let end_tag_end = reader.buffer_position() as usize;
                                let content_end = source[field.content_start..end_tag_end]
                                    .rfind("</")
                                    .map(|offset| field.content_start + offset)
                                    .ok_or_else(|| parse_error(&reader, "end tag not found"))?;
                                fields.push(SecretField {
                                    element_name: field.element_name,
                                    name: field.name,
                                    is_encrypted_flag: field.is_encrypted_flag,
                                    raw_value: field.text,
                                    span: field.content_start..content_end,
                                });
                            }
                        }
                        depth = depth.saturating_sub(1);
                    }
                    Event::Empty(_) if depth == 0 => {
                        if saw_root {
                            return Err(parse_error(&reader, "more than one root element"));
                        }
                        saw_root = true;
                    }
                    // Empty children carry no value to migrate.
                    Event::Empty(_) => {}
                    Event::Text(text) if depth == 2 => {
                        if let Some(field) = open.as_mut() {
                            let text = text.unescape().map_err(|e| parse_error(&reader, e))?;
                            field.text.push_str(&text);
                        }
                    }
                    Event::CData(data) if depth == 2 => {
                        if let Some(field) = open.as_mut() {
                            field.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                        }
                    }
                    Event::Eof => break,
                    _ => {}
                }
            }

            if depth != 0 {
                return Err(parse_error(&reader, "unexpected end of document"));
            }
            if !saw_root {
                return Err(TransformError::Parse("document has no root element".to_string()));
            }
        }

        let replacements = vec![None; fields.len()];
        Ok(Self {
            source,
            fields,
            replacements,
        })
    }

    /// All secret fields, eligible or not, in document order.
    pub fn fields(&self) -> &[SecretField] {
        &self.fields
    }

    /// Indices and fields eligible for migration.
    pub fn eligible_fields(&self) -> impl Iterator<Item = (usize, &SecretField)> {
        self.fields.iter().enumerate().filter(|(_, field)| field.is_eligible())
    }

    /// Replaces the text content of field `index`.
    pub fn set_text(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.replacements.get_mut(index) {
            *slot = Some(value.into());
        }
    }

    /// Whether any replacement differs from its field's current text.
    pub fn is_modified(&self) -> bool {
        self.fields
            .iter()
            .zip(&self.replacements)
            .any(|(field, replacement)| replacement.as_ref().is_some_and(|value| *value != field.raw_value))
    }

    /// The document text with replacements applied.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (field, replacement) in self.fields.iter().zip(&self.replacements) {
            if let Some(value) = replacement.as_ref().filter(|value| **value != field.raw_value) {
                out.push_str(&self.source[cursor..field.span.start]);
                out.push_str(&escape(value.as_str()));
                cursor = field.span.end;
            }
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USERSTORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<UserStoreManager class="org.wso2.carbon.user.core.ldap.ReadWriteLDAPUserStoreManager">
    <Property name="ConnectionURL">ldap://localhost:10389</Property>
    <Property name="ConnectionName">uid=admin,ou=system</Property>
    <Property encrypted="true" name="ConnectionPassword">b2xkLXZhbHVl</Property>
    <Property name="password" encrypted="false">plain</Property>
    <!-- <Property name="password" encrypted="true">commented</Property> -->
    <Property name="Disabled">false</Property>
</UserStoreManager>
"#;

    #[test]
    fn locates_secret_fields() {
        let doc = ConfigDocument::parse(USERSTORE.to_string()).unwrap();
        let fields = doc.fields();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].element_name, "Property");
        assert_eq!(fields[0].name, SecretName::ConnectionPassword);
        assert!(fields[0].is_eligible());
        assert_eq!(fields[0].raw_value, "b2xkLXZhbHVl");
        assert_eq!(fields[1].name, SecretName::Password);
        assert!(!fields[1].is_eligible());
        assert_eq!(doc.eligible_fields().count(), 1);
    }

    #[test]
    fn untouched_document_renders_identically() {
        let doc = ConfigDocument::parse(USERSTORE.to_string()).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.render(), USERSTORE);
    }

    #[test]
    fn replacement_changes_only_field_text() {
        let mut doc = ConfigDocument::parse(USERSTORE.to_string()).unwrap();
        doc.set_text(0, "bmV3LXZhbHVl");

        assert!(doc.is_modified());
        assert_eq!(doc.render(), USERSTORE.replace("b2xkLXZhbHVl", "bmV3LXZhbHVl"));
    }

    #[test]
    fn unchanged_replacement_keeps_original_bytes() {
        let source = r#"<Root><Property name="password" encrypted="true">a&amp;b</Property></Root>"#;
        let mut doc = ConfigDocument::parse(source.to_string()).unwrap();
        doc.set_text(0, "a&b");

        assert!(!doc.is_modified());
        assert_eq!(doc.render(), source);
    }

    #[test]
    fn replacement_is_escaped() {
        let mut doc = ConfigDocument::parse(
            r#"<Root><Property name="password" encrypted="true">a</Property></Root>"#.to_string(),
        )
        .unwrap();
        doc.set_text(0, "x<y&z");
        assert_eq!(
            doc.render(),
            r#"<Root><Property name="password" encrypted="true">x&lt;y&amp;z</Property></Root>"#
        );
    }

    #[test]
    fn grandchildren_are_ignored() {
        let doc = ConfigDocument::parse(
            r#"<Root><Group><Property name="password" encrypted="true">a</Property></Group></Root>"#.to_string(),
        )
        .unwrap();
        assert!(doc.fields().is_empty());
    }

    #[test]
    fn name_matching_is_exact() {
        let doc = ConfigDocument::parse(
            r#"<Root>
                <Property name="Password" encrypted="true">a</Property>
                <Property name="connectionpassword" encrypted="true">b</Property>
                <Property name="password" encrypted="TRUE">c</Property>
            </Root>"#
                .to_string(),
        )
        .unwrap();
        assert_eq!(doc.fields().len(), 1);
        assert_eq!(doc.eligible_fields().count(), 0);
    }

    #[test]
    fn empty_children_are_skipped() {
        let doc = ConfigDocument::parse(
            r#"<Root><Property name="password" encrypted="true"/></Root>"#.to_string(),
        )
        .unwrap();
        assert!(doc.fields().is_empty());
    }

    #[test]
    fn empty_field_content_has_empty_value() {
        let mut doc = ConfigDocument::parse(
            r#"<Root><Property name="password" encrypted="true"></Property></Root>"#.to_string(),
        )
        .unwrap();
        assert_eq!(doc.fields()[0].raw_value, "");
        doc.set_text(0, "abc");
        assert_eq!(
            doc.render(),
            r#"<Root><Property name="password" encrypted="true">abc</Property></Root>"#
        );
    }

    #[test]
    fn cdata_content_is_read() {
        let doc = ConfigDocument::parse(
            r#"<Root><Property name="password" encrypted="true"><![CDATA[YWJj]]></Property></Root>"#.to_string(),
        )
        .unwrap();
        assert_eq!(doc.fields()[0].raw_value, "YWJj");
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        for source in [
            "",
            "   ",
            "<Root><Property name=\"password\">a</Root>",
            "<Root><Property>",
            "<A></A><B></B>",
        ] {
            let err = ConfigDocument::parse(source.to_string()).unwrap_err();
            assert!(matches!(err, TransformError::Parse(_)), "{source:?}");
        }
    }
}
