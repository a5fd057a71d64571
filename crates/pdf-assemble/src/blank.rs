//! Blank page detection

use crate::tree::{as_dictionary, inherited_attribute};
use crate::types::*;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Nesting limit when following Form XObjects
const MAX_FORM_DEPTH: usize = 8;

/// Decides whether a page counts as blank
pub trait BlankPredicate {
    fn is_blank(&self, doc: &Document, page_id: ObjectId) -> Result<bool>;
}

impl<F> BlankPredicate for F
where
    F: Fn(&Document, ObjectId) -> bool,
{
    fn is_blank(&self, doc: &Document, page_id: ObjectId) -> Result<bool> {
        Ok(self(doc, page_id))
    }
}

/// A page is blank when nothing on it shows text.
///
/// Text-showing operators (`Tj`, `TJ`, `'`, `"`) with a non-empty string
/// count as text, including those inside Form XObjects drawn by the page.
/// Vector art and images alone do not.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtractableText;

impl BlankPredicate for NoExtractableText {
    fn is_blank(&self, doc: &Document, page_id: ObjectId) -> Result<bool> {
        let content = page_content(doc, page_id)?;
        let resources =
            inherited_attribute(doc, page_id, b"Resources").and_then(|obj| as_dictionary(doc, obj));
        Ok(!shows_text(doc, &content, resources, 0)?)
    }
}

fn shows_text(
    doc: &Document,
    data: &[u8],
    resources: Option<&Dictionary>,
    depth: usize,
) -> Result<bool> {
    if data.is_empty() {
        return Ok(false);
    }

    let content = Content::decode(data).map_err(|e| {
        AssembleError::CorruptRenderedDocument(format!("undecodable content stream: {}", e))
    })?;

    for op in &content.operations {
        let found = match op.operator.as_str() {
            "Tj" | "'" => op.operands.first().is_some_and(is_non_empty_string),
            "\"" => op.operands.get(2).is_some_and(is_non_empty_string),
            "TJ" => match op.operands.first() {
                Some(Object::Array(items)) => items.iter().any(is_non_empty_string),
                _ => false,
            },
            "Do" if depth < MAX_FORM_DEPTH => {
                form_shows_text(doc, op.operands.first(), resources, depth)?
            }
            _ => false,
        };
        if found {
            return Ok(true);
        }
    }

    Ok(false)
}

fn form_shows_text(
    doc: &Document,
    name: Option<&Object>,
    resources: Option<&Dictionary>,
    depth: usize,
) -> Result<bool> {
    let Some(Object::Name(name)) = name else {
        return Ok(false);
    };
    let Some(xobjects) = resources
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| as_dictionary(doc, obj))
    else {
        return Ok(false);
    };
    let Ok(xobject_id) = xobjects.get(name).and_then(Object::as_reference) else {
        return Ok(false);
    };
    let Ok(stream) = doc.get_object(xobject_id).and_then(Object::as_stream) else {
        return Ok(false);
    };
    if !matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Form") {
        return Ok(false);
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let form_resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .and_then(|obj| as_dictionary(doc, obj))
        .or(resources);

    shows_text(doc, &data, form_resources, depth + 1)
}

fn is_non_empty_string(obj: &Object) -> bool {
    matches!(obj, Object::String(bytes, _) if !bytes.is_empty())
}

/// Get the decoded content stream data of a page.
///
/// Multiple content streams are concatenated with a newline between them.
pub fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc.get_dictionary(page_id)?;
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(arr) => concatenated_content_streams(doc, arr),
            other => Ok(stream_data(other)),
        },
        Object::Array(arr) => concatenated_content_streams(doc, arr),
        _ => Ok(Vec::new()),
    }
}

fn stream_data(obj: &Object) -> Vec<u8> {
    match obj.as_stream() {
        Ok(stream) => stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
        Err(_) => Vec::new(),
    }
}

fn concatenated_content_streams(doc: &Document, refs: &[Object]) -> Result<Vec<u8>> {
    let mut result = Vec::new();

    for obj in refs {
        if let Object::Reference(id) = obj {
            result.extend_from_slice(&stream_data(doc.get_object(*id)?));
            result.push(b'\n');
        }
    }

    Ok(result)
}
