//! Post-render page assembly
//!
//! 1. Load the rendered document
//! 2. Drop the run of blank pages at its end
//! 3. Load the addendum and append its first page
//! 4. Serialize the result

use crate::blank::{BlankPredicate, NoExtractableText};
use crate::copy::copy_object_deep;
use crate::io::save_pdf_to_vec;
use crate::tree::{INHERITABLE_KEYS, inherited_attribute, root_pages_id};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Assemble the rendered body and the addendum with the default blank-page rule
pub async fn assemble(rendered: Vec<u8>, addendum: Vec<u8>) -> Result<AssembledPdf> {
    tokio::task::spawn_blocking(move || assemble_sync(&rendered, &addendum)).await?
}

pub fn assemble_sync(rendered: &[u8], addendum: &[u8]) -> Result<AssembledPdf> {
    assemble_with(rendered, addendum, &NoExtractableText)
}

/// Assemble using a custom blank-page predicate.
///
/// Must be called once per rendered document: the addendum page is appended
/// unconditionally, so feeding the output back in adds a second one.
pub fn assemble_with(
    rendered: &[u8],
    addendum: &[u8],
    predicate: &impl BlankPredicate,
) -> Result<AssembledPdf> {
    let mut doc = Document::load_mem(rendered)
        .map_err(|e| AssembleError::CorruptRenderedDocument(e.to_string()))?;
    root_pages_id(&doc).map_err(into_corrupt)?;

    let blank_pages_removed =
        trim_trailing_blank_pages(&mut doc, predicate).map_err(into_corrupt)?;

    let addendum = Document::load_mem(addendum)
        .map_err(|e| AssembleError::MissingAddendum(e.to_string()))?;
    append_first_page(&mut doc, &addendum)?;

    let pruned = doc.prune_objects();
    if !pruned.is_empty() {
        log::debug!("Pruned {} unreferenced object(s)", pruned.len());
    }

    let page_count = doc.get_pages().len();
    let bytes = save_pdf_to_vec(doc)?;

    log::info!(
        "Assembled {} page(s), {} trailing blank page(s) removed, {} bytes",
        page_count,
        blank_pages_removed,
        bytes.len()
    );

    Ok(AssembledPdf {
        bytes,
        page_count,
        blank_pages_removed,
    })
}

/// Remove the run of blank pages at the end of the document.
///
/// Pages are examined from the last one backwards; the scan stops at the
/// first page that is not blank, so blank pages in the middle are kept.
/// Returns the number of pages removed.
pub fn trim_trailing_blank_pages(
    doc: &mut Document,
    predicate: &impl BlankPredicate,
) -> Result<usize> {
    let pages = doc.get_pages();

    let mut trailing = Vec::new();
    for (&page_number, &page_id) in pages.iter().rev() {
        if !predicate.is_blank(doc, page_id)? {
            break;
        }
        trailing.push(page_number);
    }

    if !trailing.is_empty() {
        log::debug!("Removing trailing blank page(s) {:?}", trailing);
        doc.delete_pages(&trailing);
    }

    Ok(trailing.len())
}

/// Copy the first page of `addendum` to the end of `target`.
///
/// The page keeps its own media box and resources, including attributes it
/// inherits from the addendum's page tree. Returns the id of the new page.
pub fn append_first_page(target: &mut Document, addendum: &Document) -> Result<ObjectId> {
    let Some(&source_page_id) = addendum.get_pages().values().next() else {
        return Err(AssembleError::MissingAddendum(
            "addendum has no pages".to_string(),
        ));
    };
    let source_page = addendum.get_dictionary(source_page_id)?;
    let pages_id = root_pages_id(target)?;

    // Back-references to the source page (annotation /P) must land on the copy
    let new_page_id = target.new_object_id();
    let mut cache: HashMap<ObjectId, ObjectId> = HashMap::new();
    cache.insert(source_page_id, new_page_id);

    let mut page_dict = Dictionary::new();
    for (key, value) in source_page.iter() {
        if key == b"Parent" {
            continue;
        }
        page_dict.set(
            key.clone(),
            copy_object_deep(target, addendum, value, &mut cache)?,
        );
    }
    for key in INHERITABLE_KEYS {
        if page_dict.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(addendum, source_page_id, key) {
            page_dict.set(
                key.to_vec(),
                copy_object_deep(target, addendum, value, &mut cache)?,
            );
        }
    }
    page_dict.set("Parent", Object::Reference(pages_id));
    target
        .objects
        .insert(new_page_id, Object::Dictionary(page_dict));

    let mut updated_pages_dict = target.get_dictionary(pages_id)?.clone();
    let mut kids = match updated_pages_dict.get(b"Kids") {
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };
    kids.push(Object::Reference(new_page_id));
    let count = updated_pages_dict
        .get(b"Count")
        .and_then(Object::as_i64)
        .unwrap_or(kids.len() as i64 - 1);
    updated_pages_dict.set("Count", Object::Integer(count + 1));
    updated_pages_dict.set("Kids", Object::Array(kids));

    target
        .objects
        .insert(pages_id, Object::Dictionary(updated_pages_dict));

    Ok(new_page_id)
}

fn into_corrupt(err: AssembleError) -> AssembleError {
    match err {
        AssembleError::Pdf(e) => AssembleError::CorruptRenderedDocument(e.to_string()),
        other => other,
    }
}
