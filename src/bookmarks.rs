//! PDF outline bookmarks built on top of `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;

/// Errors that can occur while embedding bookmarks into a rendered PDF.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or written back by `lopdf`.
    #[error("failed to process PDF bytes: {0}")]
    Parse(#[from] lopdf::Error),
    /// The trailer has no `/Root` catalog entry.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object is not a dictionary.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
    /// An outline entry points at a page the document does not have.
    #[error("bookmark '{title}' refers to missing page {page_number}")]
    MissingPage { title: String, page_number: usize },
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

/// Adds a flat `/Outlines` tree with one `/Dest [page /Fit]` entry per
/// `(title, page number)` pair.  Page numbers are 1-indexed.
pub fn apply_page_bookmarks(
    pdf_bytes: &[u8],
    outline: &[(String, usize)],
) -> Result<Vec<u8>, BookmarkError> {
    if outline.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let entries = resolve_entries(&mut document, outline, &pages)?;

    let outlines_id = document.new_object_id();
    link_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|err| BookmarkError::Parse(err.into()))?;
    Ok(buffer)
}

fn resolve_entries(
    document: &mut Document,
    outline: &[(String, usize)],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry>, BookmarkError> {
    outline
        .iter()
        .map(|(title, page_number)| {
            let page_ref = u32::try_from(*page_number)
                .ok()
                .and_then(|number| pages.get(&number).copied())
                .ok_or_else(|| BookmarkError::MissingPage {
                    title: title.clone(),
                    page_number: *page_number,
                })?;
            Ok(OutlineEntry {
                object_id: document.new_object_id(),
                page_ref,
                title: title.clone(),
            })
        })
        .collect()
}

fn link_entries(outlines_id: ObjectId, document: &mut Document, entries: &[OutlineEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(entry.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        if let Some(previous) = index.checked_sub(1).and_then(|i| entries.get(i)) {
            dictionary.set("Prev", Object::Reference(previous.object_id));
        }
        if let Some(next) = entries.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }

        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        dictionary.set("First", Object::Reference(first.object_id));
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outline_returns_input_unchanged() {
        let bytes = b"%PDF-1.3 not really".to_vec();
        assert_eq!(apply_page_bookmarks(&bytes, &[]).unwrap(), bytes);
    }

    #[test]
    fn invalid_pdf_bytes_are_rejected() {
        let outline = vec![("Portada".to_string(), 1)];
        assert!(matches!(
            apply_page_bookmarks(b"garbage", &outline),
            Err(BookmarkError::Parse(_))
        ));
    }
}
