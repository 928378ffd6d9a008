//! PDF concatenation.
//!
//! Every input is renumbered into a shared object id space, its pages are re-parented under
//! a single page tree, and the first catalog becomes the document root. Page order within
//! each input and the order of inputs are both preserved.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::documents::DocumentError;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;

/// Concatenates `inputs` in order into a new PDF at `output`. Returns the page count.
///
/// Blocking; call from `spawn_blocking` inside async code.
pub fn merge_pdf_files(inputs: &[PathBuf], output: &Path) -> Result<usize, DocumentError> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for path in inputs {
        let mut doc = Document::load(path)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(DocumentError::InvalidPdf {
                path: path.clone(),
                reason: "document has no pages",
            });
        }
        debug!("Merging {} page(s) from {}", page_ids.len(), path.display());

        for page_id in page_ids.into_values() {
            let mut page = doc.get_dictionary(page_id)?.clone();
            inherit_page_attributes(&doc, &mut page);
            pages.push((page_id, page));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut page_tree: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        let kind = object.type_name().map(str::to_owned).unwrap_or_default();
        match kind.as_str() {
            "Catalog" => {
                if catalog.is_none() {
                    catalog = Some((object_id, object.as_dict()?.clone()));
                }
            }
            "Pages" => {
                if page_tree.is_none() {
                    page_tree = Some((object_id, object.as_dict()?.clone()));
                }
            }
            // Pages are re-inserted below; outlines point into the old trees.
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, mut pages_dict) = page_tree.ok_or_else(|| DocumentError::InvalidPdf {
        path: output.to_path_buf(),
        reason: "inputs contain no page tree",
    })?;
    let (catalog_id, mut catalog_dict) = catalog.ok_or_else(|| DocumentError::InvalidPdf {
        path: output.to_path_buf(),
        reason: "inputs contain no catalog",
    })?;

    let page_count = pages.len();
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    for (page_id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        merged.objects.insert(page_id, Object::Dictionary(page));
    }

    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_count as i64));
    pages_dict.remove(b"Parent");
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", Object::Reference(pages_id));
    catalog_dict.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();
    merged.save(output)?;

    Ok(page_count)
}

/// Copies attributes the page inherits from intermediate page-tree nodes onto the page,
/// since those nodes are replaced by the merged root.
fn inherit_page_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if depth == MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
}

/// Builds a PDF with one page per marker; each page carries its marker under `/Marker`.
#[cfg(test)]
pub(crate) fn fixture_pdf(markers: &[&str]) -> Vec<u8> {
    use lopdf::{dictionary, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for marker in markers {
        let content = format!("BT /F1 12 Tf 72 720 Td ({marker}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Marker" => Object::string_literal(*marker),
        });
        kids.push(Object::Reference(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => markers.len() as i64,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Reads back the `/Marker` of every page, in page order.
#[cfg(test)]
pub(crate) fn page_markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let marker = page.get(b"Marker").unwrap().as_str().unwrap();
            String::from_utf8(marker.to_vec()).unwrap()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pdf(dir: &Path, name: &str, markers: &[&str]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, fixture_pdf(markers)).unwrap();
        path
    }

    #[test]
    fn test_pages_follow_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            write_pdf(dir.path(), "r.pdf", &["R1", "R2"]),
            write_pdf(dir.path(), "c.pdf", &["C1"]),
            write_pdf(dir.path(), "t.pdf", &["T1", "T2", "T3"]),
        ];
        let output = dir.path().join("out.pdf");

        let count = merge_pdf_files(&inputs, &output).unwrap();
        assert_eq!(count, 6);

        let markers = page_markers(&std::fs::read(&output).unwrap());
        assert_eq!(markers, vec!["R1", "R2", "C1", "T1", "T2", "T3"]);
    }

    #[test]
    fn test_inherited_resources_are_pushed_onto_pages() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            write_pdf(dir.path(), "a.pdf", &["A1"]),
            write_pdf(dir.path(), "b.pdf", &["B1"]),
        ];
        let output = dir.path().join("out.pdf");
        merge_pdf_files(&inputs, &output).unwrap();

        let doc = Document::load(&output).unwrap();
        for page_id in doc.get_pages().values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            assert!(page.has(b"Resources"));
            assert!(page.has(b"MediaBox"));
        }
    }

    #[test]
    fn test_single_input_round_trips_pages() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![write_pdf(dir.path(), "only.pdf", &["X1", "X2"])];
        let output = dir.path().join("out.pdf");

        merge_pdf_files(&inputs, &output).unwrap();
        assert_eq!(
            page_markers(&std::fs::read(&output).unwrap()),
            vec!["X1", "X2"]
        );
    }

    #[test]
    fn test_unparseable_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.pdf");
        std::fs::write(&bad, b"definitely not a pdf").unwrap();

        let err = merge_pdf_files(&[bad], &dir.path().join("out.pdf")).unwrap_err();
        assert!(matches!(err, DocumentError::PdfMerge(_)));
        assert!(!dir.path().join("out.pdf").exists());
    }
}
