use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_assemble::*;

const A4: [i64; 4] = [0, 0, 595, 842];
const LETTER_LANDSCAPE: [i64; 4] = [0, 0, 792, 612];

fn media_box(rect: [i64; 4]) -> Object {
    Object::Array(rect.iter().map(|&v| Object::Integer(v)).collect())
}

fn font_resources(doc: &mut Document) -> Dictionary {
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )])
}

/// Build a document where `Some(text)` pages show text and `None` pages are blank
fn create_test_pdf(pages: &[Option<&str>], rect: [i64; 4]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let resources = font_resources(&mut doc);

    let mut kids = Vec::new();
    for page in pages {
        let content = match page {
            Some(text) => format!("BT /F1 12 Tf 72 700 Td ({}) Tj ET", text).into_bytes(),
            None => b"q Q".to_vec(),
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", media_box(rect)),
            ("Resources", Object::Dictionary(resources.clone())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(pages.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    doc
}

fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

fn addendum_bytes() -> Vec<u8> {
    to_bytes(create_test_pdf(&[Some("Addendum"), Some("Unused")], LETTER_LANDSCAPE))
}

fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&page_content(&doc, id).unwrap()).into_owned())
        .collect()
}

fn last_page_media_box(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    let &last = doc.get_pages().values().last().unwrap();
    doc.get_dictionary(last)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

#[test]
fn test_trailing_blank_pages_removed_and_addendum_appended() {
    let rendered = to_bytes(create_test_pdf(
        &[Some("Body 1"), Some("Body 2"), Some("Body 3"), None, None],
        A4,
    ));

    let result = assemble_sync(&rendered, &addendum_bytes()).unwrap();

    assert_eq!(result.page_count, 4);
    assert_eq!(result.blank_pages_removed, 2);

    let texts = page_texts(&result.bytes);
    assert_eq!(texts.len(), 4);
    assert!(texts[0].contains("(Body 1)"));
    assert!(texts[1].contains("(Body 2)"));
    assert!(texts[2].contains("(Body 3)"));
    assert!(texts[3].contains("(Addendum)"));
}

#[test]
fn test_no_blank_pages_still_appends_addendum() {
    let rendered = to_bytes(create_test_pdf(&[Some("Only")], A4));

    let result = assemble_sync(&rendered, &addendum_bytes()).unwrap();

    assert_eq!(result.page_count, 2);
    assert_eq!(result.blank_pages_removed, 0);
}

#[test]
fn test_blank_pages_in_the_middle_are_kept() {
    let rendered = to_bytes(create_test_pdf(
        &[Some("First"), None, Some("Third"), None],
        A4,
    ));

    let result = assemble_sync(&rendered, &addendum_bytes()).unwrap();

    assert_eq!(result.blank_pages_removed, 1);
    let texts = page_texts(&result.bytes);
    assert_eq!(texts.len(), 4);
    assert!(texts[0].contains("(First)"));
    assert!(!texts[1].contains("Tj"));
    assert!(texts[2].contains("(Third)"));
    assert!(texts[3].contains("(Addendum)"));
}

#[test]
fn test_all_blank_leaves_only_addendum() {
    let rendered = to_bytes(create_test_pdf(&[None, None, None], A4));

    let result = assemble_sync(&rendered, &addendum_bytes()).unwrap();

    assert_eq!(result.page_count, 1);
    assert_eq!(result.blank_pages_removed, 3);
    assert!(page_texts(&result.bytes)[0].contains("(Addendum)"));
}

#[test]
fn test_addendum_page_keeps_its_own_size() {
    let rendered = to_bytes(create_test_pdf(&[Some("Body")], A4));

    let result = assemble_sync(&rendered, &addendum_bytes()).unwrap();

    assert_eq!(last_page_media_box(&result.bytes), vec![0, 0, 792, 612]);
}

#[test]
fn test_inherited_addendum_attributes_are_copied() {
    let mut addendum = Document::with_version("1.7");
    let pages_id = addendum.new_object_id();
    let resources = font_resources(&mut addendum);
    let content_id = addendum.add_object(Stream::new(
        Dictionary::new(),
        b"BT /F1 10 Tf 50 50 Td (Terms) Tj ET".to_vec(),
    ));
    let page_id = addendum.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
    ]));
    addendum.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
            ("MediaBox", media_box([0, 0, 420, 595])),
            ("Resources", Object::Dictionary(resources)),
        ])),
    );
    let catalog_id = addendum.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    addendum.trailer.set("Root", catalog_id);

    let rendered = to_bytes(create_test_pdf(&[Some("Body")], A4));
    let result = assemble_sync(&rendered, &to_bytes(addendum)).unwrap();

    assert_eq!(last_page_media_box(&result.bytes), vec![0, 0, 420, 595]);

    let doc = Document::load_mem(&result.bytes).unwrap();
    let &last = doc.get_pages().values().last().unwrap();
    let page = doc.get_dictionary(last).unwrap();
    assert!(page.has(b"Resources"));
}

#[test]
fn test_corrupt_rendered_document() {
    let err = assemble_sync(b"this is not a pdf", &addendum_bytes()).unwrap_err();
    assert!(matches!(err, AssembleError::CorruptRenderedDocument(_)));
}

#[test]
fn test_unreadable_addendum() {
    let rendered = to_bytes(create_test_pdf(&[Some("Body")], A4));

    let err = assemble_sync(&rendered, b"").unwrap_err();
    assert!(matches!(err, AssembleError::MissingAddendum(_)));
}

#[test]
fn test_empty_addendum() {
    let rendered = to_bytes(create_test_pdf(&[Some("Body")], A4));
    let addendum = to_bytes(create_test_pdf(&[], A4));

    let err = assemble_sync(&rendered, &addendum).unwrap_err();
    assert!(matches!(err, AssembleError::MissingAddendum(_)));
}

#[test]
fn test_assembling_twice_appends_a_second_addendum() {
    let rendered = to_bytes(create_test_pdf(&[Some("Body"), None], A4));
    let addendum = addendum_bytes();

    let once = assemble_sync(&rendered, &addendum).unwrap();
    let twice = assemble_sync(&once.bytes, &addendum).unwrap();

    assert_eq!(once.page_count, 2);
    assert_eq!(twice.blank_pages_removed, 0);
    assert_eq!(twice.page_count, 3);
}

#[test]
fn test_custom_blank_predicate() {
    let rendered = to_bytes(create_test_pdf(&[Some("A"), Some("B"), Some("C")], A4));
    let everything_blank = |_: &Document, _: ObjectId| true;

    let result = assemble_with(&rendered, &addendum_bytes(), &everything_blank).unwrap();

    assert_eq!(result.blank_pages_removed, 3);
    assert_eq!(result.page_count, 1);
}

#[test]
fn test_annotation_back_reference_points_at_copied_page() {
    let mut addendum = create_test_pdf(&[Some("Signed")], A4);
    let &page_id = addendum.get_pages().values().next().unwrap();
    let annot_id = addendum.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Annot".to_vec())),
        ("Subtype", Object::Name(b"Text".to_vec())),
        ("Rect", media_box([10, 10, 20, 20])),
        ("P", Object::Reference(page_id)),
    ]));
    addendum
        .get_dictionary_mut(page_id)
        .unwrap()
        .set("Annots", Object::Array(vec![Object::Reference(annot_id)]));

    let rendered = to_bytes(create_test_pdf(&[Some("Body")], A4));
    let result = assemble_sync(&rendered, &to_bytes(addendum)).unwrap();

    let doc = Document::load_mem(&result.bytes).unwrap();
    let &last = doc.get_pages().values().last().unwrap();
    let annots = doc
        .get_dictionary(last)
        .unwrap()
        .get(b"Annots")
        .unwrap()
        .as_array()
        .unwrap();
    let annot = doc
        .get_dictionary(annots[0].as_reference().unwrap())
        .unwrap();
    assert_eq!(annot.get(b"P").unwrap().as_reference().unwrap(), last);
}

#[tokio::test]
async fn test_async_assemble() {
    let rendered = to_bytes(create_test_pdf(&[Some("Body"), None], A4));

    let result = assemble(rendered, addendum_bytes()).await.unwrap();

    assert_eq!(result.page_count, 2);
}

#[tokio::test]
async fn test_save_and_load_pdf() {
    use tempfile::NamedTempFile;

    let temp = NamedTempFile::new().unwrap();
    save_pdf(create_test_pdf(&[Some("A"), None], A4), temp.path())
        .await
        .unwrap();

    let loaded = load_pdf(temp.path()).await.unwrap();
    assert_eq!(loaded.get_pages().len(), 2);
}
