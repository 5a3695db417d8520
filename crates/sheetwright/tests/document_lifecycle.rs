//! End-to-end tests for the document lifecycle (create -> save -> open -> verify)

use pretty_assertions::assert_eq;
use sheetwright::prelude::*;
use sheetwright::{ColumnStyleRange, MemoryStore, XlsxError};

/// A new document is only written on save
#[test]
fn test_create_save_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("created.xlsx");

    let mut doc = Document::create(&path).unwrap();
    assert_eq!(doc.workbook().sheet_count(), 1);
    assert!(!path.exists());

    {
        let workbook = doc.workbook_mut();
        let hallo = workbook.shared_values_mut().intern("Hallo");
        let sheet = workbook.worksheet_mut(0).unwrap();
        let row = sheet.append_row().unwrap();
        row.append_cell("Test 1").unwrap();
        row.append_cell(CellValue::Shared(hallo)).unwrap();
        row.append_cell(5).unwrap();
        row.append_cell(false).unwrap();
    }
    doc.save().unwrap();
    doc.close().unwrap();

    let doc = Document::open(&path, StoreOptions::default()).unwrap();
    let workbook = doc.workbook();
    let pool = workbook.shared_values();
    let sheet = workbook.worksheet(0).unwrap();

    let texts: Vec<_> = sheet
        .row(1)
        .unwrap()
        .cells()
        .iter()
        .map(|c| c.value_text(pool).unwrap().into_owned())
        .collect();
    assert_eq!(texts, vec!["Test 1", "Hallo", "5", "FALSE"]);
    assert_eq!(sheet.cell("B1").unwrap().value(), &CellValue::Shared(0));
}

/// Saving twice overwrites the package with the latest grid
#[test]
fn test_save_is_explicit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saves.xlsx");

    let mut doc = Document::create(&path).unwrap();
    doc.workbook_mut()
        .worksheet_mut(0)
        .unwrap()
        .append_row()
        .unwrap()
        .append_cell("first")
        .unwrap();
    doc.save().unwrap();

    doc.workbook_mut()
        .worksheet_mut(0)
        .unwrap()
        .append_row()
        .unwrap()
        .append_cell("unsaved")
        .unwrap();
    doc.close().unwrap();

    let doc = Document::open(&path, StoreOptions::read_only()).unwrap();
    let sheet = doc.workbook().worksheet(0).unwrap();
    assert_eq!(sheet.row_count(), 1);
    assert_eq!(
        sheet.cell("A1").unwrap().value(),
        &CellValue::Text("first".into())
    );
}

#[test]
fn test_read_only_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.xlsx");
    Document::create(&path).unwrap().save().unwrap();

    let mut doc = Document::open(&path, StoreOptions::read_only()).unwrap();
    let err = doc.save().unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Store(XlsxError::ReadOnly(_))
    ));
}

#[test]
fn test_open_rejects_non_package() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.xlsx");
    std::fs::write(&path, "not a zip archive").unwrap();

    let err = Document::open(&path, StoreOptions::default()).unwrap_err();
    assert!(matches!(err, DocumentError::Store(XlsxError::Zip(_))));
}

#[test]
fn test_sheet_management_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheets.xlsx");

    let mut doc = Document::create(&path).unwrap();
    {
        let workbook = doc.workbook_mut();
        workbook.add_worksheet_with_name("Daten").unwrap();
        workbook.add_worksheet_with_name("Archiv").unwrap();
        workbook.rename_worksheet(0, "Übersicht").unwrap();
        workbook.worksheet_mut(2).unwrap().set_visible(false);
        assert!(workbook.add_worksheet_with_name("daten").is_err());
    }
    doc.save().unwrap();

    let doc = Document::open(&path, StoreOptions::default()).unwrap();
    let workbook = doc.workbook();
    let names: Vec<_> = workbook.worksheets().map(|s| s.name().to_string()).collect();
    assert_eq!(names, vec!["Übersicht", "Daten", "Archiv"]);
    let ids: Vec<_> = workbook.worksheets().map(|s| s.sheet_id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(!workbook.worksheet_by_name("Archiv").unwrap().is_visible());
}

/// A styled copy shares the stylesheet and column formats but holds no rows
#[test]
fn test_copy_with_style() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("template.xlsx");
    let copy_path = dir.path().join("copy.xlsx");

    let mut source = Document::create(&source_path).unwrap();
    {
        let workbook = source.workbook_mut();
        workbook.add_worksheet_with_name("Second").unwrap();
        let sheet = workbook.worksheet_mut(1).unwrap();
        sheet
            .columns_mut()
            .set_range(1, 3, ColumnFormat::new().with_width(18.0).with_style(1))
            .unwrap();
        sheet.append_row().unwrap().append_cell("data").unwrap();
    }
    source.save().unwrap();

    let mut copy = source.copy_with_style(&copy_path, Some("Second")).unwrap();
    assert_eq!(copy.workbook().sheet_count(), 1);
    let sheet = copy.workbook().worksheet(0).unwrap();
    assert_eq!(sheet.name(), "Second");
    assert_eq!(sheet.row_count(), 0);
    assert_eq!(
        sheet.columns().ranges(),
        &[ColumnStyleRange::new(
            1,
            3,
            ColumnFormat::new().with_width(18.0).with_style(1)
        )]
    );

    copy.save().unwrap();
    let reopened = Document::open(&copy_path, StoreOptions::default()).unwrap();
    assert_eq!(reopened.workbook().worksheet(0).unwrap().name(), "Second");
    assert_eq!(
        reopened.workbook().worksheet(0).unwrap().columns(),
        source.workbook().worksheet(1).unwrap().columns()
    );

    let all = source.copy_with_style(&copy_path, None).unwrap();
    assert_eq!(all.workbook().sheet_count(), 2);
    assert!(matches!(
        source.copy_with_style(&copy_path, Some("Missing")),
        Err(DocumentError::Grid(Error::SheetNotFound(_)))
    ));
}

#[test]
fn test_memory_backed_document() {
    let mut doc = Document::from_store(MemoryStore::create()).unwrap();
    doc.workbook_mut()
        .worksheet_mut(0)
        .unwrap()
        .append_row()
        .unwrap()
        .append_cell(1.5)
        .unwrap();
    doc.save().unwrap();

    let (store, _) = doc.into_parts();
    assert_eq!(store.save_count(), 1);
    let saved = store.saved().unwrap();
    assert_eq!(
        saved.worksheet(0).unwrap().cell("A1").unwrap().value(),
        &CellValue::Number(1.5)
    );
}
