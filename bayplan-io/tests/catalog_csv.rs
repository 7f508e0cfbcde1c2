use std::io::Write;
use std::path::PathBuf;

use bayplan_core::catalog::{CatalogCode, CatalogProvider};
use bayplan_io::catalog_csv::parse_catalog;
use bayplan_io::{CatalogLoader, CsvCatalogFacade, IoError};

fn code(raw: &str) -> CatalogCode {
    CatalogCode::parse(raw).expect("非空品番")
}

#[test]
fn load_fixture_catalog() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/tires.csv");
    let catalog = CsvCatalogFacade::new()
        .load(&path)
        .expect("目录文件应当可以解析");

    // 直径非数值与缺少品番的两行被丢弃
    assert_eq!(catalog.len(), 4);

    let entry = catalog.lookup(&code("101")).expect("0101 存在");
    assert_eq!(entry.code.as_str(), "0101");
    assert_eq!(entry.size, "195/65R15");
    assert_eq!(entry.diameter_mm, 634);
    assert_eq!(entry.width_mm, 195);
    assert_eq!(entry.pallet_count, Some(4));
    assert_eq!(entry.note, "summer");

    let winter = catalog.lookup(&code("2045")).expect("2045 存在");
    assert_eq!(winter.pallet_count, None);

    let truck = catalog.lookup(&code("0003")).expect("0003 存在");
    assert_eq!(truck.diameter_mm, 1054);
    assert!(catalog.lookup(&code("77")).is_none());
}

#[test]
fn columns_may_be_reordered_and_missing() {
    let catalog = parse_catalog("NOTE,diameter,CODE\nspare,640,5\nempty,700,\n");
    assert_eq!(catalog.len(), 1);
    let entry = catalog.lookup(&code("5")).expect("0005 存在");
    assert_eq!(entry.diameter_mm, 640);
    assert_eq!(entry.width_mm, 0);
    assert_eq!(entry.size, "");
    assert_eq!(entry.note, "spare");
    assert_eq!(entry.pallet_count, None);
}

#[test]
fn short_rows_are_skipped_when_dimensions_missing() {
    let catalog = parse_catalog("code,size,diameter,width\n10,a\n11,b,600,200\r\n");
    assert_eq!(catalog.len(), 1);
    assert!(catalog.lookup(&code("11")).is_some());
}

#[test]
fn later_rows_override_duplicate_codes() {
    let catalog = parse_catalog("code,diameter,width\n1,600,200\n0001,610,210\n");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.lookup(&code("1")).map(|e| e.diameter_mm), Some(610));
}

#[test]
fn load_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().expect("创建临时文件");
    writeln!(file, "code,size,diameter,width,pallet,note").unwrap();
    writeln!(file, "42,205/55R16,632,205,3,all season").unwrap();

    let catalog = CsvCatalogFacade::new().load(file.path()).expect("读取临时目录");
    assert_eq!(catalog.len(), 1);
    assert_eq!(
        catalog.lookup(&code("42")).map(|e| e.note.as_str()),
        Some("all season")
    );
}

#[test]
fn missing_file_is_read_error() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let err = CsvCatalogFacade::new()
        .load(&dir.path().join("absent.csv"))
        .unwrap_err();
    assert!(matches!(err, IoError::ReadError { .. }));
}
