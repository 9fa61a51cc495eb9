use anyhow::Result;
use std::io::Cursor;
use tsvmap::header::{read_header, read_header_file, resolve_header};
use tsvmap::{IdColumn, MappingTable, TranslateError};

fn mapping() -> Result<MappingTable> {
    MappingTable::builder()
        .column_mapping([("Col1", "C1"), ("Col3", "C3")])
        .row_mapping([("r1", "R1")])
        .build()
}

#[test]
fn header_keeps_mapped_columns_in_input_order() -> Result<()> {
    let m = mapping()?;
    let (header, flags) = resolve_header("Col3\tCol2\tCol1", &m, IdColumn::Named);
    assert_eq!(header, vec!["C3", "C1"]);
    assert_eq!(flags.as_slice(), &[true, false, true]);
    assert_eq!(flags.included_count(), header.len());
    assert_eq!(flags.required_fields(), 3);
    Ok(())
}

#[test]
fn unnamed_id_column_shifts_flags() -> Result<()> {
    let m = mapping()?;
    let (header, flags) = resolve_header("Col1\tCol2\tCol3", &m, IdColumn::Unnamed);
    assert_eq!(header, vec!["C1", "C3"]);
    assert_eq!(flags.as_slice(), &[false, true, false, true]);
    assert!(!flags.is_included(0));
    assert_eq!(flags.required_fields(), 4);
    Ok(())
}

#[test]
fn no_mapped_columns_gives_empty_header() -> Result<()> {
    let m = mapping()?;
    let (header, flags) = resolve_header("x\ty", &m, IdColumn::Named);
    assert!(header.is_empty());
    assert_eq!(flags.included_count(), 0);
    assert_eq!(flags.required_fields(), 1);
    Ok(())
}

#[test]
fn data_offset_points_past_the_header_line() -> Result<()> {
    let m = mapping()?;
    let resolved = read_header(Cursor::new(b"Id\tCol1\nr1\tv\n"), &m, IdColumn::Named)?;
    assert_eq!(resolved.data_offset, 8);
    assert_eq!(resolved.header, vec!["C1"]);
    Ok(())
}

#[test]
fn header_without_newline_is_the_whole_file() -> Result<()> {
    let m = mapping()?;
    let resolved = read_header(Cursor::new(b"Id\tCol1"), &m, IdColumn::Named)?;
    assert_eq!(resolved.data_offset, 7);
    assert_eq!(resolved.header, vec!["C1"]);
    Ok(())
}

#[test]
fn empty_file_is_empty_input() -> Result<()> {
    let m = mapping()?;
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("empty.tsv");
    std::fs::write(&path, b"")?;
    let err = read_header_file(&path, &m, IdColumn::Named).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TranslateError>(),
        Some(&TranslateError::EmptyInput)
    );
    Ok(())
}

#[test]
fn non_utf8_header_is_rejected() -> Result<()> {
    let m = mapping()?;
    let err = read_header(Cursor::new(b"Id\t\xff\xfe\n"), &m, IdColumn::Named).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TranslateError>(),
        Some(&TranslateError::InvalidHeader)
    );
    Ok(())
}
