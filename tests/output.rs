use anyhow::Result;
use tsvmap::output::{write_table, write_table_file};
use tsvmap::{OutputFormat, Table};

fn table() -> Result<Table> {
    Table::new(
        vec!["C1".into(), "C3".into()],
        vec![
            vec!["R1".into(), "a".into(), "c".into()],
            vec!["R2".into(), "d \"q\"".into(), "f".into()],
        ],
    )
}

#[test]
fn tsv_output_is_unquoted() -> Result<()> {
    let mut buf = Vec::new();
    let n = write_table(&table()?, OutputFormat::Tsv, &mut buf)?;
    assert_eq!(n, 2);
    assert_eq!(
        String::from_utf8(buf)?,
        "C1\tC3\nR1\ta\tc\nR2\td \"q\"\tf\n"
    );
    Ok(())
}

#[test]
fn jsonl_output_has_one_array_per_line() -> Result<()> {
    let mut buf = Vec::new();
    write_table(&table()?, OutputFormat::Jsonl, &mut buf)?;
    let text = String::from_utf8(buf)?;
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], serde_json::json!(["C1", "C3"]));
    assert_eq!(lines[2], serde_json::json!(["R2", "d \"q\"", "f"]));
    Ok(())
}

#[test]
fn file_output_creates_parent_directories() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("nested/dir/out.tsv");
    write_table_file(&table()?, OutputFormat::Tsv, &path)?;
    let text = std::fs::read_to_string(&path)?;
    assert!(text.starts_with("C1\tC3\n"));
    Ok(())
}

#[test]
fn empty_header_is_rejected() {
    assert!(Table::new(Vec::new(), Vec::new()).is_err());
}

#[test]
fn deserialized_tables_keep_the_header_check() -> Result<()> {
    let table: Table = serde_json::from_str(r#"{"header":["C1"],"rows":[["R1","a"]]}"#)?;
    assert_eq!(table.header(), ["C1"]);
    assert_eq!(table.rows()[0], ["R1", "a"]);

    let err = serde_json::from_str::<Table>(r#"{"header":[],"rows":[]}"#).unwrap_err();
    assert!(err.to_string().contains("header is empty"));
    Ok(())
}
