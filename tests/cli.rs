use anyhow::Result;
use std::process::Command;
use tsvmap::testing::TsvFixture;

fn fixture() -> Result<TsvFixture> {
    TsvFixture::new()?
        .header(&["Id", "Col1", "Col2"])
        .line(&["r1", "a", "b"])
        .line(&["r2", "c", "d"])
        .line(&["r3", "e", "f"])
        .column_mapping(&[("Col2", "C2")])
        .row_mapping(&[("r1", "R1"), ("r3", "R3")])
        .write()
}

#[test]
fn translates_to_stdout() -> Result<()> {
    let fx = fixture()?;
    let out = Command::new(env!("CARGO_BIN_EXE_tsvmap"))
        .arg(fx.input())
        .arg("--columns")
        .arg(fx.columns_path())
        .arg("--rows")
        .arg(fx.rows_path())
        .args(["--partition-size", "4", "--threads", "2"])
        .output()?;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8(out.stdout)?, "C2\nR1\tb\nR3\tf\n");
    Ok(())
}

#[test]
fn writes_output_and_metrics_files() -> Result<()> {
    let fx = fixture()?;
    let out_path = fx.dir().join("out/table.jsonl");
    let metrics_path = fx.dir().join("metrics.json");
    let status = Command::new(env!("CARGO_BIN_EXE_tsvmap"))
        .arg(fx.input())
        .arg("--columns")
        .arg(fx.columns_path())
        .arg("--rows")
        .arg(fx.rows_path())
        .args(["--inline", "--format", "jsonl", "-o"])
        .arg(&out_path)
        .arg("--metrics")
        .arg(&metrics_path)
        .status()?;
    assert!(status.success());

    let text = std::fs::read_to_string(&out_path)?;
    assert_eq!(text.lines().count(), 3);
    let metrics: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&metrics_path)?)?;
    assert!(metrics.is_object());
    Ok(())
}

#[test]
fn bad_partition_size_exits_nonzero() -> Result<()> {
    let fx = fixture()?;
    let out = Command::new(env!("CARGO_BIN_EXE_tsvmap"))
        .arg(fx.input())
        .arg("--columns")
        .arg(fx.columns_path())
        .arg("--rows")
        .arg(fx.rows_path())
        .args(["--partition-size", "0"])
        .output()?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
    Ok(())
}
