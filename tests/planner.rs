use anyhow::Result;
use std::io::Cursor;
use tsvmap::planner::{plan_partitions, plan_ranges, PartitionRange};
use tsvmap::TranslateError;

const HEADER: &[u8] = b"id\ta\tb\n";

fn file(body: &[u8]) -> Vec<u8> {
    let mut v = HEADER.to_vec();
    v.extend_from_slice(body);
    v
}

fn plan(bytes: &[u8], size: u64) -> Result<Vec<PartitionRange>> {
    plan_ranges(
        Cursor::new(bytes),
        bytes.len() as u64,
        HEADER.len() as u64,
        size,
    )
}

fn assert_well_formed(bytes: &[u8], ranges: &[PartitionRange]) {
    let mut expected_start = HEADER.len() as u64;
    for (i, r) in ranges.iter().enumerate() {
        assert_eq!(r.index, i);
        assert_eq!(r.start, expected_start, "ranges must be contiguous");
        assert!(r.end > r.start, "ranges must not be empty");
        let end = r.end as usize;
        assert!(
            end == bytes.len() || bytes[end - 1] == b'\n',
            "range {r:?} ends mid-line"
        );
        expected_start = r.end;
    }
    assert_eq!(expected_start, bytes.len() as u64, "ranges must cover the data");
}

fn count_lines(bytes: &[u8], ranges: &[PartitionRange]) -> usize {
    ranges
        .iter()
        .map(|r| {
            let part = &bytes[r.start as usize..r.end as usize];
            part.split(|&b| b == b'\n').filter(|l| !l.is_empty()).count()
        })
        .sum()
}

#[test]
fn every_size_yields_aligned_cover() -> Result<()> {
    let bytes = file(b"r1\tx\ty\nr22\txx\tyy\nr333\txxx\tyyy\nr4\t\t\n");
    let lines = 4;
    for size in 1..=bytes.len() as u64 + 2 {
        let ranges = plan(&bytes, size)?;
        assert_well_formed(&bytes, &ranges);
        assert_eq!(count_lines(&bytes, &ranges), lines, "size {size}");
    }
    Ok(())
}

#[test]
fn size_larger_than_file_gives_one_partition() -> Result<()> {
    let bytes = file(b"r1\tx\ty\nr2\tx\ty\n");
    let ranges = plan(&bytes, 10_000)?;
    assert_eq!(
        ranges,
        vec![PartitionRange {
            index: 0,
            start: HEADER.len() as u64,
            end: bytes.len() as u64,
        }]
    );
    Ok(())
}

#[test]
fn missing_trailing_newline_ends_at_file_length() -> Result<()> {
    let bytes = file(b"r1\tx\ty\nr2\tx\ty");
    for size in 1..=4 {
        let ranges = plan(&bytes, size)?;
        assert_well_formed(&bytes, &ranges);
        assert_eq!(ranges.last().map(|r| r.end), Some(bytes.len() as u64));
    }
    Ok(())
}

#[test]
fn long_line_becomes_one_oversized_partition() -> Result<()> {
    let long = "v".repeat(500);
    let body = format!("r1\t{long}\tz\nr2\tx\ty\n");
    let bytes = file(body.as_bytes());
    let ranges = plan(&bytes, 8)?;
    assert_well_formed(&bytes, &ranges);
    assert_eq!(ranges.len(), 2);
    assert!(ranges[0].len() > 500);
    Ok(())
}

#[test]
fn landing_on_a_line_start_still_takes_the_next_line() -> Result<()> {
    // first data line is exactly 7 bytes, so a size of 7 lands on the start
    // of the second line and the scan extends through it
    let bytes = file(b"r1\tx\ty\nr2\tx\ty\nr3\tx\ty\n");
    let ranges = plan(&bytes, 7)?;
    assert_well_formed(&bytes, &ranges);
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].len(), 14);
    Ok(())
}

#[test]
fn header_only_has_no_partitions() -> Result<()> {
    assert!(plan(HEADER, 4)?.is_empty());
    Ok(())
}

#[test]
fn zero_size_is_rejected() {
    let err = plan(&file(b"r\t1\t2\n"), 0).unwrap_err();
    assert_eq!(
        err.downcast_ref::<TranslateError>(),
        Some(&TranslateError::InvalidPartitionSize)
    );
}

#[test]
fn plans_files_on_disk() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("data.tsv");
    let bytes = file(b"r1\tx\ty\nr2\tx\ty\n");
    std::fs::write(&path, &bytes)?;
    let ranges = plan_partitions(&path, HEADER.len() as u64, 3)?;
    assert_well_formed(&bytes, &ranges);
    assert_eq!(ranges.len(), 2);
    Ok(())
}
