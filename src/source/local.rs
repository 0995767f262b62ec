use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::deck::{CardKind, CardRecord};
use crate::error::SourceError;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    text: String,
    #[serde(default)]
    pick: Option<u32>,
}

/// Read a CSV deck with a `type,text[,pick]` header.
///
/// Rows with every field empty are skipped; any other invalid row fails the
/// whole file so a deck is never built from partial data.
pub fn read_csv(path: &Path) -> Result<Vec<CardRecord>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);
    let row_err = |line: u64, reason: String| SourceError::Row {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let headers = reader
        .headers()
        .map_err(|err| row_err(1, err.to_string()))?
        .clone();
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| {
            let line = err.position().map(|p| p.line()).unwrap_or(0);
            row_err(line, err.to_string())
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|err| row_err(line, err.to_string()))?;
        let kind: CardKind = row
            .kind
            .parse()
            .map_err(|err: SourceError| row_err(line, err.to_string()))?;
        let card = CardRecord::new(kind, row.text, row.pick.unwrap_or(1))
            .map_err(|err| row_err(line, err.to_string()))?;
        records.push(card);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.csv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_rows_with_aliases_and_default_pick() {
        let (_dir, path) = write(
            "type,text,pick\n\
             black,\"Why did _______ cross the road?\",\n\
             black,\"_______ and _______.\",2\n\
             \n\
             white,A chicken,\n\
             ,,\n",
        );
        let records = read_csv(&path).unwrap();
        assert_eq!(
            records,
            vec![
                CardRecord::primary("Why did _______ cross the road?", 1).unwrap(),
                CardRecord::primary("_______ and _______.", 2).unwrap(),
                CardRecord::secondary("A chicken").unwrap(),
            ]
        );
    }

    #[test]
    fn pick_column_is_optional() {
        let (_dir, path) = write("kind,text\nsecondary,Toast\n");
        let records = read_csv(&path).unwrap();
        assert_eq!(records, vec![CardRecord::secondary("Toast").unwrap()]);
    }

    #[test]
    fn bad_row_reports_its_line() {
        let (_dir, path) = write("type,text\nwhite,Fine\npurple,Nope\n");
        match read_csv(&path) {
            Err(SourceError::Row { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("purple"), "{reason}");
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn empty_text_is_rejected() {
        let (_dir, path) = write("type,text\nwhite,\n");
        assert!(matches!(read_csv(&path), Err(SourceError::Row { line: 2, .. })));
    }
}
