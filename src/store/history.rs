//! Append-only CSV history of classification results.
//!
//! The persisted file carries the canonical header `File,Class,Color,
//! Confidence` and is written as UTF-8 with a BOM. Loading tries a fixed
//! encoding ladder (BOM UTF-8, strict UTF-8, windows-1251) before giving
//! up. Corruption self-heals: an undecodable file or a foreign header is
//! replaced by a canonical-header-only file on load, and an append against
//! a foreign header rewrites the file around the new row. The rewrite
//! discards prior rows; that loss is deliberate and logged at warn.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::pipeline::types::Record;

pub const CANONICAL_HEADER: [&str; 4] = ["File", "Class", "Color", "Confidence"];

/// Back-fill for rows that are missing trailing columns.
const SENTINEL: &str = "—";

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode attempts in fixed priority order. Returns `None` only when
    /// every configured encoding rejects the bytes.
    fn decode(bytes: &[u8]) -> Option<String> {
        if let Some(rest) = bytes.strip_prefix(&UTF8_BOM) {
            if let Ok(text) = std::str::from_utf8(rest) {
                return Some(text.to_string());
            }
        }
        if let Ok(text) = std::str::from_utf8(bytes) {
            return Some(text.to_string());
        }
        let (text, _, had_errors) = encoding_rs::WINDOWS_1251.decode(bytes);
        if !had_errors {
            return Some(text.into_owned());
        }
        None
    }

    fn header_matches(headers: &csv::StringRecord) -> bool {
        let mut found: Vec<&str> = headers.iter().collect();
        let mut canonical: Vec<&str> = CANONICAL_HEADER.to_vec();
        found.sort_unstable();
        canonical.sort_unstable();
        found == canonical
    }

    /// Reads every persisted record in append order. Rows shorter than the
    /// header are back-filled with a sentinel, never dropped. An unreadable
    /// or schema-foreign file is replaced with a header-only file and an
    /// empty sequence is returned.
    pub fn load(&mut self) -> Result<Vec<Record>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&self.path)?;
        let Some(text) = Self::decode(&bytes) else {
            tracing::warn!(
                "{} at {}, rewriting with canonical header only",
                StoreError::Decode,
                self.path.display()
            );
            self.write_fresh(&[])?;
            return Ok(Vec::new());
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                tracing::warn!("History log header unreadable ({e}), self-healing");
                self.write_fresh(&[])?;
                return Ok(Vec::new());
            }
        };
        if !Self::header_matches(&headers) {
            let mismatch = StoreError::SchemaMismatch {
                found: headers.iter().map(str::to_string).collect(),
            };
            tracing::warn!("{mismatch}, self-healing");
            self.write_fresh(&[])?;
            return Ok(Vec::new());
        }

        // The header set is canonical but the column order may not be;
        // map every canonical column to its actual position.
        let positions: Vec<usize> = CANONICAL_HEADER
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|h| h == *column)
                    .unwrap_or(usize::MAX)
            })
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let field =
                |slot: usize| row.get(positions[slot]).unwrap_or(SENTINEL).to_string();
            records.push(Record {
                file_name: field(0),
                class_label: field(1),
                color_label: field(2),
                confidence: field(3),
            });
        }
        Ok(records)
    }

    /// Appends one row. Creates the file with the canonical header when it
    /// is absent; appends without touching the header when the existing
    /// header set matches (in any order), laying the fields out in that
    /// header's own column order; otherwise rewrites the file to contain
    /// only the canonical header and the new row.
    pub fn append(&mut self, record: &Record) -> Result<(), StoreError> {
        if !self.path.exists() {
            return self.write_fresh(std::slice::from_ref(record));
        }

        let bytes = std::fs::read(&self.path)?;
        let headers = Self::decode(&bytes).and_then(|text| {
            let mut reader = csv::ReaderBuilder::new()
                .flexible(true)
                .from_reader(text.as_bytes());
            reader.headers().ok().cloned()
        });
        let Some(headers) = headers.filter(Self::header_matches) else {
            tracing::warn!(
                "History log header mismatch at {}, rewriting log around the new row",
                self.path.display()
            );
            return self.write_fresh(std::slice::from_ref(record));
        };

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        // The existing header may be a permutation of the canonical one;
        // `load` maps columns by name, so the row has to follow the file's
        // order, not the canonical order.
        let row: Vec<&str> = headers
            .iter()
            .map(|column| Self::field_by_column(record, column))
            .collect();
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }

    /// Non-mutating query over the loaded sequence: color is a
    /// contains-match, class an exact match.
    pub fn filter(
        &mut self,
        color_contains: Option<&str>,
        class_exact: Option<&str>,
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.load()?;
        Ok(Self::filter_records(&records, color_contains, class_exact))
    }

    pub fn filter_records(
        records: &[Record],
        color_contains: Option<&str>,
        class_exact: Option<&str>,
    ) -> Vec<Record> {
        records
            .iter()
            .filter(|r| {
                color_contains.map_or(true, |needle| r.color_label.contains(needle))
                    && class_exact.map_or(true, |class| r.class_label == class)
            })
            .cloned()
            .collect()
    }

    /// Verbatim export of the loaded sequence as a JSON record array.
    pub fn export_json(&mut self, target: &Path) -> Result<usize, StoreError> {
        let records = self.load()?;
        let file = File::create(target)?;
        serde_json::to_writer_pretty(file, &records)?;
        Ok(records.len())
    }

    fn field_by_column<'a>(record: &'a Record, column: &str) -> &'a str {
        match column {
            "File" => &record.file_name,
            "Class" => &record.class_label,
            "Color" => &record.color_label,
            "Confidence" => &record.confidence,
            // Unreachable behind `header_matches`.
            _ => SENTINEL,
        }
    }

    fn write_row<W: Write>(writer: &mut csv::Writer<W>, record: &Record) -> Result<(), StoreError> {
        writer.write_record([
            record.file_name.as_str(),
            record.class_label.as_str(),
            record.color_label.as_str(),
            record.confidence.as_str(),
        ])?;
        Ok(())
    }

    fn write_fresh(&self, records: &[Record]) -> Result<(), StoreError> {
        let mut file = File::create(&self.path)?;
        file.write_all(&UTF8_BOM)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(CANONICAL_HEADER)?;
        for record in records {
            Self::write_row(&mut writer, record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> Record {
        Record {
            file_name: format!("piece_{n}.png"),
            class_label: "Knight".to_string(),
            color_label: "Dark".to_string(),
            confidence: "88.00%".to_string(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        HistoryStore::new(dir.path().join("predictions_log.csv"))
    }

    #[test]
    fn append_then_load_preserves_order_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for n in 0..5 {
            store.append(&record(n)).unwrap();
        }
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded[0].file_name, "piece_0.png");
        assert_eq!(loaded[4].file_name, "piece_4.png");
    }

    #[test]
    fn file_starts_with_bom_and_canonical_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.append(&record(0)).unwrap();
        let bytes = std::fs::read(store.path()).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("File,Class,Color,Confidence"));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn append_on_schema_mismatch_keeps_only_the_new_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(
            store.path(),
            "Timestamp,File,Class\nold,stale.png,Pawn\n",
        )
        .unwrap();

        store.append(&record(7)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].file_name, "piece_7.png");
        let bytes = std::fs::read(store.path()).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("File,Class,Color,Confidence"));
        assert!(!text.contains("stale.png"));
    }

    #[test]
    fn append_accepts_permuted_but_complete_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(
            store.path(),
            "Color,File,Class,Confidence\nDark,old.png,Pawn,50.00%\n",
        )
        .unwrap();

        store.append(&record(1)).unwrap();

        // Header untouched, old row preserved, new row appended.
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].file_name, "old.png");
        assert_eq!(loaded[0].color_label, "Dark");
        // The appended row round-trips field-for-field: it was laid out in
        // the file's own column order, not the canonical one.
        assert_eq!(loaded[1], record(1));
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("Dark,piece_1.png,Knight,88.00%"));
    }

    #[test]
    fn load_backfills_short_rows_with_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(
            store.path(),
            "File,Class,Color,Confidence\ntruncated.png,Rook\n",
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].class_label, "Rook");
        assert_eq!(loaded[0].color_label, SENTINEL);
        assert_eq!(loaded[0].confidence, SENTINEL);
    }

    #[test]
    fn load_self_heals_foreign_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(store.path(), "a,b\n1,2\n").unwrap();

        assert!(store.load().unwrap().is_empty());

        let bytes = std::fs::read(store.path()).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text.trim(), "File,Class,Color,Confidence");
    }

    #[test]
    fn load_decodes_windows_1251_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let text = "File,Class,Color,Confidence\nферзь.png,Queen,Dark,90.00%\n";
        let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode(text);
        // No BOM and not valid UTF-8: only the legacy codepage can read it.
        assert!(std::str::from_utf8(&encoded).is_err());
        std::fs::write(store.path(), &encoded).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].file_name, "ферзь.png");
    }

    #[test]
    fn filter_by_color_substring_and_exact_class() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.append(&record(0)).unwrap();
        store
            .append(&Record {
                file_name: "w.png".to_string(),
                class_label: "Queen".to_string(),
                color_label: "Light".to_string(),
                confidence: "70.00%".to_string(),
            })
            .unwrap();

        let dark = store.filter(Some("Dark"), None).unwrap();
        assert_eq!(dark.len(), 1);
        assert_eq!(dark[0].class_label, "Knight");

        let queens = store.filter(None, Some("Queen")).unwrap();
        assert_eq!(queens.len(), 1);

        let none = store.filter(Some("Light"), Some("Knight")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn export_json_is_a_pure_transformation_of_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.append(&record(0)).unwrap();
        store.append(&record(1)).unwrap();

        let target = dir.path().join("export.json");
        let exported = store.export_json(&target).unwrap();
        assert_eq!(exported, 2);

        let parsed: Vec<Record> =
            serde_json::from_slice(&std::fs::read(&target).unwrap()).unwrap();
        assert_eq!(parsed, store.load().unwrap());
    }
}
