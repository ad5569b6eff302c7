//! Roster record sources.
//!
//! A [`RecordSource`] yields the raw fields of each roster line in file
//! order. [`CsvRecordSource`] reads delimited text; [`VecRecordSource`]
//! replays records held in memory.

use std::io::Read;

use crate::error::Result;
use crate::types::RawRecord;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Ordered, finite stream of roster records.
pub trait RecordSource: Send {
    /// Position the source before its first record.
    fn init(&mut self) -> Result<()>;

    /// Next record, or `None` at end of stream.
    fn next_record(&mut self) -> Result<Option<RawRecord>>;
}

/// Supported field delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvDelimiter {
    /// Comma (,) - default delimiter
    #[default]
    Comma,
    /// Semicolon (;) - common in European exports
    Semicolon,
    /// Tab character (\t)
    Tab,
    /// Pipe character (|)
    Pipe,
}

impl CsvDelimiter {
    /// Convert delimiter to byte for csv crate.
    #[must_use]
    pub fn as_byte(&self) -> u8 {
        match self {
            CsvDelimiter::Comma => b',',
            CsvDelimiter::Semicolon => b';',
            CsvDelimiter::Tab => b'\t',
            CsvDelimiter::Pipe => b'|',
        }
    }

    /// Parse delimiter from string input.
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s {
            "," | "comma" => Ok(CsvDelimiter::Comma),
            ";" | "semicolon" => Ok(CsvDelimiter::Semicolon),
            "\t" | "tab" | "\\t" => Ok(CsvDelimiter::Tab),
            "|" | "pipe" => Ok(CsvDelimiter::Pipe),
            _ => Err(format!(
                "Invalid delimiter '{s}'. Valid values: ',', ';', '\\t', '|'"
            )),
        }
    }
}

/// Options for reading a roster file.
#[derive(Debug, Clone)]
pub struct CsvSourceConfig {
    pub delimiter: CsvDelimiter,
    /// Treat the first line as a header and skip it.
    pub has_headers: bool,
}

impl Default for CsvSourceConfig {
    fn default() -> Self {
        Self {
            delimiter: CsvDelimiter::Comma,
            has_headers: true,
        }
    }
}

/// Streams records from delimited text.
pub struct CsvRecordSource<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> CsvRecordSource<R> {
    pub fn from_reader(reader: R, config: &CsvSourceConfig) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(config.has_headers)
            .flexible(true)
            .delimiter(config.delimiter.as_byte())
            .from_reader(reader)
            .into_records();
        Self { records }
    }
}

impl<'a> CsvRecordSource<&'a [u8]> {
    /// Read from an in-memory buffer, dropping a leading UTF-8 BOM.
    pub fn from_bytes(data: &'a [u8], config: &CsvSourceConfig) -> Self {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        Self::from_reader(data, config)
    }
}

impl<R: Read + Send> RecordSource for CsvRecordSource<R> {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let Some(result) = self.records.next() else {
            return Ok(None);
        };
        let record = result?;
        let line_number = record.position().map_or(0, csv::Position::line);
        let fields = record.iter().map(str::to_string).collect();
        Ok(Some(RawRecord::new(line_number, fields)))
    }
}

/// Replays records held in memory. `init` rewinds to the first record.
#[derive(Debug, Clone, Default)]
pub struct VecRecordSource {
    records: Vec<RawRecord>,
    cursor: usize,
}

impl VecRecordSource {
    #[must_use]
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records, cursor: 0 }
    }

    /// Build from rows of fields, numbering lines from 1.
    pub fn from_rows<I, F, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(idx, fields)| {
                RawRecord::new(idx as u64 + 1, fields.into_iter().map(Into::into).collect())
            })
            .collect();
        Self::new(records)
    }
}

impl RecordSource for VecRecordSource {
    fn init(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let record = self.records.get(self.cursor).cloned();
        if record.is_some() {
            self.cursor += 1;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut dyn RecordSource) -> Vec<RawRecord> {
        source.init().unwrap();
        let mut out = Vec::new();
        while let Some(record) = source.next_record().unwrap() {
            out.push(record);
        }
        out
    }

    #[test]
    fn test_csv_source_skips_header_by_default() {
        let data = b"user,group\nalice,TeamX\nbob,\n";
        let mut source = CsvRecordSource::from_bytes(data, &CsvSourceConfig::default());
        let records = drain(&mut source);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields, vec!["alice", "TeamX"]);
        assert_eq!(records[0].line_number, 2);
        assert_eq!(records[1].fields, vec!["bob", ""]);
    }

    #[test]
    fn test_csv_source_without_header_and_short_rows() {
        let config = CsvSourceConfig {
            delimiter: CsvDelimiter::Semicolon,
            has_headers: false,
        };
        let data = b"alice;TeamX\nbob\n\"carol\";\"Team Y\"\n";
        let records = drain(&mut CsvRecordSource::from_bytes(data, &config));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].line_number, 1);
        assert_eq!(records[1].fields, vec!["bob"]);
        assert_eq!(records[2].fields, vec!["carol", "Team Y"]);
    }

    #[test]
    fn test_csv_source_strips_bom() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(b"alice,TeamX\n");
        let config = CsvSourceConfig {
            has_headers: false,
            ..CsvSourceConfig::default()
        };
        let records = drain(&mut CsvRecordSource::from_bytes(&data, &config));
        assert_eq!(records[0].fields[0], "alice");
    }

    #[test]
    fn test_vec_source_init_rewinds() {
        let mut source = VecRecordSource::from_rows([vec!["alice", "TeamX"], vec!["bob", ""]]);
        assert_eq!(drain(&mut source).len(), 2);
        assert_eq!(drain(&mut source).len(), 2);
    }

    #[test]
    fn test_invalid_utf8_row_is_a_record_source_error() {
        let data = b"alice,\xff\xfe\n";
        let config = CsvSourceConfig {
            has_headers: false,
            ..CsvSourceConfig::default()
        };
        let mut source = CsvRecordSource::from_bytes(data, &config);
        source.init().unwrap();

        let err = source.next_record().unwrap_err();
        assert!(matches!(err, crate::error::EnrolError::RecordSource(_)));
    }

    #[test]
    fn test_delimiter_parse() {
        assert_eq!(CsvDelimiter::parse(";").unwrap(), CsvDelimiter::Semicolon);
        assert_eq!(CsvDelimiter::parse("tab").unwrap(), CsvDelimiter::Tab);
        assert_eq!(CsvDelimiter::parse("pipe").unwrap(), CsvDelimiter::Pipe);
        assert!(CsvDelimiter::parse("#").is_err());
    }
}
