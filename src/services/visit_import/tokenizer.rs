//! Row tokenizer for the PixSell diary/calls export
//!
//! The export starts with a fixed report header that is not CSV data.
//! Everything after it is read positionally: no header row, rows may be
//! shorter than the full column set.

use csv::{ReaderBuilder, StringRecordsIntoIter};

use crate::error::ImportError;

/// Report header lines preceding the first data row
pub const HEADER_LINES: usize = 5;

const DELIMITER: u8 = b',';
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One data line of the export, addressed by column index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the uploaded file
    pub line: u64,
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    /// Cell at `index`, or "" when the row is shorter than that
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Lazy, one-shot iterator over the data rows of an upload
pub struct RowReader<'a> {
    records: StringRecordsIntoIter<&'a [u8]>,
}

impl Iterator for RowReader<'_> {
    type Item = Result<RawRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    return Some(Err(ImportError::Parse {
                        line: line + HEADER_LINES as u64,
                        message: e.to_string(),
                    }));
                }
            };

            let line = record.position().map(|p| p.line()).unwrap_or(0) + HEADER_LINES as u64;
            let row = RawRow::new(line, record.iter().map(str::to_string).collect());
            if row.is_blank() {
                continue;
            }
            return Some(Ok(row));
        }
    }
}

/// Prepare a reader over `bytes`.
///
/// Structural checks (encoding, quote balance) run here, before the first
/// row is handed out.
pub fn tokenize(bytes: &[u8]) -> Result<RowReader<'_>, ImportError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let body = skip_lines(bytes, HEADER_LINES);

    if let Err(e) = std::str::from_utf8(body) {
        return Err(ImportError::Parse {
            line: line_at(body, e.valid_up_to()) + HEADER_LINES as u64,
            message: "file is not valid UTF-8 text".to_string(),
        });
    }

    if let Some(line) = find_unterminated_quote(body) {
        return Err(ImportError::Parse {
            line: line + HEADER_LINES as u64,
            message: "quoted field is never closed".to_string(),
        });
    }

    let reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    Ok(RowReader {
        records: reader.into_records(),
    })
}

fn skip_lines(bytes: &[u8], count: usize) -> &[u8] {
    let mut rest = bytes;
    for _ in 0..count {
        match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return &[],
        }
    }
    rest
}

fn line_at(body: &[u8], offset: usize) -> u64 {
    body[..offset].iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

/// Line on which a quoted field opens without ever closing.
///
/// Mirrors the csv reader's rules: a quote only opens a field at the start
/// of that field, and `""` inside a quoted field is an escaped quote.
fn find_unterminated_quote(body: &[u8]) -> Option<u64> {
    let mut line = 1u64;
    let mut at_field_start = true;
    let mut open_since: Option<u64> = None;
    let mut i = 0;

    while i < body.len() {
        let b = body[i];
        if open_since.is_some() {
            if b == b'"' {
                if body.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    open_since = None;
                }
            }
        } else if b == b'"' && at_field_start {
            open_since = Some(line);
        }

        if b == b'\n' {
            line += 1;
        }
        at_field_start = open_since.is_none() && matches!(b, DELIMITER | b'\n' | b'\r');
        i += 1;
    }

    open_since
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "PixSell Diary Report\nGenerated,05/03/2024\n\nFilter,All reps\nDate,Start,End,Duration,Account\n";

    fn rows(input: &str) -> Vec<RawRow> {
        tokenize(input.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_skips_report_header() {
        let input = format!("{}5/3/2024,9:30,,,zcrm_1\n", HEADER);
        let rows = rows(&input);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell(0), "5/3/2024");
        assert_eq!(rows[0].cell(4), "zcrm_1");
        assert_eq!(rows[0].line, 6);
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        assert!(rows(HEADER).is_empty());
        assert!(rows("just one line").is_empty());
        assert!(rows("").is_empty());
    }

    #[test]
    fn test_short_rows_read_missing_cells_as_empty() {
        let input = format!("{}a,b\nc,d,e,f,g,h,i,j\n", HEADER);
        let rows = rows(&input);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(1), "b");
        assert_eq!(rows[0].cell(27), "");
        assert_eq!(rows[1].cell(7), "j");
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let input = format!("{}a,b\n\n,,,\n  , \nc,d\n", HEADER);
        let rows = rows(&input);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(0), "a");
        assert_eq!(rows[1].cell(0), "c");
        assert_eq!(rows[1].line, 10);
    }

    #[test]
    fn test_crlf_and_bom_are_accepted() {
        let input = format!("{}{}a,b\r\nc,d\r\n", '\u{feff}', HEADER.replace('\n', "\r\n"));
        let rows = rows(&input);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(1), "b");
        assert_eq!(rows[1].cell(0), "c");
    }

    #[test]
    fn test_quoted_fields_keep_commas_newlines_and_escaped_quotes() {
        let input = format!("{}a,\"left, right\",\"say \"\"hi\"\"\",\"two\nlines\"\n", HEADER);
        let rows = rows(&input);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell(1), "left, right");
        assert_eq!(rows[0].cell(2), "say \"hi\"");
        assert_eq!(rows[0].cell(3), "two\nlines");
    }

    #[test]
    fn test_unbalanced_quote_is_parse_error() {
        let input = format!("{}a,b\nc,\"never closed,d\ne,f\n", HEADER);
        match tokenize(input.as_bytes()) {
            Err(ImportError::Parse { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let input = format!("{}5\" screen,b\n", HEADER);
        let rows = rows(&input);
        assert_eq!(rows[0].cell(0), "5\" screen");
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let mut input = HEADER.as_bytes().to_vec();
        input.extend_from_slice(b"ok,row\nbad,\xff\xfe\n");
        match tokenize(&input) {
            Err(ImportError::Parse { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_quote_in_header_is_ignored() {
        let input = "\"unterminated header\n2\n3\n4\n5\na,b\n";
        let rows = rows(input);
        assert_eq!(rows.len(), 1);
    }
}
