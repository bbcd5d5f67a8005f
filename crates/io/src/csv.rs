// Delimited-text ingestion

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crossval_recon::model::{CellValue, Dataset, SourceRow};

use crate::error::IoError;

/// Read a delimited text export as a dataset. The delimiter is sniffed; the
/// first record is the header row. Short records are padded with empty cells.
pub fn read_dataset(path: &Path) -> Result<Dataset, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    let ds = parse_dataset(&content, delimiter, &crate::file_name(path)).map_err(|message| {
        IoError::Csv { path: path.to_path_buf(), message }
    })?;
    if ds.headers.is_empty() {
        return Err(IoError::NoHeader { path: path.to_path_buf() });
    }
    log::info!(
        "read {} data row(s) from {} (delimiter {:?})",
        ds.rows.len(),
        path.display(),
        delimiter as char
    );
    Ok(ds)
}

/// Parse already-decoded text. Records whose fields are all blank are
/// skipped, matching the spreadsheet reader, so positional row numbers agree.
pub fn parse_dataset(content: &str, delimiter: u8, name: &str) -> Result<Dataset, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut fields = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).map(CellValue::from_trimmed).unwrap_or(CellValue::Empty);
            fields.entry(header.clone()).or_insert(value);
        }
        rows.push(SourceRow { index: rows.len(), fields });
    }

    Ok(Dataset {
        name: name.to_string(),
        headers: headers.into_iter().filter(|h| !h.is_empty()).collect(),
        rows,
    })
}

/// Pick the field delimiter for a text export.
///
/// The header row decides which candidates are plausible: a delimiter must
/// split it into at least two columns. Among those, the one whose data rows
/// most often have the header's column count wins; blank and delimiter-only
/// lines are ignored since the reader drops them anyway. Ties go to the
/// earlier candidate (tab, semicolon, comma, pipe).
pub fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
    const SAMPLE_ROWS: usize = 20;

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return b',';
    };
    let sample: Vec<&str> = lines.take(SAMPLE_ROWS).collect();

    CANDIDATES
        .iter()
        .filter_map(|&delim| {
            let columns = field_count(header, delim);
            if columns < 2 {
                return None;
            }
            let agreeing = sample
                .iter()
                .filter(|line| !is_delimiter_only(line, delim))
                .filter(|line| field_count(line, delim) == columns)
                .count();
            Some((delim, agreeing, columns))
        })
        // max_by_key keeps the last maximum; reverse so earlier candidates win ties
        .rev()
        .max_by_key(|&(_, agreeing, columns)| (agreeing, columns))
        .map(|(delim, _, _)| delim)
        .unwrap_or(b',')
}

fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |r| r.len())
}

fn is_delimiter_only(line: &str, delim: u8) -> bool {
    line.bytes().all(|b| b == delim || b.is_ascii_whitespace())
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback for
/// spreadsheet-exported text).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |e: std::io::Error| IoError::Read { path: path.to_path_buf(), message: e.to_string() };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
