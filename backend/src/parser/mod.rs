//! Regional order export reader.
//!
//! Decodes the raw bytes (auto-detected encoding), picks the delimiter from the
//! header line, and deserializes each record into a [`RawOrderRow`] tagged with
//! the caller's region label. Cells are kept verbatim; nothing is coerced here.

use std::fs;
use std::path::Path;

use crate::error::{ReadError, ReadResult};
use crate::models::RawOrderRow;

/// Rows of one export plus what was detected while reading it.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Raw rows, each tagged with the region label
    pub rows: Vec<RawOrderRow>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes.
///
/// Input that is valid UTF-8 is always UTF-8; chardet only decides between
/// the legacy encodings when the strict decode fails.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting candidates in the header line.
///
/// Falls back to `,` when the header holds none of them.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read one regional export from disk.
///
/// # Errors
/// [`ReadError::NotFound`] when `path` does not exist, before anything is read.
///
/// # Example
/// ```ignore
/// let rows = read_orders("order_region_a(in).csv", "A")?;
/// assert!(rows.iter().all(|r| r.region == "A"));
/// ```
pub fn read_orders<P: AsRef<Path>>(path: P, region: &str) -> ReadResult<Vec<RawOrderRow>> {
    Ok(read_orders_with_metadata(path, region)?.rows)
}

/// Same as [`read_orders`] but keeps encoding/delimiter/header metadata.
pub fn read_orders_with_metadata<P: AsRef<Path>>(path: P, region: &str) -> ReadResult<ParseResult> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReadError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes_auto(&bytes, region)
}

/// Parse export bytes with encoding and delimiter auto-detection.
pub fn parse_bytes_auto(bytes: &[u8], region: &str) -> ReadResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let (headers, rows) = parse_orders(&content, delimiter, region)?;

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse decoded export text with an explicit delimiter.
///
/// Quoted cells may contain the delimiter, which matters for JSON discount
/// payloads such as `"{""Amount"": 7.25, ""Type"": ""Fixed""}"`.
pub fn parse_orders(
    content: &str,
    delimiter: char,
    region: &str,
) -> ReadResult<(Vec<String>, Vec<RawOrderRow>)> {
    let delimiter = u8::try_from(delimiter).map_err(|_| ReadError::Parse {
        line: 1,
        message: format!("Unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let header_record = reader.headers().map_err(to_parse_error)?.clone();
    let headers: Vec<String> = header_record.iter().map(|h| h.to_string()).collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReadError::EmptyFile);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(to_parse_error)?;

        // Short rows pad with empty cells; extra cells have no column to land in.
        if record.len() > header_record.len() {
            return Err(ReadError::Parse {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                message: format!(
                    "Expected {} fields, saw {}",
                    header_record.len(),
                    record.len()
                ),
            });
        }

        let mut row: RawOrderRow = record
            .deserialize(Some(&header_record))
            .map_err(to_parse_error)?;
        row.region = region.to_string();
        rows.push(row);
    }

    Ok((headers, rows))
}

fn to_parse_error(err: csv::Error) -> ReadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    ReadError::Parse {
        line,
        message: err.to_string(),
    }
}
