//! CSV ingestion: lenient decoding, delimiter sniffing, header resolution
//! and row parsing, over in-memory buffers.

use crate::config::EngineConfig;
use crate::error::ReconError;
use crate::headers::{self, ColumnMap};
use crate::model::{Order, Release};
use crate::parse::{self, CoercePolicy};

/// Header row plus raw records, as read from one uploaded file.
#[derive(Debug)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<csv::StringRecord>,
}

/// Result of one import: typed records, the column resolution that
/// produced them, and how many numeric cells fell back to a default.
#[derive(Debug)]
pub struct ImportBatch<T> {
    pub records: Vec<T>,
    pub columns: ColumnMap,
    pub defaulted_cells: usize,
}

/// Decode raw bytes as UTF-8, falling back to Windows-1252 (common for
/// spreadsheet-exported CSVs).
pub fn decode(bytes: &[u8]) -> String {
    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across
/// the first few lines. Falls back to semicolon when nothing scores.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b';', b',', b'\t', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    if sample.is_empty() {
        return b';';
    }

    let field_count = |line: &str, delimiter: u8| {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .and_then(|r| r.ok())
            .map(|r| r.len())
            .unwrap_or(1)
    };

    let mut best = b';';
    let mut best_score = 0u64;

    for &candidate in candidates {
        let widths: Vec<usize> = sample.iter().map(|line| field_count(line, candidate)).collect();

        // A delimiter that does not split the header row at all is out
        let header_width = widths[0];
        if header_width <= 1 {
            continue;
        }

        // Reward agreement with the header row's width; the width itself
        // breaks ties between delimiters that are both consistent.
        let agreeing = widths.iter().filter(|&&w| w == header_width).count() as u64;
        let score = agreeing * header_width as u64;

        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

/// Split decoded content into a header row and raw records.
pub fn read_table(content: &str) -> Result<RawTable, ReconError> {
    if content.trim().is_empty() {
        return Err(ReconError::FileRead("file is empty".into()));
    }

    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record.map_err(|e| ReconError::Csv(e.to_string()))?);
    }

    Ok(RawTable { headers, records })
}

/// Full orders ingestion: decode → sniff → resolve columns → require →
/// parse. Nothing is persisted here; the caller replaces the snapshot
/// only on success.
pub fn import_orders(
    bytes: &[u8],
    config: &EngineConfig,
    policy: CoercePolicy,
) -> Result<ImportBatch<Order>, ReconError> {
    let content = decode(bytes);
    let table = read_table(&content)?;

    let fields = &config.schemas.orders.fields;
    let columns = headers::resolve_columns(&table.headers, fields);
    headers::require(&columns, fields)?;

    let (records, defaulted_cells) =
        parse::parse_orders(&table.headers, &table.records, &columns, &config.rules, policy)?;
    if records.is_empty() {
        return Err(ReconError::NoRows);
    }

    Ok(ImportBatch { records, columns, defaulted_cells })
}

/// Full releases ingestion. Same pipeline as [`import_orders`].
pub fn import_releases(
    bytes: &[u8],
    config: &EngineConfig,
    policy: CoercePolicy,
) -> Result<ImportBatch<Release>, ReconError> {
    let content = decode(bytes);
    let table = read_table(&content)?;

    let fields = &config.schemas.releases.fields;
    let columns = headers::resolve_columns(&table.headers, fields);
    headers::require(&columns, fields)?;

    let (records, defaulted_cells) =
        parse::parse_releases(&table.headers, &table.records, &columns, policy)?;
    if records.is_empty() {
        return Err(ReconError::NoRows);
    }

    Ok(ImportBatch { records, columns, defaulted_cells })
}
