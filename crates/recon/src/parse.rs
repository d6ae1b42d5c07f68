use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::Rules;
use crate::error::ReconError;
use crate::headers::ColumnMap;
use crate::model::{Order, Release};
use crate::payout;

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Per-cell coercion outcome: the value plus whether the default was
/// substituted for an empty or unparsable cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coerced<T> {
    pub value: T,
    pub defaulted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercePolicy {
    /// Malformed numeric cells become zero. Empty cells always do.
    Lenient,
    /// Malformed (non-empty, unparsable) numeric cells fail the import.
    Strict,
}

/// Parse a decimal cell. Accepts both `1234.56` and pt-BR style
/// `1.234,56`; anything else defaults to zero.
pub fn coerce_decimal(raw: &str) -> Coerced<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced { value: Decimal::ZERO, defaulted: true };
    }
    if let Ok(value) = trimmed.parse::<Decimal>() {
        return Coerced { value, defaulted: false };
    }
    if let Some(normalized) = normalize_decimal_comma(trimmed) {
        if let Ok(value) = normalized.parse::<Decimal>() {
            return Coerced { value, defaulted: false };
        }
    }
    Coerced { value: Decimal::ZERO, defaulted: true }
}

/// Rewrite a decimal-comma cell (`1.234,56`) into `1234.56`. Applies only
/// when the comma really is the decimal point: it is the last separator in
/// the cell and carries at most two digits after it. English
/// thousands-grouped cells like `1,234.56` or `1,234` stay unrecognized
/// rather than being misread a thousandfold off.
fn normalize_decimal_comma(s: &str) -> Option<String> {
    let comma = s.rfind(',')?;
    let after = &s[comma + 1..];
    if after.contains('.') {
        return None;
    }
    if after.is_empty() || after.len() > 2 || !after.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        s.chars()
            .filter(|c| *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect(),
    )
}

/// Parse a quantity cell. Fractional values truncate toward zero.
pub fn coerce_qty(raw: &str) -> Coerced<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced { value: 0, defaulted: true };
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Coerced { value, defaulted: false };
    }
    let decimal = coerce_decimal(trimmed);
    if !decimal.defaulted {
        if let Some(value) = decimal.value.trunc().to_i64() {
            return Coerced { value, defaulted: false };
        }
    }
    Coerced { value: 0, defaulted: true }
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Parse every raw row into an [`Order`], computing the derived payout
/// fields as rows come in. Returns the records plus how many numeric
/// cells fell back to their default.
pub fn parse_orders(
    headers: &[String],
    records: &[csv::StringRecord],
    map: &ColumnMap,
    rules: &Rules,
    policy: CoercePolicy,
) -> Result<(Vec<Order>, usize), ReconError> {
    let sn_idx = col_idx(headers, map, "order_sn");
    let item_idx = col_idx(headers, map, "item_name");
    let price_idx = col_idx(headers, map, "unit_price");
    let qty_idx = col_idx(headers, map, "qty");
    let shipping_idx = col_idx(headers, map, "metodo_envio");

    let mut orders = Vec::with_capacity(records.len());
    let mut defaulted_cells = 0usize;

    for (row_no, record) in records.iter().enumerate() {
        let unit_price = coerce_money_cell(
            cell(record, price_idx),
            row_no,
            "unit_price",
            policy,
            &mut defaulted_cells,
        )?;

        let qty_raw = cell(record, qty_idx);
        let qty = coerce_qty(qty_raw);
        if qty.defaulted {
            if policy == CoercePolicy::Strict && !qty_raw.trim().is_empty() {
                return Err(ReconError::BadCell {
                    row: row_no + 1,
                    field: "qty".into(),
                    value: qty_raw.trim().into(),
                });
            }
            defaulted_cells += 1;
        }

        let metodo_envio = cell(record, shipping_idx).trim().to_string();
        let p = payout::compute(unit_price, qty.value, &metodo_envio, rules);

        orders.push(Order {
            order_sn: cell(record, sn_idx).trim().to_string(),
            item_name: cell(record, item_idx).trim().to_string(),
            unit_price,
            qty: qty.value,
            metodo_envio,
            bruto: p.bruto,
            comissao: p.comissao,
            taxa_fixa: p.taxa_fixa,
            repasse: p.repasse,
            esperado: p.esperado,
        });
    }

    Ok((orders, defaulted_cells))
}

/// Parse every raw row into a [`Release`].
pub fn parse_releases(
    headers: &[String],
    records: &[csv::StringRecord],
    map: &ColumnMap,
    policy: CoercePolicy,
) -> Result<(Vec<Release>, usize), ReconError> {
    let sn_idx = col_idx(headers, map, "order_sn");
    let amount_idx = col_idx(headers, map, "valor_creditado");
    let batch_idx = col_idx(headers, map, "batch");
    let date_idx = col_idx(headers, map, "data_release");

    let mut releases = Vec::with_capacity(records.len());
    let mut defaulted_cells = 0usize;

    for (row_no, record) in records.iter().enumerate() {
        let valor_creditado = coerce_money_cell(
            cell(record, amount_idx),
            row_no,
            "valor_creditado",
            policy,
            &mut defaulted_cells,
        )?;

        releases.push(Release {
            order_sn: cell(record, sn_idx).trim().to_string(),
            valor_creditado,
            batch: optional_cell(record, batch_idx),
            data_release: optional_cell(record, date_idx),
        });
    }

    Ok((releases, defaulted_cells))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn col_idx(headers: &[String], map: &ColumnMap, field: &str) -> Option<usize> {
    map.source(field)
        .and_then(|source| headers.iter().position(|h| h == source))
}

fn cell<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn optional_cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let value = cell(record, idx).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn coerce_money_cell(
    raw: &str,
    row_no: usize,
    field: &str,
    policy: CoercePolicy,
    defaulted_cells: &mut usize,
) -> Result<Decimal, ReconError> {
    let coerced = coerce_decimal(raw);
    if coerced.defaulted {
        if policy == CoercePolicy::Strict && !raw.trim().is_empty() {
            return Err(ReconError::BadCell {
                row: row_no + 1,
                field: field.into(),
                value: raw.trim().into(),
            });
        }
        *defaulted_cells += 1;
    }
    Ok(coerced.value)
}
