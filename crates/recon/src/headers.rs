use std::collections::BTreeMap;

use crate::config::FieldSpec;
use crate::error::ReconError;

/// Resolution of canonical field names against a raw header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Canonical field name → source header as it appeared in the file.
    pub matched: BTreeMap<String, String>,
    /// Canonical fields with no matching header.
    pub unmatched: Vec<String>,
}

impl ColumnMap {
    pub fn source(&self, field: &str) -> Option<&str> {
        self.matched.get(field).map(|s| s.as_str())
    }
}

/// Map canonical fields onto raw headers. Case-insensitive throughout.
///
/// Stage 1: scan each field's synonyms in priority order; the first synonym
/// with an exact match against any header wins immediately.
/// Stage 2: approximate fallback — first header (in encounter order) that
/// contains any synonym as a substring, both sides whitespace-stripped.
pub fn resolve_columns(headers: &[String], fields: &[FieldSpec]) -> ColumnMap {
    let lower: Vec<(String, &String)> = headers.iter().map(|h| (h.to_lowercase(), h)).collect();

    let mut matched = BTreeMap::new();
    let mut unmatched = Vec::new();

    for field in fields {
        let mut found: Option<&String> = None;

        'exact: for synonym in &field.synonyms {
            let synonym = synonym.to_lowercase();
            for (header_lower, header) in &lower {
                if *header_lower == synonym {
                    found = Some(header);
                    break 'exact;
                }
            }
        }

        if found.is_none() {
            'fallback: for (header_lower, header) in &lower {
                let header_stripped = strip_whitespace(header_lower);
                for synonym in &field.synonyms {
                    let synonym_stripped = strip_whitespace(&synonym.to_lowercase());
                    if !synonym_stripped.is_empty() && header_stripped.contains(&synonym_stripped)
                    {
                        found = Some(header);
                        break 'fallback;
                    }
                }
            }
        }

        match found {
            Some(header) => {
                matched.insert(field.name.clone(), header.clone());
            }
            None => unmatched.push(field.name.clone()),
        }
    }

    ColumnMap { matched, unmatched }
}

/// Check every required field at once so the error names all missing
/// columns, not just the first.
pub fn require(map: &ColumnMap, fields: &[FieldSpec]) -> Result<(), ReconError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| f.required && !map.matched.contains_key(&f.name))
        .map(|f| f.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReconError::Mapping { missing })
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
