use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// File missing, unreadable or empty.
    FileRead(String),
    /// Required canonical columns could not be resolved from the header row.
    Mapping { missing: Vec<String> },
    /// File parsed but produced zero usable rows.
    NoRows,
    /// CSV structural error.
    Csv(String),
    /// Malformed numeric cell under the strict coercion policy.
    BadCell { row: usize, field: String, value: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad rate, empty synonym list, etc.).
    ConfigValidation(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileRead(msg) => write!(f, "cannot read file: {msg}"),
            Self::Mapping { missing } => {
                write!(f, "could not map required column(s): {}", missing.join(", "))
            }
            Self::NoRows => write!(f, "no usable rows found"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::BadCell { row, field, value } => {
                write!(f, "row {row}: cannot parse {field} value '{value}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
