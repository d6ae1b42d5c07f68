//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of
//! the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args)                         |
//! | 3    | File read error (missing/unreadable/empty file)    |
//! | 4    | Mapping error (required columns unresolved)        |
//! | 5    | No usable rows (nothing imported / nothing stored) |
//! | 6    | Store error (SQLite open/read/write failure)       |
//! | 7    | Invalid config (TOML parse or validation)          |

use marketpay_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// File missing, unreadable or empty - user must re-select a file.
pub const EXIT_FILE_READ: u8 = 3;

/// Required canonical columns unresolved - user must fix the file header.
pub const EXIT_MAPPING: u8 = 4;

/// File parsed but produced zero usable rows; nothing was persisted.
pub const EXIT_NO_ROWS: u8 = 5;

/// Record store failure (open, schema, read or write).
pub const EXIT_STORE: u8 = 6;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::FileRead(_) => EXIT_FILE_READ,
        ReconError::Mapping { .. } => EXIT_MAPPING,
        ReconError::NoRows => EXIT_NO_ROWS,
        ReconError::Csv(_) | ReconError::BadCell { .. } => EXIT_FILE_READ,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
    }
}
