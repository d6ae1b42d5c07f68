use rust_decimal::Decimal;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

/// One marketplace order row. The five monetary fields after `metodo_envio`
/// are derived at parse time from the fee rules; `esperado` is always
/// `bruto - comissao - taxa_fixa + repasse`, never stored independently.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub order_sn: String,
    pub item_name: String,
    pub unit_price: Decimal,
    pub qty: i64,
    pub metodo_envio: String,
    pub bruto: Decimal,
    pub comissao: Decimal,
    pub taxa_fixa: Decimal,
    pub repasse: Decimal,
    pub esperado: Decimal,
}

/// One settlement/release row: an amount the marketplace actually credited.
#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub order_sn: String,
    pub valor_creditado: Decimal,
    pub batch: Option<String>,
    pub data_release: Option<String>,
}

// ---------------------------------------------------------------------------
// Settlement status
// ---------------------------------------------------------------------------

/// Per-order settlement classification.
///
/// Variants are declared in the lexical order of their display names;
/// report row ordering relies on the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    AboveExpected,
    NeedsReview,
    Partial,
    Pending,
    Released,
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AboveExpected => write!(f, "ABOVE_EXPECTED"),
            Self::NeedsReview => write!(f, "NEEDS_REVIEW"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Pending => write!(f, "PENDING"),
            Self::Released => write!(f, "RELEASED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciled view
// ---------------------------------------------------------------------------

/// An order joined with the sum of its matching releases. Computed per
/// report request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledRow {
    pub order_sn: String,
    pub item_name: String,
    pub unit_price: Decimal,
    pub qty: i64,
    pub metodo_envio: String,
    pub bruto: Decimal,
    pub comissao: Decimal,
    pub taxa_fixa: Decimal,
    pub repasse: Decimal,
    pub esperado: Decimal,
    /// Sum of all credited amounts for this order id; exact 0 when none.
    pub liberado: Decimal,
    /// `liberado - esperado`; sign indicates under/over payment.
    pub delta: Decimal,
    pub status: SettlementStatus,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Totals over the reconciled set. A duplicate `order_sn` present as two
/// order rows contributes twice to the sums but once to `order_count`.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    pub order_count: usize,
    pub bruto: Decimal,
    pub esperado: Decimal,
    pub liberado: Decimal,
    pub delta: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub kpis: KpiSummary,
    pub rows: Vec<ReconciledRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
}
