use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::model::{KpiSummary, ReconciledRow};

/// Reduce the reconciled set to summary totals. Every row contributes to
/// the sums; `order_count` counts distinct order identifiers.
pub fn compute_kpis(rows: &[ReconciledRow]) -> KpiSummary {
    let mut distinct: HashSet<&str> = HashSet::new();
    let mut bruto = Decimal::ZERO;
    let mut esperado = Decimal::ZERO;
    let mut liberado = Decimal::ZERO;
    let mut delta = Decimal::ZERO;

    for row in rows {
        distinct.insert(row.order_sn.as_str());
        bruto += row.bruto;
        esperado += row.esperado;
        liberado += row.liberado;
        delta += row.delta;
    }

    KpiSummary { order_count: distinct.len(), bruto, esperado, liberado, delta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SettlementStatus;
    use rust_decimal_macros::dec;

    fn row(order_sn: &str, bruto: Decimal, esperado: Decimal, liberado: Decimal) -> ReconciledRow {
        ReconciledRow {
            order_sn: order_sn.into(),
            item_name: String::new(),
            unit_price: Decimal::ZERO,
            qty: 0,
            metodo_envio: String::new(),
            bruto,
            comissao: Decimal::ZERO,
            taxa_fixa: Decimal::ZERO,
            repasse: Decimal::ZERO,
            esperado,
            liberado,
            delta: liberado - esperado,
            status: SettlementStatus::Pending,
        }
    }

    #[test]
    fn totals_over_all_rows() {
        let rows = vec![
            row("A1", dec!(200), dec!(152), dec!(152)),
            row("B2", dec!(100), dec!(76), dec!(0)),
        ];
        let kpis = compute_kpis(&rows);
        assert_eq!(kpis.order_count, 2);
        assert_eq!(kpis.bruto, dec!(300));
        assert_eq!(kpis.esperado, dec!(228));
        assert_eq!(kpis.liberado, dec!(152));
        assert_eq!(kpis.delta, dec!(-76));
    }

    #[test]
    fn duplicate_order_sn_counts_once_but_sums_twice() {
        let rows = vec![
            row("A1", dec!(200), dec!(152), dec!(152)),
            row("A1", dec!(200), dec!(152), dec!(152)),
        ];
        let kpis = compute_kpis(&rows);
        assert_eq!(kpis.order_count, 1);
        assert_eq!(kpis.bruto, dec!(400));
        assert_eq!(kpis.esperado, dec!(304));
    }

    #[test]
    fn empty_set_is_all_zero() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis.order_count, 0);
        assert_eq!(kpis.bruto, Decimal::ZERO);
        assert_eq!(kpis.delta, Decimal::ZERO);
    }
}
