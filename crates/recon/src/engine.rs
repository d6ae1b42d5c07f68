use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::kpi::compute_kpis;
use crate::model::{Order, Release, Report, ReportMeta};
use crate::reconcile::{aggregate_releases, reconcile};

/// Build the full reconciliation report from loaded records.
pub fn report(orders: &[Order], releases: &[Release], tolerance: Decimal) -> Report {
    let totals = aggregate_releases(releases);
    report_with_totals(orders, &totals, tolerance)
}

/// Variant taking pre-aggregated release totals, e.g. from the store's
/// grouped read path.
pub fn report_with_totals(
    orders: &[Order],
    released: &BTreeMap<String, Decimal>,
    tolerance: Decimal,
) -> Report {
    let rows = reconcile(orders, released, tolerance);
    let kpis = compute_kpis(&rows);
    Report {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        kpis,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::model::SettlementStatus;
    use crate::payout;
    use rust_decimal_macros::dec;

    fn order(order_sn: &str, unit_price: Decimal, qty: i64) -> Order {
        let p = payout::compute(unit_price, qty, "", &Rules::default());
        Order {
            order_sn: order_sn.into(),
            item_name: String::new(),
            unit_price,
            qty,
            metodo_envio: String::new(),
            bruto: p.bruto,
            comissao: p.comissao,
            taxa_fixa: p.taxa_fixa,
            repasse: p.repasse,
            esperado: p.esperado,
        }
    }

    fn release(order_sn: &str, amount: Decimal) -> Release {
        Release {
            order_sn: order_sn.into(),
            valor_creditado: amount,
            batch: None,
            data_release: None,
        }
    }

    #[test]
    fn report_assembles_rows_and_kpis() {
        let orders = vec![order("A1", dec!(100), 2), order("B2", dec!(50), 1)];
        let releases = vec![release("A1", dec!(152.00))];

        let report = report(&orders, &releases, dec!(0.01));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.kpis.order_count, 2);
        assert_eq!(report.kpis.esperado, dec!(188.00)); // 152 + 36
        assert_eq!(report.kpis.liberado, dec!(152.00));
        assert_eq!(report.kpis.delta, dec!(-36.00));
        assert!(!report.meta.engine_version.is_empty());
        assert!(!report.meta.run_at.is_empty());
    }

    #[test]
    fn report_statuses_cover_pending_and_released() {
        let orders = vec![order("A1", dec!(100), 2), order("B2", dec!(50), 1)];
        let releases = vec![release("A1", dec!(152.00))];
        let report = report(&orders, &releases, dec!(0.01));

        let by_sn = |sn: &str| report.rows.iter().find(|r| r.order_sn == sn).unwrap();
        assert_eq!(by_sn("A1").status, SettlementStatus::Released);
        assert_eq!(by_sn("B2").status, SettlementStatus::Pending);
    }

    #[test]
    fn empty_release_set_leaves_everything_pending() {
        let orders = vec![order("A1", dec!(100), 2)];
        let report = report(&orders, &[], dec!(0.01));
        assert_eq!(report.rows[0].status, SettlementStatus::Pending);
        assert_eq!(report.rows[0].liberado, Decimal::ZERO);
        assert_eq!(report.kpis.liberado, Decimal::ZERO);
    }
}
