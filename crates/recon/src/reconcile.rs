use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{Order, ReconciledRow, Release, SettlementStatus};

/// Sum credited amounts per order identifier. Orders with no matching
/// release simply have no entry; the join substitutes an exact zero.
pub fn aggregate_releases(releases: &[Release]) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for release in releases {
        *totals.entry(release.order_sn.clone()).or_insert(Decimal::ZERO) +=
            release.valor_creditado;
    }
    totals
}

/// Classify one order's settlement state. Evaluated on 2-decimal rounded
/// values; first matching rule wins, so exactly one status applies to any
/// `(liberado, esperado)` pair.
pub fn classify(liberado: Decimal, esperado: Decimal, tolerance: Decimal) -> SettlementStatus {
    let lib = liberado.round_dp(2);
    let exp = esperado.round_dp(2);

    if lib == Decimal::ZERO {
        return SettlementStatus::Pending;
    }
    if (lib - exp).abs() <= tolerance {
        return SettlementStatus::Released;
    }
    if lib > Decimal::ZERO && lib < exp - tolerance {
        return SettlementStatus::Partial;
    }
    if lib > exp + tolerance {
        return SettlementStatus::AboveExpected;
    }
    // Unrounded edge cases, e.g. negative expected with negative credits.
    SettlementStatus::NeedsReview
}

/// Left-join every order against the aggregated release totals. Each order
/// row appears exactly once regardless of how many releases matched.
///
/// Rows come back sorted by status, then order identifier — presentation
/// stability, not a business invariant.
pub fn reconcile(
    orders: &[Order],
    released: &BTreeMap<String, Decimal>,
    tolerance: Decimal,
) -> Vec<ReconciledRow> {
    let mut rows: Vec<ReconciledRow> = orders
        .iter()
        .map(|order| {
            let liberado = released.get(&order.order_sn).copied().unwrap_or(Decimal::ZERO);
            let delta = liberado - order.esperado;
            let status = classify(liberado, order.esperado, tolerance);
            ReconciledRow {
                order_sn: order.order_sn.clone(),
                item_name: order.item_name.clone(),
                unit_price: order.unit_price,
                qty: order.qty,
                metodo_envio: order.metodo_envio.clone(),
                bruto: order.bruto,
                comissao: order.comissao,
                taxa_fixa: order.taxa_fixa,
                repasse: order.repasse,
                esperado: order.esperado,
                liberado,
                delta,
                status,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.order_sn.cmp(&b.order_sn)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::payout;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.01);

    fn order(order_sn: &str, unit_price: Decimal, qty: i64, shipping: &str) -> Order {
        let p = payout::compute(unit_price, qty, shipping, &Rules::default());
        Order {
            order_sn: order_sn.into(),
            item_name: String::new(),
            unit_price,
            qty,
            metodo_envio: shipping.into(),
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
    fn aggregation_sums_per_order() {
        let releases = vec![
            release("A1", dec!(50.00)),
            release("A1", dec!(26.00)),
            release("B2", dec!(10.00)),
        ];
        let totals = aggregate_releases(&releases);
        assert_eq!(totals["A1"], dec!(76.00));
        assert_eq!(totals["B2"], dec!(10.00));
        assert_eq!(totals.get("C3"), None);
    }

    #[test]
    fn classify_tolerance_thresholds() {
        // esperado = 152 throughout
        let exp = dec!(152.00);
        assert_eq!(classify(dec!(0), exp, TOL), SettlementStatus::Pending);
        assert_eq!(classify(dec!(152.00), exp, TOL), SettlementStatus::Released);
        assert_eq!(classify(dec!(151.99), exp, TOL), SettlementStatus::Released);
        assert_eq!(classify(dec!(152.01), exp, TOL), SettlementStatus::Released);
        assert_eq!(classify(dec!(80.00), exp, TOL), SettlementStatus::Partial);
        assert_eq!(classify(dec!(151.98), exp, TOL), SettlementStatus::Partial);
        assert_eq!(classify(dec!(200.00), exp, TOL), SettlementStatus::AboveExpected);
        assert_eq!(classify(dec!(152.02), exp, TOL), SettlementStatus::AboveExpected);
    }

    #[test]
    fn classify_rounds_before_comparing() {
        // 151.996 rounds to 152.00, within tolerance of 152.00
        assert_eq!(
            classify(dec!(151.996), dec!(152.00), TOL),
            SettlementStatus::Released
        );
        // 0.004 rounds to 0.00 → pending, not a 0 < lib partial
        assert_eq!(classify(dec!(0.004), dec!(152.00), TOL), SettlementStatus::Pending);
    }

    #[test]
    fn classify_negative_expected_falls_to_review() {
        // qty > 0 with zero price makes esperado negative; a negative
        // credit lands in no other bucket.
        assert_eq!(
            classify(dec!(-5.00), dec!(-20.00), dec!(0.01)),
            SettlementStatus::AboveExpected
        );
        assert_eq!(
            classify(dec!(-30.00), dec!(-20.00), dec!(0.01)),
            SettlementStatus::NeedsReview
        );
    }

    #[test]
    fn classify_is_total_over_a_value_grid() {
        // Exactly one status for every pair: classify never panics and the
        // rule chain has a catch-all, so totality reduces to "returns".
        let values = [
            dec!(-10), dec!(0), dec!(0.005), dec!(0.01), dec!(10), dec!(151.99),
            dec!(152), dec!(152.01), dec!(152.02), dec!(300),
        ];
        for lib in values {
            for exp in values {
                let _ = classify(lib, exp, TOL);
            }
        }
    }

    #[test]
    fn join_keeps_every_order_once() {
        let orders = vec![
            order("A1", dec!(100), 2, ""),
            order("B2", dec!(50), 1, ""),
        ];
        let releases = vec![
            release("A1", dec!(76.00)),
            release("A1", dec!(76.00)),
        ];
        let rows = reconcile(&orders, &aggregate_releases(&releases), TOL);
        assert_eq!(rows.len(), 2, "two releases must not produce two rows");

        let a1 = rows.iter().find(|r| r.order_sn == "A1").unwrap();
        assert_eq!(a1.liberado, dec!(152.00));
        assert_eq!(a1.status, SettlementStatus::Released);

        let b2 = rows.iter().find(|r| r.order_sn == "B2").unwrap();
        assert_eq!(b2.liberado, dec!(0), "unmatched order gets exact zero");
        assert_eq!(b2.status, SettlementStatus::Pending);
    }

    #[test]
    fn delta_is_liberado_minus_esperado() {
        let orders = vec![order("A1", dec!(100), 2, "")]; // esperado 152
        let releases = vec![release("A1", dec!(80.00))];
        let rows = reconcile(&orders, &aggregate_releases(&releases), TOL);
        assert_eq!(rows[0].delta, dec!(-72.00));
        assert_eq!(rows[0].status, SettlementStatus::Partial);
    }

    #[test]
    fn rows_sort_by_status_then_order_sn() {
        let orders = vec![
            order("Z9", dec!(100), 2, ""), // pending
            order("A1", dec!(100), 2, ""), // released
            order("M5", dec!(100), 2, ""), // pending
            order("B2", dec!(100), 2, ""), // above expected
        ];
        let releases = vec![
            release("A1", dec!(152.00)),
            release("B2", dec!(200.00)),
        ];
        let rows = reconcile(&orders, &aggregate_releases(&releases), TOL);
        let order_sns: Vec<&str> = rows.iter().map(|r| r.order_sn.as_str()).collect();
        // Lexical by status name: ABOVE_EXPECTED < PENDING < RELEASED
        assert_eq!(order_sns, vec!["B2", "M5", "Z9", "A1"]);
    }

    #[test]
    fn duplicate_order_sn_rows_both_join_the_same_total() {
        let orders = vec![
            order("A1", dec!(100), 2, ""),
            order("A1", dec!(100), 2, ""),
        ];
        let releases = vec![release("A1", dec!(152.00))];
        let rows = reconcile(&orders, &aggregate_releases(&releases), TOL);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.liberado == dec!(152.00)));
    }
}
