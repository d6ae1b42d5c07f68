use rust_decimal::Decimal;

use crate::config::Rules;

/// Derived monetary fields for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub bruto: Decimal,
    pub comissao: Decimal,
    pub taxa_fixa: Decimal,
    pub repasse: Decimal,
    pub esperado: Decimal,
}

/// Compute gross, commission, fixed fee, rebate and net expected payout.
///
/// `esperado = bruto - comissao - taxa_fixa + repasse`, always. The rebate
/// applies only when the shipping method matches one of the configured
/// direct-delivery labels.
pub fn compute(unit_price: Decimal, qty: i64, metodo_envio: &str, rules: &Rules) -> Payout {
    let qty = Decimal::from(qty);
    let bruto = unit_price * qty;
    let comissao = bruto * rules.commission_rate;
    let taxa_fixa = qty * rules.per_unit_fee;

    let shipping = canon_label(metodo_envio);
    let direct = !shipping.is_empty()
        && rules
            .direct_delivery_labels
            .iter()
            .any(|label| canon_label(label) == shipping);
    let repasse = if direct {
        rules.direct_delivery_rebate
    } else {
        Decimal::ZERO
    };

    let esperado = bruto - comissao - taxa_fixa + repasse;
    Payout { bruto, comissao, taxa_fixa, repasse, esperado }
}

/// Canonical form for label comparison: trimmed, lowercased, internal
/// whitespace removed.
fn canon_label(s: &str) -> String {
    s.trim().to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn standard_shipping() {
        let p = compute(dec!(100), 2, "", &Rules::default());
        assert_eq!(p.bruto, dec!(200));
        assert_eq!(p.comissao, dec!(40));
        assert_eq!(p.taxa_fixa, dec!(8));
        assert_eq!(p.repasse, dec!(0));
        assert_eq!(p.esperado, dec!(152));
    }

    #[test]
    fn direct_delivery_earns_rebate() {
        let p = compute(dec!(100), 2, "Entrega Direta", &Rules::default());
        assert_eq!(p.repasse, dec!(8));
        assert_eq!(p.esperado, dec!(160));
    }

    #[test]
    fn label_match_ignores_case_and_spacing() {
        for label in ["entrega direta", "ENTREGA DIRETA", "  EntregaDireta  ", "entrega  direta"] {
            let p = compute(dec!(10), 1, label, &Rules::default());
            assert_eq!(p.repasse, dec!(8), "label {label:?}");
        }
    }

    #[test]
    fn other_shipping_methods_get_no_rebate() {
        for label in ["correios", "transportadora", "entrega", ""] {
            let p = compute(dec!(10), 1, label, &Rules::default());
            assert_eq!(p.repasse, dec!(0), "label {label:?}");
        }
    }

    #[test]
    fn zero_qty_or_price_reduces_to_rebate() {
        let rules = Rules::default();
        let p = compute(dec!(100), 0, "entrega direta", &rules);
        assert_eq!(p.bruto, dec!(0));
        assert_eq!(p.comissao, dec!(0));
        assert_eq!(p.taxa_fixa, dec!(0));
        assert_eq!(p.esperado, p.repasse);

        let p = compute(dec!(0), 5, "correios", &rules);
        assert_eq!(p.esperado, p.repasse - p.taxa_fixa);
    }

    #[test]
    fn esperado_identity_holds_for_custom_rules() {
        let rules = Rules {
            commission_rate: dec!(0.12),
            per_unit_fee: dec!(2.50),
            direct_delivery_rebate: dec!(5.00),
            direct_delivery_labels: vec!["drop-off".into()],
        };
        let p = compute(dec!(37.90), 3, "Drop-Off", &rules);
        assert_eq!(p.esperado, p.bruto - p.comissao - p.taxa_fixa + p.repasse);
        assert_eq!(p.repasse, dec!(5.00));
    }
}
