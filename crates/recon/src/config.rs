use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Full engine configuration. Every section has built-in defaults, so an
/// empty TOML document (or no config file at all) yields a working setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: Rules,
    pub tolerance: Tolerance,
    pub schemas: Schemas,
}

// ---------------------------------------------------------------------------
// Payout rules
// ---------------------------------------------------------------------------

/// Marketplace fee schedule. These change over time, so they are config,
/// never constants in code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Commission charged on the gross amount (0.20 = 20%).
    pub commission_rate: Decimal,
    /// Fixed fee charged per unit sold, in currency units.
    pub per_unit_fee: Decimal,
    /// Flat credit applied when the shipping method is direct delivery.
    pub direct_delivery_rebate: Decimal,
    /// Shipping-method labels that qualify for the rebate. Compared after
    /// trimming, lowercasing and stripping internal whitespace.
    pub direct_delivery_labels: Vec<String>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            commission_rate: dec!(0.20),
            per_unit_fee: dec!(4.00),
            direct_delivery_rebate: dec!(8.00),
            direct_delivery_labels: vec!["entrega direta".into(), "entregadireta".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Released == expected when they differ by at most this much.
    pub amount: Decimal,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { amount: dec!(0.01) }
    }
}

// ---------------------------------------------------------------------------
// Import schemas
// ---------------------------------------------------------------------------

/// One schema per import kind, each listing the canonical fields it expects
/// and the raw header spellings that map onto them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Schemas {
    pub orders: ImportSchema,
    pub releases: ImportSchema,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportSchema {
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Canonical field name (e.g. `order_sn`).
    pub name: String,
    /// Known header spellings, in priority order. The first exact match wins.
    pub synonyms: Vec<String>,
    /// Required fields fail the whole import when unmatched.
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &str, synonyms: &[&str], required: bool) -> Self {
        Self {
            name: name.into(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            required,
        }
    }
}

impl Default for Schemas {
    fn default() -> Self {
        let order_sn_synonyms = [
            "order_sn",
            "id do pedido",
            "pedido",
            "order id",
            "order number",
            "order no",
        ];
        Self {
            orders: ImportSchema {
                fields: vec![
                    FieldSpec::new("order_sn", &order_sn_synonyms, true),
                    FieldSpec::new(
                        "item_name",
                        &["item_name", "nome do produto", "produto", "item"],
                        false,
                    ),
                    FieldSpec::new(
                        "unit_price",
                        &[
                            "unit_price",
                            "preço acordado",
                            "preco acordado",
                            "price",
                            "unit price",
                            "preço",
                            "valor do produto",
                        ],
                        true,
                    ),
                    FieldSpec::new(
                        "qty",
                        &[
                            "qty",
                            "quantidade",
                            "qtd",
                            "número de produtos pedidos",
                            "numero de produtos pedidos",
                            "quantity",
                        ],
                        true,
                    ),
                    FieldSpec::new(
                        "metodo_envio",
                        &["metodo_envio", "método de envio", "shipping method", "envio", "logística"],
                        false,
                    ),
                ],
            },
            releases: ImportSchema {
                fields: vec![
                    FieldSpec::new("order_sn", &order_sn_synonyms, true),
                    FieldSpec::new(
                        "valor_creditado",
                        &[
                            "valor_creditado",
                            "valor",
                            "valor lançado",
                            "valor lancado",
                            "amount",
                            "credit",
                            "released",
                        ],
                        true,
                    ),
                    FieldSpec::new("batch", &["batch", "lote", "ciclo", "settlement id"], false),
                    FieldSpec::new(
                        "data_release",
                        &["data_release", "data", "release date", "payment date"],
                        false,
                    ),
                ],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.rules.commission_rate < Decimal::ZERO || self.rules.commission_rate > Decimal::ONE
        {
            return Err(ReconError::ConfigValidation(format!(
                "commission_rate must be between 0 and 1, got {}",
                self.rules.commission_rate
            )));
        }
        if self.rules.per_unit_fee < Decimal::ZERO {
            return Err(ReconError::ConfigValidation("per_unit_fee must be >= 0".into()));
        }
        if self.rules.direct_delivery_rebate < Decimal::ZERO {
            return Err(ReconError::ConfigValidation(
                "direct_delivery_rebate must be >= 0".into(),
            ));
        }
        if self.tolerance.amount < Decimal::ZERO {
            return Err(ReconError::ConfigValidation("tolerance must be >= 0".into()));
        }

        validate_schema("orders", &self.schemas.orders)?;
        validate_schema("releases", &self.schemas.releases)?;
        Ok(())
    }
}

fn validate_schema(kind: &str, schema: &ImportSchema) -> Result<(), ReconError> {
    if schema.fields.is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "schema '{kind}' has no fields"
        )));
    }

    let mut seen: Vec<&str> = Vec::new();
    for field in &schema.fields {
        if field.name.is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "schema '{kind}' has a field with an empty name"
            )));
        }
        if seen.contains(&field.name.as_str()) {
            return Err(ReconError::ConfigValidation(format!(
                "schema '{kind}': duplicate field '{}'",
                field.name
            )));
        }
        seen.push(&field.name);

        if field.synonyms.iter().all(|s| s.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(format!(
                "schema '{kind}': field '{}' has no usable synonyms",
                field.name
            )));
        }
    }

    // The join key must exist; without it nothing can be reconciled.
    if !schema.fields.iter().any(|f| f.name == "order_sn" && f.required) {
        return Err(ReconError::ConfigValidation(format!(
            "schema '{kind}' must have a required 'order_sn' field"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
