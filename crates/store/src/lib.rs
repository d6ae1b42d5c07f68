// Order/release snapshot store using SQLite

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use marketpay_recon::model::{Order, Release};
use marketpay_recon::reconcile::aggregate_releases;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_sn TEXT NOT NULL,
    item_name TEXT NOT NULL DEFAULT '',
    unit_price TEXT NOT NULL,      -- decimal, canonical text form
    qty INTEGER NOT NULL,
    metodo_envio TEXT NOT NULL DEFAULT '',
    bruto TEXT NOT NULL,
    comissao TEXT NOT NULL,
    taxa_fixa TEXT NOT NULL,
    repasse TEXT NOT NULL,
    esperado TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS releases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_sn TEXT NOT NULL,
    valor_creditado TEXT NOT NULL, -- decimal, canonical text form
    batch TEXT,
    data_release TEXT
);
"#;

/// Persistent store holding exactly one snapshot of each table. Imports
/// replace a whole table; reports only read. Assumes a single importer at
/// a time — concurrent imports race at the table level.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }

    /// Replace the whole orders snapshot: delete-all-then-insert inside one
    /// transaction, so a failed import leaves the previous snapshot intact.
    pub fn replace_orders(&mut self, orders: &[Order]) -> Result<usize, String> {
        let tx = self.conn.transaction().map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM orders", []).map_err(|e| e.to_string())?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO orders (order_sn, item_name, unit_price, qty, metodo_envio, \
                     bruto, comissao, taxa_fixa, repasse, esperado) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )
                .map_err(|e| e.to_string())?;
            for o in orders {
                stmt.execute(params![
                    o.order_sn,
                    o.item_name,
                    o.unit_price.to_string(),
                    o.qty,
                    o.metodo_envio,
                    o.bruto.to_string(),
                    o.comissao.to_string(),
                    o.taxa_fixa.to_string(),
                    o.repasse.to_string(),
                    o.esperado.to_string(),
                ])
                .map_err(|e| e.to_string())?;
            }
        }
        tx.commit().map_err(|e| e.to_string())?;
        Ok(orders.len())
    }

    /// Replace the whole releases snapshot. Same transaction semantics as
    /// [`Store::replace_orders`].
    pub fn replace_releases(&mut self, releases: &[Release]) -> Result<usize, String> {
        let tx = self.conn.transaction().map_err(|e| e.to_string())?;
        tx.execute("DELETE FROM releases", []).map_err(|e| e.to_string())?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO releases (order_sn, valor_creditado, batch, data_release) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| e.to_string())?;
            for r in releases {
                stmt.execute(params![
                    r.order_sn,
                    r.valor_creditado.to_string(),
                    r.batch,
                    r.data_release,
                ])
                .map_err(|e| e.to_string())?;
            }
        }
        tx.commit().map_err(|e| e.to_string())?;
        Ok(releases.len())
    }

    pub fn load_orders(&self) -> Result<Vec<Order>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT order_sn, item_name, unit_price, qty, metodo_envio, \
                 bruto, comissao, taxa_fixa, repasse, esperado \
                 FROM orders ORDER BY id",
            )
            .map_err(|e| e.to_string())?;

        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                ))
            })
            .map_err(|e| e.to_string())?;

        let mut orders = Vec::new();
        for raw in raw_rows {
            let (order_sn, item_name, unit_price, qty, metodo_envio, bruto, comissao, taxa_fixa, repasse, esperado) =
                raw.map_err(|e| e.to_string())?;
            orders.push(Order {
                order_sn,
                item_name,
                unit_price: dec(&unit_price)?,
                qty,
                metodo_envio,
                bruto: dec(&bruto)?,
                comissao: dec(&comissao)?,
                taxa_fixa: dec(&taxa_fixa)?,
                repasse: dec(&repasse)?,
                esperado: dec(&esperado)?,
            });
        }
        Ok(orders)
    }

    pub fn load_releases(&self) -> Result<Vec<Release>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT order_sn, valor_creditado, batch, data_release \
                 FROM releases ORDER BY id",
            )
            .map_err(|e| e.to_string())?;

        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(|e| e.to_string())?;

        let mut releases = Vec::new();
        for raw in raw_rows {
            let (order_sn, valor_creditado, batch, data_release) = raw.map_err(|e| e.to_string())?;
            releases.push(Release {
                order_sn,
                valor_creditado: dec(&valor_creditado)?,
                batch,
                data_release,
            });
        }
        Ok(releases)
    }

    /// Aggregated release view for the report path: total credited per
    /// order id. Summed over `Decimal`, not SQL floats, so totals stay
    /// exact.
    pub fn release_totals(&self) -> Result<BTreeMap<String, Decimal>, String> {
        Ok(aggregate_releases(&self.load_releases()?))
    }

    pub fn order_count(&self) -> Result<usize, String> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
            .map_err(|e| e.to_string())?;
        Ok(count as usize)
    }
}

fn dec(s: &str) -> Result<Decimal, String> {
    Decimal::from_str(s).map_err(|e| format!("bad decimal '{s}' in store: {e}"))
}
