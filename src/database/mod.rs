mod kline;
mod schema;

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;
use crate::stock_api::types::PricePoint;

pub use kline::DAILY_PERIOD;

/// SQLite store for daily bars behind an r2d2 pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|c| {
            c.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;",
            )?;
            c.busy_timeout(std::time::Duration::from_secs(5))?;
            Ok(())
        });

        let pool = Pool::builder().max_size(10).build(manager)?;
        Self::from_pool(pool)
    }

    /// Private in-memory database. Every pooled connection to `:memory:` is a
    /// separate database, so the pool holds exactly one.
    pub fn in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(SqliteConnectionManager::memory())?;
        Self::from_pool(pool)
    }

    fn from_pool(pool: Pool<SqliteConnectionManager>) -> Result<Self> {
        let db = Database { pool };
        let conn = db.get_conn()?;
        schema::init_tables(&conn)?;
        Ok(db)
    }

    fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn save_bars(&self, symbol: &str, bars: &[PricePoint]) -> Result<usize> {
        let conn = self.get_conn()?;
        Ok(kline::save_kline(&conn, symbol, DAILY_PERIOD, bars)?)
    }

    pub fn get_bars(&self, symbol: &str, limit: usize) -> Result<Vec<PricePoint>> {
        let conn = self.get_conn()?;
        Ok(kline::get_kline(&conn, symbol, DAILY_PERIOD, limit)?)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(date: &str, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 10_000,
            adj_close: None,
        }
    }

    #[test]
    fn test_save_and_load_bars() {
        let db = Database::in_memory().unwrap();
        let bars = vec![bar("2024-01-03", 12.0), bar("2024-01-02", 11.0), bar("2024-01-04", 13.0)];
        assert_eq!(db.save_bars("AAPL", &bars).unwrap(), 3);

        let loaded = db.get_bars("AAPL", 10).unwrap();
        let closes: Vec<f64> = loaded.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![11.0, 12.0, 13.0]);

        let recent = db.get_bars("AAPL", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].close, 12.0);

        assert!(db.get_bars("MSFT", 10).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_replaces_existing_date() {
        let db = Database::in_memory().unwrap();
        db.save_bars("AAPL", &[bar("2024-01-02", 11.0)]).unwrap();
        db.save_bars("AAPL", &[bar("2024-01-02", 15.5)]).unwrap();

        let loaded = db.get_bars("AAPL", 10).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].close, 15.5);
        assert_eq!(loaded[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
