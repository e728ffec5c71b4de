use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};

use crate::stock_api::types::PricePoint;
use crate::stock_api::utils::{format_date, parse_date};

pub const DAILY_PERIOD: &str = "daily";

fn parse_column_date(idx: usize, raw: &str) -> Result<NaiveDate> {
    parse_date(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

pub fn save_kline(conn: &Connection, symbol: &str, period: &str, data: &[PricePoint]) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let mut count = 0;

    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO stock_kline
         (symbol, period, date, open, high, low, close, volume, adj_close, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                 COALESCE((SELECT created_at FROM stock_kline WHERE symbol = ?1 AND period = ?2 AND date = ?3), ?10),
                 ?10)",
    )?;

    for item in data {
        stmt.execute(params![
            symbol,
            period,
            format_date(&item.date),
            item.open,
            item.high,
            item.low,
            item.close,
            item.volume,
            item.adj_close,
            now
        ])?;
        count += 1;
    }

    Ok(count)
}

/// The most recent `limit` bars, returned ascending by date.
pub fn get_kline(conn: &Connection, symbol: &str, period: &str, limit: usize) -> Result<Vec<PricePoint>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        "SELECT date, open, high, low, close, volume, adj_close
         FROM stock_kline
         WHERE symbol = ?1 AND period = ?2
         ORDER BY date DESC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(params![symbol, period, limit], |row| {
        let raw_date: String = row.get(0)?;
        Ok(PricePoint {
            date: parse_column_date(0, &raw_date)?,
            open: row.get(1)?,
            high: row.get(2)?,
            low: row.get(3)?,
            close: row.get(4)?,
            volume: row.get(5)?,
            adj_close: row.get(6)?,
        })
    })?;

    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    data.reverse();
    Ok(data)
}
