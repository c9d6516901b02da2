//! # Usage Report
//!
//! Aggregates issued (OUT) quantities per item and department for a period.
//! Rendering and CSV export are left to the presentation layer.
//!
//! Timestamps are stored in UTC; periods are local calendar months, so an
//! issue at 08:00 JST on 1 May belongs to May.

use std::collections::BTreeMap;

use chrono::{Datelike, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::types::{Id, TransactionRecord, TransactionType};

/// Usage of one item across departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRow {
    pub item_id: Id,
    pub by_department: BTreeMap<Id, i64>,
    pub total: i64,
}

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Japan Standard Time (+09:00), the offset the stations operate in.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Sums OUT quantities for `year` (and `month`, 1-12, when given), with the
/// period read in `offset` local time.
///
/// Only items with at least one matching movement appear; rows are ordered
/// by item id.
pub fn usage_by_department(
    transactions: &[TransactionRecord],
    year: i32,
    month: Option<u32>,
    offset: FixedOffset,
) -> Vec<UsageRow> {
    let mut rows: BTreeMap<Id, UsageRow> = BTreeMap::new();

    let in_period = |tx: &TransactionRecord| {
        let local = tx.timestamp.with_timezone(&offset);
        local.year() == year && month.map_or(true, |m| local.month() == m)
    };

    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Out)
        .filter(|tx| in_period(tx))
    {
        let row = rows.entry(tx.item_id).or_insert_with(|| UsageRow {
            item_id: tx.item_id,
            by_department: BTreeMap::new(),
            total: 0,
        });
        *row.by_department.entry(tx.department_id).or_insert(0) += tx.quantity;
        row.total += tx.quantity;
    }

    rows.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(id: Id, dept: Id, item: Id, kind: TransactionType, qty: i64, y: i32, m: u32) -> TransactionRecord {
        TransactionRecord {
            id,
            department_id: dept,
            item_id: item,
            kind,
            quantity: qty,
            expiry_date: None,
            remarks: None,
            timestamp: Utc.with_ymd_and_hms(y, m, 15, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_sums_out_only() {
        let txs = vec![
            tx(1, 1, 5, TransactionType::Out, 2, 2026, 3),
            tx(2, 2, 5, TransactionType::Out, 3, 2026, 3),
            tx(3, 1, 5, TransactionType::In, 10, 2026, 3),
            tx(4, 1, 7, TransactionType::Out, 1, 2026, 4),
        ];

        let rows = usage_by_department(&txs, 2026, None, jst());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item_id, 5);
        assert_eq!(rows[0].total, 5);
        assert_eq!(rows[0].by_department[&2], 3);
    }

    #[test]
    fn test_month_filter() {
        let txs = vec![
            tx(1, 1, 5, TransactionType::Out, 2, 2026, 3),
            tx(2, 1, 7, TransactionType::Out, 1, 2026, 4),
            tx(3, 1, 7, TransactionType::Out, 1, 2025, 4),
        ];

        let rows = usage_by_department(&txs, 2026, Some(4), jst());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, 7);
        assert_eq!(rows[0].total, 1);
    }

    #[test]
    fn test_month_boundary_uses_local_time() {
        let mut issued = tx(1, 1, 5, TransactionType::Out, 1, 2026, 5);
        issued.timestamp = jst()
            .with_ymd_and_hms(2026, 5, 1, 8, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let txs = vec![issued];

        assert_eq!(usage_by_department(&txs, 2026, Some(5), jst()).len(), 1);
        assert!(usage_by_department(&txs, 2026, Some(4), jst()).is_empty());
        assert_eq!(usage_by_department(&txs, 2026, Some(4), Utc.fix()).len(), 1);
    }
}
