//! Merchant/day aggregation
//!
//! The fold is commutative and associative over batches, so worker
//! interleaving never changes the final totals: any partition of the input
//! rows into batches, folded locally and merged in any order, produces the
//! same map.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::store::TransactionRow;

/// Aggregation bucket: one merchant on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettlementKey {
    pub merchant_id: String,
    pub day: NaiveDate,
}

/// Running totals for one bucket. Sums are i64 cents; inputs are assumed
/// to fit. Negative fees are not rejected, so net may exceed gross.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayTotals {
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub txn_count: i64,
}

impl DayTotals {
    fn add(&mut self, amount_cents: i64, fee_cents: i64) {
        self.gross_cents += amount_cents;
        self.fee_cents += fee_cents;
        self.net_cents += amount_cents - fee_cents;
        self.txn_count += 1;
    }

    fn absorb(&mut self, other: DayTotals) {
        self.gross_cents += other.gross_cents;
        self.fee_cents += other.fee_cents;
        self.net_cents += other.net_cents;
        self.txn_count += other.txn_count;
    }
}

pub type SettlementMap = FxHashMap<SettlementKey, DayTotals>;

/// Fold one batch into a fresh worker-local map.
pub fn fold_batch(batch: &[TransactionRow]) -> SettlementMap {
    let mut local = SettlementMap::default();
    for t in batch {
        let key = SettlementKey {
            merchant_id: t.merchant_id.clone(),
            day: t.paid_at.date_naive(),
        };
        local
            .entry(key)
            .or_default()
            .add(t.amount_cents, t.fee_cents);
    }
    local
}

/// Merge a worker-local map into the global one. Called once per batch so
/// the shared map is touched once per batch, not once per row.
pub fn merge_into(global: &mut SettlementMap, local: SettlementMap) {
    for (key, totals) in local {
        global.entry(key).or_default().absorb(totals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn txn(id: i64, merchant: &str, amount: i64, fee: i64, paid_at: &str) -> TransactionRow {
        TransactionRow {
            id,
            merchant_id: merchant.to_string(),
            amount_cents: amount,
            fee_cents: fee,
            status: "PAID".to_string(),
            paid_at: paid_at.parse().unwrap(),
        }
    }

    fn key(merchant: &str, y: i32, m: u32, d: u32) -> SettlementKey {
        SettlementKey {
            merchant_id: merchant.to_string(),
            day: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    #[test]
    fn fold_matches_row_by_row_sums() {
        let rows = vec![
            txn(1, "A", 1000, 30, "2025-01-10T09:00:00Z"),
            txn(2, "A", 500, 15, "2025-01-10T18:30:00Z"),
            txn(3, "B", 200, 6, "2025-01-11T00:00:00Z"),
        ];
        let map = fold_batch(&rows);

        assert_eq!(
            map[&key("A", 2025, 1, 10)],
            DayTotals {
                gross_cents: 1500,
                fee_cents: 45,
                net_cents: 1455,
                txn_count: 2
            }
        );
        assert_eq!(
            map[&key("B", 2025, 1, 11)],
            DayTotals {
                gross_cents: 200,
                fee_cents: 6,
                net_cents: 194,
                txn_count: 1
            }
        );
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn totals_are_invariant_under_batch_partitioning() {
        let rows: Vec<TransactionRow> = (0..100)
            .map(|i| {
                txn(
                    i,
                    if i % 3 == 0 { "A" } else { "B" },
                    100 + i,
                    i % 7,
                    "2025-01-10T12:00:00Z",
                )
            })
            .collect();

        // One big batch vs. many small ones merged in reverse order.
        let whole = fold_batch(&rows);

        let mut merged = SettlementMap::default();
        for chunk in rows.chunks(7).rev() {
            merge_into(&mut merged, fold_batch(chunk));
        }

        assert_eq!(whole, merged);
    }

    #[test]
    fn day_bucket_is_utc_calendar_date() {
        // One second before and after UTC midnight land on different days.
        let rows = vec![
            txn(1, "A", 100, 1, "2025-01-10T23:59:59Z"),
            txn(2, "A", 100, 1, "2025-01-11T00:00:00Z"),
        ];
        let map = fold_batch(&rows);
        assert_eq!(map[&key("A", 2025, 1, 10)].txn_count, 1);
        assert_eq!(map[&key("A", 2025, 1, 11)].txn_count, 1);
    }

    #[test]
    fn negative_fee_pushes_net_above_gross() {
        let rows = vec![txn(1, "A", 1000, -50, "2025-01-10T12:00:00Z")];
        let totals = fold_batch(&rows)[&key("A", 2025, 1, 10)];
        assert_eq!(totals.gross_cents, 1000);
        assert_eq!(totals.fee_cents, -50);
        assert_eq!(totals.net_cents, 1050);
    }

    #[test]
    fn utc_bucketing_ignores_local_offsets_in_input() {
        // 2025-01-11 01:30 +05:00 is 2025-01-10 20:30 UTC.
        let ts = Utc.with_ymd_and_hms(2025, 1, 10, 20, 30, 0).unwrap();
        let row = TransactionRow {
            id: 1,
            merchant_id: "A".to_string(),
            amount_cents: 100,
            fee_cents: 0,
            status: "PAID".to_string(),
            paid_at: ts,
        };
        let map = fold_batch(std::slice::from_ref(&row));
        assert!(map.contains_key(&key("A", 2025, 1, 10)));
    }
}
