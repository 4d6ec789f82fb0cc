//! Bill model
//!
//! One bill per call, written right after the call and never updated.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Priced call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique identifier
    pub id: i64,

    /// Owning call (unique)
    pub call_id: i64,

    /// Total price, rounded to cents
    pub price: Decimal,

    /// Date part of the call's start record (UTC)
    pub call_start_date: NaiveDate,

    /// Time part of the call's start record (UTC)
    pub call_start_time: NaiveTime,

    /// Elapsed time as `H:M:S`
    pub duration: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Bill values computed by pricing, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    pub price: Decimal,
    pub call_start_date: NaiveDate,
    pub call_start_time: NaiveTime,
    pub duration: String,
}

impl NewBill {
    /// Build a bill for a call starting at `record_start`
    pub fn new(price: Decimal, record_start: DateTime<Utc>, duration: String) -> Self {
        Self {
            price,
            call_start_date: record_start.date_naive(),
            call_start_time: record_start.time(),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_bill_splits_start() {
        let start = Utc.with_ymd_and_hms(2020, 5, 8, 21, 57, 13).unwrap();
        let bill = NewBill::new(dec!(0.54), start, "0:5:0".to_string());

        assert_eq!(
            bill.call_start_date,
            NaiveDate::from_ymd_opt(2020, 5, 8).unwrap()
        );
        assert_eq!(
            bill.call_start_time,
            NaiveTime::from_hms_opt(21, 57, 13).unwrap()
        );
        assert_eq!(bill.duration, "0:5:0");
    }
}
