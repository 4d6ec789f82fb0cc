//! Call DTOs

use callbill_core::models::{Bill, CallWithBill};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Bill as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct BillResponse {
    pub id: i64,
    pub price: Decimal,
    pub call_start_date: NaiveDate,
    pub call_start_time: NaiveTime,
    /// Elapsed time as `H:M:S`
    pub duration: String,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            price: bill.price,
            call_start_date: bill.call_start_date,
            call_start_time: bill.call_start_time,
            duration: bill.duration,
        }
    }
}

/// Call with its bill as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct CallResponse {
    pub call_id: i64,
    pub source: String,
    pub destination: String,
    pub record_start: DateTime<Utc>,
    pub record_stop: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub bill: Option<BillResponse>,
}

impl From<CallWithBill> for CallResponse {
    fn from(record: CallWithBill) -> Self {
        let call = record.call;
        Self {
            call_id: call.id,
            source: call.source,
            destination: call.destination,
            record_start: call.record_start,
            record_stop: call.record_stop,
            created_at: call.created_at,
            bill: record.bill.map(BillResponse::from),
        }
    }
}
