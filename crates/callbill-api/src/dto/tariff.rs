//! Tariff DTOs

use callbill_core::models::{Tariff, TariffStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Tariff as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct TariffResponse {
    pub id: i32,
    pub standing_charge: Decimal,
    pub call_charge: Decimal,
    pub useful_day: i32,
    pub status: TariffStatus,
    pub create_date: DateTime<Utc>,
}

impl From<Tariff> for TariffResponse {
    fn from(tariff: Tariff) -> Self {
        Self {
            id: tariff.id,
            standing_charge: tariff.standing_charge,
            call_charge: tariff.call_charge,
            useful_day: tariff.useful_day,
            status: tariff.status,
            create_date: tariff.create_date,
        }
    }
}
