//! Tariff model
//!
//! A tariff carries the charges used to price calls. Exactly one tariff is
//! active at a time; saving a new one retires the previous.

use crate::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Tariff status, stored as a small integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TariffStatus {
    /// Superseded tariff
    Inactive,
    /// Tariff used for pricing
    #[default]
    Active,
}

impl fmt::Display for TariffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TariffStatus::Inactive => write!(f, "inactive"),
            TariffStatus::Active => write!(f, "active"),
        }
    }
}

impl TariffStatus {
    /// Column value
    pub fn as_i16(self) -> i16 {
        match self {
            TariffStatus::Inactive => 0,
            TariffStatus::Active => 1,
        }
    }

    /// Parse from the column value; anything but 1 is inactive
    pub fn from_i16(value: i16) -> Self {
        if value == 1 {
            TariffStatus::Active
        } else {
            TariffStatus::Inactive
        }
    }
}

/// Tariff entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique identifier
    pub id: i32,

    /// Fixed charge added to every call
    pub standing_charge: Decimal,

    /// Charge per billable minute
    pub call_charge: Decimal,

    /// Billable hours counted for each whole day a call spans
    pub useful_day: i32,

    pub status: TariffStatus,

    /// When the tariff was saved
    pub create_date: DateTime<Utc>,
}

impl Tariff {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == TariffStatus::Active
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            id: 0,
            standing_charge: Decimal::ZERO,
            call_charge: Decimal::ZERO,
            useful_day: 0,
            status: TariffStatus::Active,
            create_date: Utc::now(),
        }
    }
}

/// Validated tariff values ready to be activated
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewTariff {
    pub standing_charge: Decimal,

    pub call_charge: Decimal,

    #[validate(range(min = 0, max = 24, message = "useful_day must be between 0 and 24"))]
    pub useful_day: i32,
}

/// Raw tariff payload
///
/// Charges may arrive as JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TariffInput {
    pub standing_charge: Option<Value>,
    pub call_charge: Option<Value>,
    pub useful_day: Option<Value>,
}

impl TariffInput {
    /// Check that every charge is present and numeric
    pub fn parse(self) -> AppResult<NewTariff> {
        let standing_charge = decimal_field("standing_charge", self.standing_charge)?;
        let call_charge = decimal_field("call_charge", self.call_charge)?;
        let useful_day = integer_field("useful_day", self.useful_day)?;

        if standing_charge.is_sign_negative() {
            return Err(AppError::Validation(
                "standing_charge must not be negative".to_string(),
            ));
        }
        if call_charge.is_sign_negative() {
            return Err(AppError::Validation(
                "call_charge must not be negative".to_string(),
            ));
        }

        let tariff = NewTariff {
            standing_charge,
            call_charge,
            useful_day,
        };
        tariff.validate()?;
        Ok(tariff)
    }
}

/// Decimal places a charge may carry
pub const CHARGE_SCALE: u32 = 4;

/// Exclusive upper bound on the magnitude of a charge
pub const CHARGE_LIMIT: i64 = 100_000_000;

fn decimal_field(name: &str, value: Option<Value>) -> AppResult<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(AppError::MissingField(name.to_string())),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string())),
        Some(Value::String(s)) => Decimal::from_str(s.trim()),
        Some(other) => {
            return Err(AppError::Validation(format!(
                "{} must be numeric, got {}",
                name, other
            )))
        }
    };

    let value =
        parsed.map_err(|e| AppError::Validation(format!("{} must be numeric: {}", name, e)))?;

    // Charges are stored as NUMERIC(12, 4)
    if value.normalize().scale() > CHARGE_SCALE {
        return Err(AppError::Validation(format!(
            "{} allows at most {} decimal places",
            name, CHARGE_SCALE
        )));
    }
    if value.abs() >= Decimal::from(CHARGE_LIMIT) {
        return Err(AppError::Validation(format!(
            "{} must be below {}",
            name, CHARGE_LIMIT
        )));
    }

    Ok(value)
}

fn integer_field(name: &str, value: Option<Value>) -> AppResult<i32> {
    let invalid = |v: &dyn fmt::Display| {
        AppError::Validation(format!("{} must be an integer, got {}", name, v))
    };

    match value {
        None | Some(Value::Null) => Err(AppError::MissingField(name.to_string())),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| invalid(&n)),
        Some(Value::String(s)) => s.trim().parse::<i32>().map_err(|_| invalid(&s)),
        Some(other) => Err(invalid(&other)),
    }
}
