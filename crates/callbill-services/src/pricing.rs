//! Call pricing
//!
//! Prices a call from its start/stop records and the active tariff using a
//! day/night model. Times outside the billable day window are pulled to the
//! nearest edge of the window on the same calendar date, independently at
//! each end. Every whole day a call spans is charged as `useful_day` hours.

use callbill_core::config::BillingConfig;
use callbill_core::models::Tariff;
use callbill_core::{AppError, AppResult};
use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_PER_HOUR: i64 = 60;

/// Billable part of a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl DayWindow {
    /// Window from `start_hour:00` to `end_hour:00`
    pub fn new(start_hour: u32, end_hour: u32) -> AppResult<Self> {
        let start = NaiveTime::from_hms_opt(start_hour, 0, 0);
        let end = NaiveTime::from_hms_opt(end_hour, 0, 0);

        match (start, end) {
            (Some(start), Some(end)) if start < end => Ok(Self { start, end }),
            _ => Err(AppError::Config(format!(
                "invalid billing day window {}..{}",
                start_hour, end_hour
            ))),
        }
    }

    /// Pull `t` into the window, keeping its calendar date
    pub fn clamp(&self, t: NaiveDateTime) -> NaiveDateTime {
        let time = t.time();
        if time < self.start {
            t.date().and_time(self.start)
        } else if time > self.end {
            t.date().and_time(self.end)
        } else {
            t
        }
    }
}

impl Default for DayWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl TryFrom<&BillingConfig> for DayWindow {
    type Error = AppError;

    fn try_from(config: &BillingConfig) -> AppResult<Self> {
        Self::new(config.day_start_hour, config.day_end_hour)
    }
}

/// Result of pricing one call
#[derive(Debug, Clone, PartialEq)]
pub struct BillQuote {
    /// Price rounded to cents
    pub price: Decimal,

    /// Raw stop - start
    pub elapsed: Duration,

    /// Billable minutes (fractional)
    pub minutes: Decimal,
}

/// Clamp both ends of a call into the day window
pub fn clamp_window(
    window: &DayWindow,
    start: NaiveDateTime,
    stop: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    (window.clamp(start), window.clamp(stop))
}

/// Billable minutes between `start` and `stop`
///
/// Whole days count `useful_day` hours each. The remainder is measured
/// from the start advanced by those days to the stop, both clamped.
pub fn billable_minutes(
    window: &DayWindow,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    useful_day: i32,
) -> AppResult<Decimal> {
    let elapsed = stop - start;
    if elapsed < Duration::zero() {
        return Err(AppError::InvalidInput(format!(
            "stop {} precedes start {}",
            stop, start
        )));
    }

    let days = elapsed.num_days();
    let shifted = start + Duration::days(days);
    let (from, to) = clamp_window(window, shifted.naive_utc(), stop.naive_utc());

    let day_minutes = Decimal::from(days * i64::from(useful_day) * MINUTES_PER_HOUR);
    let remaining = Decimal::from((to - from).num_seconds()) / Decimal::from(SECONDS_PER_MINUTE);

    Ok(day_minutes + remaining)
}

/// Price a call with `tariff`
#[instrument(skip(window, tariff), fields(tariff_id = tariff.id))]
pub fn calculate_bill(
    window: &DayWindow,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    tariff: &Tariff,
) -> AppResult<BillQuote> {
    let minutes = billable_minutes(window, start, stop, tariff.useful_day)?;
    let price = (minutes * tariff.call_charge + tariff.standing_charge).round_dp(2);

    debug!(%minutes, %price, "Priced call");

    Ok(BillQuote {
        price,
        elapsed: stop - start,
        minutes,
    })
}

/// Format an elapsed time as `H:M:S` without padding
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}:{}:{}", hours, minutes, seconds)
}
