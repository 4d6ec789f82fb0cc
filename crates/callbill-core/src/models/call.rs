//! Call model
//!
//! A call is the stored form of an ingested CDR: who called whom and the
//! start/stop record timestamps reported by the switch.

use super::bill::Bill;
use crate::{AppError, AppResult};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Stored call record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Identifier supplied by the caller of the ingestion API
    pub id: i64,

    /// Originating number
    pub source: String,

    /// Dialed number
    pub destination: String,

    /// Timestamp of the start record
    pub record_start: DateTime<Utc>,

    /// Timestamp of the stop record
    pub record_stop: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A validated call ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCall {
    pub id: i64,
    pub source: String,
    pub destination: String,
    pub record_start: DateTime<Utc>,
    pub record_stop: DateTime<Utc>,
}

/// A call together with its bill, if one exists
#[derive(Debug, Clone, Serialize)]
pub struct CallWithBill {
    pub call: Call,
    pub bill: Option<Bill>,
}

/// Start record of a CDR pair
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRecord {
    pub record_timestamp: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
}

/// Stop record of a CDR pair
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopRecord {
    pub record_timestamp: Option<String>,
}

/// Raw ingestion payload
///
/// Every key is optional at the serde level so that an absent key is
/// reported as [`AppError::MissingField`] naming it, instead of a generic
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallRecordInput {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub call_id: Option<i64>,
    pub start: Option<StartRecord>,
    pub stop: Option<StopRecord>,
}

impl CallRecordInput {
    /// Check required keys and parse both timestamps
    pub fn parse(self) -> AppResult<NewCall> {
        let id = self.call_id.ok_or_else(|| missing("call_id"))?;
        let start = self.start.ok_or_else(|| missing("start"))?;
        let stop = self.stop.ok_or_else(|| missing("stop"))?;

        let start_ts = start
            .record_timestamp
            .ok_or_else(|| missing("start.record_timestamp"))?;
        let source = start.source.ok_or_else(|| missing("start.source"))?;
        let destination = start
            .destination
            .ok_or_else(|| missing("start.destination"))?;
        let stop_ts = stop
            .record_timestamp
            .ok_or_else(|| missing("stop.record_timestamp"))?;

        check_number_len("start.source", &source)?;
        check_number_len("start.destination", &destination)?;

        let record_start = parse_record_timestamp(&start_ts)?;
        let record_stop = parse_record_timestamp(&stop_ts)?;

        if record_stop < record_start {
            return Err(AppError::Validation(format!(
                "stop record {} precedes start record {}",
                stop_ts, start_ts
            )));
        }

        Ok(NewCall {
            id,
            source,
            destination,
            record_start,
            record_stop,
        })
    }
}

fn missing(key: &str) -> AppError {
    AppError::MissingField(key.to_string())
}

/// Longest source or destination number the calls table holds
pub const MAX_NUMBER_LEN: usize = 32;

fn check_number_len(key: &str, value: &str) -> AppResult<()> {
    if value.chars().count() > MAX_NUMBER_LEN {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            key, MAX_NUMBER_LEN
        )));
    }
    Ok(())
}

/// Parse a CDR timestamp into UTC
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS+HH:MM`, and offset-less
/// timestamps (taken as UTC) with either `T` or a space as separator.
/// Fractional seconds are dropped.
pub fn parse_record_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    let s = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().trunc_subsecs(0));
        }
    }

    Err(AppError::InvalidInput(format!(
        "unparseable record timestamp: {:?}",
        value
    )))
}

/// Deserialize an id from either a number or a numeric string
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map(Some).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value.trim().parse::<i64>().map(Some).map_err(de::Error::custom)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
