//! Domain models for CallBill
//!
//! This module contains all the core domain models used throughout the application.

pub mod bill;
pub mod call;
pub mod tariff;

pub use bill::{Bill, NewBill};
pub use call::{
    parse_record_timestamp, Call, CallRecordInput, CallWithBill, NewCall, StartRecord, StopRecord,
};
pub use tariff::{NewTariff, Tariff, TariffInput, TariffStatus};
