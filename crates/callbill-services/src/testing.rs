//! In-memory repositories for service tests

use async_trait::async_trait;
use callbill_core::{
    models::{Bill, Call, CallWithBill, NewBill, NewCall, NewTariff, Tariff, TariffStatus},
    traits::{CallRepository, TariffRepository},
    AppError, AppResult,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct InMemoryTariffRepository {
    tariffs: Mutex<Vec<Tariff>>,
}

#[async_trait]
impl TariffRepository for InMemoryTariffRepository {
    async fn activate(&self, tariff: &NewTariff) -> AppResult<Tariff> {
        let mut tariffs = self.tariffs.lock();
        for existing in tariffs.iter_mut() {
            existing.status = TariffStatus::Inactive;
        }

        let saved = Tariff {
            id: tariffs.len() as i32 + 1,
            standing_charge: tariff.standing_charge,
            call_charge: tariff.call_charge,
            useful_day: tariff.useful_day,
            status: TariffStatus::Active,
            create_date: Utc::now(),
        };
        tariffs.push(saved.clone());
        Ok(saved)
    }

    async fn find_active(&self) -> AppResult<Option<Tariff>> {
        Ok(self.tariffs.lock().iter().find(|t| t.is_active()).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Tariff>> {
        Ok(self
            .tariffs
            .lock()
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tariffs.lock().len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryCallRepository {
    calls: Mutex<BTreeMap<i64, CallWithBill>>,
    next_bill_id: Mutex<i64>,
}

impl InMemoryCallRepository {
    pub fn bill_count(&self) -> usize {
        self.calls
            .lock()
            .values()
            .filter(|c| c.bill.is_some())
            .count()
    }
}

#[async_trait]
impl CallRepository for InMemoryCallRepository {
    async fn create_with_bill(&self, call: &NewCall, bill: &NewBill) -> AppResult<CallWithBill> {
        let mut calls = self.calls.lock();
        if calls.contains_key(&call.id) {
            return Err(AppError::AlreadyExists(format!(
                "call {} already exists",
                call.id
            )));
        }

        let mut next_bill_id = self.next_bill_id.lock();
        *next_bill_id += 1;

        let now = Utc::now();
        let record = CallWithBill {
            call: Call {
                id: call.id,
                source: call.source.clone(),
                destination: call.destination.clone(),
                record_start: call.record_start,
                record_stop: call.record_stop,
                created_at: now,
            },
            bill: Some(Bill {
                id: *next_bill_id,
                call_id: call.id,
                price: bill.price,
                call_start_date: bill.call_start_date,
                call_start_time: bill.call_start_time,
                duration: bill.duration.clone(),
                created_at: now,
            }),
        };
        calls.insert(call.id, record.clone());
        Ok(record)
    }

    async fn find_with_bill(&self, id: i64) -> AppResult<Option<CallWithBill>> {
        Ok(self.calls.lock().get(&id).cloned())
    }

    async fn list_with_bills(&self, limit: i64, offset: i64) -> AppResult<Vec<CallWithBill>> {
        let mut records: Vec<CallWithBill> = self.calls.lock().values().cloned().collect();
        records.sort_by(|a, b| b.call.record_start.cmp(&a.call.record_start));
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.calls.lock().len() as i64)
    }
}
