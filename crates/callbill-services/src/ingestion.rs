//! Call ingestion service
//!
//! Turns a start/stop CDR pair into a stored call and its bill.

use crate::pricing::{calculate_bill, format_duration, DayWindow};
use crate::tariff::TariffService;
use callbill_core::{
    models::{CallRecordInput, CallWithBill, NewBill},
    traits::{call_not_found, CallRepository, TariffRepository},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Call ingestion service
///
/// Pricing happens before anything is written, and the call and its bill
/// are stored together, so a failed ingestion leaves no partial rows.
pub struct CallIngestionService<C: CallRepository, T: TariffRepository> {
    calls: Arc<C>,
    tariffs: TariffService<T>,
    window: DayWindow,
}

impl<C: CallRepository, T: TariffRepository> CallIngestionService<C, T> {
    /// Create a new ingestion service
    pub fn new(calls: Arc<C>, tariffs: TariffService<T>, window: DayWindow) -> Self {
        Self {
            calls,
            tariffs,
            window,
        }
    }

    /// Validate, price and store one call
    #[instrument(skip(self, input), fields(call_id = ?input.call_id))]
    pub async fn process_call(&self, input: CallRecordInput) -> AppResult<CallWithBill> {
        let call = input.parse().map_err(|e| {
            warn!("Rejected call record: {}", e);
            e
        })?;

        let tariff = self.tariffs.active_tariff().await?;

        let quote = calculate_bill(&self.window, call.record_start, call.record_stop, &tariff)
            .map_err(|e| AppError::BillCalculation(e.detail()))?;

        let bill = NewBill::new(quote.price, call.record_start, format_duration(quote.elapsed));
        debug!(price = %bill.price, duration = %bill.duration, "Bill computed");

        let stored = self
            .calls
            .create_with_bill(&call, &bill)
            .await
            .map_err(|e| {
                warn!("Failed to store call {}: {}", call.id, e);
                e
            })?;

        info!(
            call_id = call.id,
            price = %bill.price,
            tariff_id = tariff.id,
            "Call ingested"
        );

        Ok(stored)
    }

    /// Fetch a call with its bill
    #[instrument(skip(self))]
    pub async fn get_call(&self, id: i64) -> AppResult<CallWithBill> {
        self.calls
            .find_with_bill(id)
            .await?
            .ok_or_else(|| call_not_found(id))
    }

    /// Page through calls, newest first, with the total count
    #[instrument(skip(self))]
    pub async fn list_calls(&self, limit: i64, offset: i64) -> AppResult<(Vec<CallWithBill>, i64)> {
        let calls = self.calls.list_with_bills(limit, offset).await?;
        let total = self.calls.count().await?;
        Ok((calls, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCallRepository, InMemoryTariffRepository};
    use callbill_core::models::{NewTariff, StartRecord, StopRecord};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;

    struct Fixture {
        calls: Arc<InMemoryCallRepository>,
        tariffs: TariffService<InMemoryTariffRepository>,
        service: CallIngestionService<InMemoryCallRepository, InMemoryTariffRepository>,
    }

    fn fixture() -> Fixture {
        let calls = Arc::new(InMemoryCallRepository::default());
        let tariffs = TariffService::new(Arc::new(InMemoryTariffRepository::default()));
        let service =
            CallIngestionService::new(Arc::clone(&calls), tariffs.clone(), DayWindow::default());
        Fixture {
            calls,
            tariffs,
            service,
        }
    }

    fn record(id: i64, start: &str, stop: &str) -> CallRecordInput {
        CallRecordInput {
            call_id: Some(id),
            start: Some(StartRecord {
                record_timestamp: Some(start.to_string()),
                source: Some("99988526423".to_string()),
                destination: Some("9993468278".to_string()),
            }),
            stop: Some(StopRecord {
                record_timestamp: Some(stop.to_string()),
            }),
        }
    }

    async fn with_tariff(f: &Fixture) {
        f.tariffs
            .activate(NewTariff {
                standing_charge: dec!(1.00),
                call_charge: dec!(0.10),
                useful_day: 8,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_process_call_stores_call_and_bill() {
        let f = fixture();
        with_tariff(&f).await;

        let stored = f
            .service
            .process_call(record(70, "2020-05-08T10:00:00Z", "2020-05-08T10:30:00Z"))
            .await
            .unwrap();

        assert_eq!(stored.call.id, 70);
        let bill = stored.bill.unwrap();
        assert_eq!(bill.price, dec!(4.00));
        assert_eq!(bill.duration, "0:30:0");
        assert_eq!(bill.call_start_date, NaiveDate::from_ymd_opt(2020, 5, 8).unwrap());
        assert_eq!(bill.call_start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());

        let fetched = f.service.get_call(70).await.unwrap();
        assert_eq!(fetched.call.source, "99988526423");
    }

    #[tokio::test]
    async fn test_duplicate_call_id_rejected() {
        let f = fixture();
        with_tariff(&f).await;

        f.service
            .process_call(record(71, "2020-05-08T10:00:00Z", "2020-05-08T10:30:00Z"))
            .await
            .unwrap();

        let result = f
            .service
            .process_call(record(71, "2020-05-09T10:00:00Z", "2020-05-09T11:00:00Z"))
            .await;

        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
        assert_eq!(f.calls.bill_count(), 1);

        // The original bill is untouched
        let stored = f.service.get_call(71).await.unwrap();
        assert_eq!(stored.bill.unwrap().price, dec!(4.00));
    }

    #[tokio::test]
    async fn test_missing_field_reported() {
        let f = fixture();
        with_tariff(&f).await;

        let mut input = record(72, "2020-05-08T10:00:00Z", "2020-05-08T10:30:00Z");
        input.start.as_mut().unwrap().destination = None;

        match f.service.process_call(input).await {
            Err(AppError::MissingField(key)) => assert_eq!(key, "start.destination"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(f.calls.bill_count(), 0);
    }

    #[tokio::test]
    async fn test_no_active_tariff_stores_nothing() {
        let f = fixture();

        let result = f
            .service
            .process_call(record(73, "2020-05-08T10:00:00Z", "2020-05-08T10:30:00Z"))
            .await;

        assert!(matches!(result, Err(AppError::NoActiveTariff)));
        assert!(matches!(
            f.service.get_call(73).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bill_uses_tariff_active_at_ingestion() {
        let f = fixture();
        with_tariff(&f).await;

        f.service
            .process_call(record(74, "2020-05-08T10:00:00Z", "2020-05-08T10:30:00Z"))
            .await
            .unwrap();

        f.tariffs
            .activate(NewTariff {
                standing_charge: dec!(0.50),
                call_charge: dec!(0.20),
                useful_day: 8,
            })
            .await
            .unwrap();

        let second = f
            .service
            .process_call(record(75, "2020-05-08T10:00:00Z", "2020-05-08T10:30:00Z"))
            .await
            .unwrap();
        assert_eq!(second.bill.unwrap().price, dec!(6.50));

        let first = f.service.get_call(74).await.unwrap();
        assert_eq!(first.bill.unwrap().price, dec!(4.00));
    }

    #[tokio::test]
    async fn test_list_calls_newest_first() {
        let f = fixture();
        with_tariff(&f).await;

        for (id, day) in [(1, "05"), (2, "07"), (3, "06")] {
            let start = format!("2020-05-{}T10:00:00Z", day);
            let stop = format!("2020-05-{}T10:01:00Z", day);
            f.service
                .process_call(record(id, &start, &stop))
                .await
                .unwrap();
        }

        let (calls, total) = f.service.list_calls(2, 0).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<i64> = calls.iter().map(|c| c.call.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
