//! Tariff service
//!
//! Keeps a single active tariff. Saving a tariff always activates it and
//! retires whichever tariff was active before.

use callbill_core::{
    models::{NewTariff, Tariff, TariffInput},
    traits::TariffRepository,
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tariff service
pub struct TariffService<R: TariffRepository> {
    repo: Arc<R>,
}

impl<R: TariffRepository> Clone for TariffService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: TariffRepository> TariffService<R> {
    /// Create a new tariff service
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Validate a raw payload and activate it
    #[instrument(skip(self, input))]
    pub async fn save_tariff(&self, input: TariffInput) -> AppResult<Tariff> {
        let tariff = input.parse().map_err(|e| {
            warn!("Tariff validation failed: {}", e);
            e
        })?;

        self.activate(tariff).await
    }

    /// Activate already validated tariff values
    #[instrument(skip(self))]
    pub async fn activate(&self, tariff: NewTariff) -> AppResult<Tariff> {
        let saved = self.repo.activate(&tariff).await?;

        info!(
            id = saved.id,
            standing_charge = %saved.standing_charge,
            call_charge = %saved.call_charge,
            useful_day = saved.useful_day,
            "Tariff saved"
        );

        Ok(saved)
    }

    /// The active tariff, if any
    #[instrument(skip(self))]
    pub async fn get_charge(&self) -> AppResult<Option<Tariff>> {
        self.repo.find_active().await
    }

    /// The active tariff; a missing one is an error
    #[instrument(skip(self))]
    pub async fn active_tariff(&self) -> AppResult<Tariff> {
        self.get_charge().await?.ok_or_else(|| {
            warn!("No active tariff configured");
            AppError::NoActiveTariff
        })
    }

    /// All tariffs, newest first, with the total count
    #[instrument(skip(self))]
    pub async fn history(&self, limit: i64, offset: i64) -> AppResult<(Vec<Tariff>, i64)> {
        debug!("Listing tariff history");

        let tariffs = self.repo.find_all(limit, offset).await?;
        let total = self.repo.count().await?;
        Ok((tariffs, total))
    }
}
