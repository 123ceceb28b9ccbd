//! Typed reads for each page.
//!
//! Every fetch has a deterministic order and an explicit limit. Reads run
//! with the signed-in user's token so row-level security scopes the result.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;

use rain_advisory_core::{
    Alert, AppRole, Crop, CropAdvisory, Profile, RainfallRecord, WeatherObservation,
};

use super::query::{Direction, Filter, Select, Table};
use super::{SupabaseClient, SupabaseError};
use crate::models::CurrentUser;

/// Alerts shown on the dashboard.
pub const ALERT_LIMIT: usize = 5;
/// Crop fields listed for one user.
pub const CROP_LIMIT: usize = 50;
/// Advisories shown on the dashboard.
pub const ADVISORY_LIMIT: usize = 6;
/// Days in the weather outlook.
pub const OUTLOOK_DAYS: usize = 7;
/// Upper bound on rainfall rows in one report.
pub const RAINFALL_LIMIT: usize = 1000;
/// Profiles listed in the admin panel.
pub const RECENT_PROFILE_LIMIT: usize = 20;

impl SupabaseClient {
    /// The user's own alerts together with global ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn recent_alerts(&self, user: &CurrentUser) -> Result<Vec<Alert>, SupabaseError> {
        let query = Select::from(Table::Alerts)
            .filter(Filter::Or(vec![
                Filter::Eq("user_id", user.id.to_string()),
                Filter::IsNull("user_id"),
            ]))
            .order("created_at", Direction::Desc)
            .limit(ALERT_LIMIT);

        self.select(&query, Some(&user.access_token)).await
    }

    /// The user's crop fields, most recently planted first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn user_crops(&self, user: &CurrentUser) -> Result<Vec<Crop>, SupabaseError> {
        let query = Select::from(Table::Crops)
            .eq("user_id", user.id)
            .order("planted_date", Direction::Desc)
            .limit(CROP_LIMIT);

        self.select(&query, Some(&user.access_token)).await
    }

    /// The advisory catalogue ordered by crop type then title.
    ///
    /// The catalogue is global and read as the anonymous role, so one cached
    /// copy serves every user.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the cache is cold and the read fails.
    #[instrument(skip(self))]
    pub async fn crop_advisories(
        &self,
        limit: usize,
    ) -> Result<Arc<Vec<CropAdvisory>>, SupabaseError> {
        if let Some(cached) = self.advisory_cache().get(&limit).await {
            tracing::debug!("Advisory cache hit");
            return Ok(cached);
        }

        let query = Select::from(Table::CropAdvisory)
            .order("crop_type", Direction::Asc)
            .order("title", Direction::Asc)
            .limit(limit);

        let advisories: Arc<Vec<CropAdvisory>> = Arc::new(self.select(&query, None).await?);
        self.advisory_cache()
            .insert(limit, Arc::clone(&advisories))
            .await;

        Ok(advisories)
    }

    /// The most recent observation on or before `today`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn latest_weather(
        &self,
        user: &CurrentUser,
        location: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<WeatherObservation>, SupabaseError> {
        let mut query = Select::from(Table::WeatherData)
            .filter(Filter::Lte("forecast_date", today.to_string()))
            .order("forecast_date", Direction::Desc)
            .order("created_at", Direction::Desc)
            .limit(1);
        if let Some(location) = location {
            query = query.eq("location", location);
        }

        let rows: Vec<WeatherObservation> =
            self.select(&query, Some(&user.access_token)).await?;
        Ok(rows.into_iter().next())
    }

    /// Forecast entries from `today` onward, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn weather_outlook(
        &self,
        user: &CurrentUser,
        location: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<WeatherObservation>, SupabaseError> {
        let mut query = Select::from(Table::WeatherData)
            .filter(Filter::Gte("forecast_date", today.to_string()))
            .order("forecast_date", Direction::Asc)
            .order("location", Direction::Asc)
            .limit(OUTLOOK_DAYS);
        if let Some(location) = location {
            query = query.eq("location", location);
        }

        self.select(&query, Some(&user.access_token)).await
    }

    /// Rainfall records with `from <= date <= to`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn rainfall_between(
        &self,
        user: &CurrentUser,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RainfallRecord>, SupabaseError> {
        let query = Select::from(Table::RainfallRecords)
            .filter(Filter::Gte("date", from.to_string()))
            .filter(Filter::Lte("date", to.to_string()))
            .order("date", Direction::Asc)
            .order("location", Direction::Asc)
            .limit(RAINFALL_LIMIT);

        self.select(&query, Some(&user.access_token)).await
    }

    /// The user's profile row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn profile_for(&self, user: &CurrentUser) -> Result<Option<Profile>, SupabaseError> {
        let query = Select::from(Table::Profiles).eq("user_id", user.id).limit(1);

        let rows: Vec<Profile> = self.select(&query, Some(&user.access_token)).await?;
        Ok(rows.into_iter().next())
    }

    /// Newest profiles, optionally narrowed to names containing `search`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip(self, admin))]
    pub async fn recent_profiles(
        &self,
        admin: &CurrentUser,
        search: Option<&str>,
    ) -> Result<Vec<Profile>, SupabaseError> {
        let mut query = Select::from(Table::Profiles)
            .order("created_at", Direction::Desc)
            .limit(RECENT_PROFILE_LIMIT);
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(Filter::contains("full_name", term));
        }

        self.select(&query, Some(&admin.access_token)).await
    }

    /// Exact row count of a whole table.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the count fails.
    pub async fn table_count(
        &self,
        admin: &CurrentUser,
        table: Table,
    ) -> Result<u64, SupabaseError> {
        self.count(&Select::from(table), Some(&admin.access_token))
            .await
    }

    /// Whether any `user_roles` row assigns `role` to the user.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the read fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn has_role_assignment(
        &self,
        user: &CurrentUser,
        role: AppRole,
    ) -> Result<bool, SupabaseError> {
        let query = Select::from(Table::UserRoles)
            .columns("id")
            .eq("user_id", user.id)
            .eq("role", role)
            .limit(1);

        let rows: Vec<serde_json::Value> = self.select(&query, Some(&user.access_token)).await?;
        Ok(!rows.is_empty())
    }
}
