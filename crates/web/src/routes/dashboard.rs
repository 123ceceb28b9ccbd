//! Farmer dashboard.
//!
//! The profile is read first because its farm location narrows the weather
//! reads; everything else is fetched concurrently. A failed read is logged,
//! adds a notice banner and leaves its section in the empty state.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use rain_advisory_core::{Alert, AlertSeverity, Crop, CropAdvisory, Profile, WeatherObservation};

use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::nav::NavContext;
use crate::state::AppState;
use crate::supabase::SupabaseError;
use crate::supabase::tables::ADVISORY_LIMIT;

/// Placeholder for a missing measurement.
const NOT_AVAILABLE: &str = "n/a";

// =============================================================================
// View Models
// =============================================================================

/// Current conditions card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherCard {
    pub location: String,
    pub date: String,
    pub conditions: String,
    pub temperature: String,
    pub rainfall: String,
    pub humidity: String,
    pub wind_speed: String,
}

impl WeatherCard {
    fn from_observation(observation: &WeatherObservation) -> Self {
        Self {
            location: observation.location.clone(),
            date: observation.forecast_date.format("%a %-d %b %Y").to_string(),
            conditions: conditions(observation.conditions.as_deref()),
            temperature: measurement(observation.temperature, "°C"),
            rainfall: measurement(observation.rainfall_mm, " mm"),
            humidity: measurement(observation.humidity, "%"),
            wind_speed: measurement(observation.wind_speed, " km/h"),
        }
    }
}

/// One row of the outlook table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlookDay {
    pub day: String,
    pub location: String,
    pub conditions: String,
    pub temperature: String,
    pub rainfall: String,
}

impl OutlookDay {
    fn from_observation(observation: &WeatherObservation) -> Self {
        Self {
            day: observation.forecast_date.format("%a %-d %b").to_string(),
            location: observation.location.clone(),
            conditions: conditions(observation.conditions.as_deref()),
            temperature: measurement(observation.temperature, "°C"),
            rainfall: measurement(observation.rainfall_mm, " mm"),
        }
    }
}

/// Advisory card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryView {
    pub crop: &'static str,
    pub title: String,
    pub description: String,
    pub season: Option<String>,
    pub rainfall_requirement: Option<String>,
    pub planting_months: Option<String>,
}

impl From<&CropAdvisory> for AdvisoryView {
    fn from(advisory: &CropAdvisory) -> Self {
        Self {
            crop: advisory.crop_type.label(),
            title: advisory.title.clone(),
            description: advisory.description.clone(),
            season: non_blank(advisory.season.as_deref()),
            rainfall_requirement: non_blank(advisory.rainfall_requirement.as_deref()),
            planting_months: advisory
                .best_planting_months
                .as_ref()
                .filter(|months| !months.is_empty())
                .map(|months| months.join(", ")),
        }
    }
}

/// Alert row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    pub title: String,
    pub message: String,
    /// Severity label, also used as the CSS modifier.
    pub severity: &'static str,
    pub scope: &'static str,
    pub posted: String,
    pub unread: bool,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            title: alert.title.clone(),
            message: alert.message.clone(),
            severity: alert.severity.as_str(),
            scope: if alert.is_global() { "All farmers" } else { "For you" },
            posted: alert.created_at.format("%-d %b %Y").to_string(),
            unread: !alert.is_read.unwrap_or(false),
        }
    }
}

/// Crop field row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropView {
    pub crop: &'static str,
    pub planted: String,
    pub harvest: String,
    pub area: String,
    pub status: String,
}

impl From<&Crop> for CropView {
    fn from(crop: &Crop) -> Self {
        Self {
            crop: crop.crop_type.label(),
            planted: crop.planted_date.format("%-d %b %Y").to_string(),
            harvest: crop.expected_harvest_date.map_or_else(
                || NOT_AVAILABLE.to_string(),
                |d| d.format("%-d %b %Y").to_string(),
            ),
            area: measurement(crop.area_acres, " acres"),
            status: non_blank(crop.status.as_deref()).unwrap_or_else(|| "Planted".to_string()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavContext,
    pub greeting: String,
    pub farm_location: Option<String>,
    pub notices: Vec<&'static str>,
    pub weather: Option<WeatherCard>,
    pub outlook: Vec<OutlookDay>,
    pub advisories: Vec<AdvisoryView>,
    pub alerts: Vec<AlertView>,
    pub critical_alerts: usize,
    pub crops: Vec<CropView>,
    pub total_acres: String,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the dashboard.
///
/// GET /dashboard
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let client = state.supabase();
    let today: NaiveDate = Utc::now().date_naive();
    let mut notices = Vec::new();

    let profile = keep_or_notice(
        client.profile_for(&user).await,
        "Your profile could not be loaded.",
        &mut notices,
    );
    let location = profile.as_ref().and_then(farm_location);

    let (nav, latest, outlook, advisories, alerts, crops) = tokio::join!(
        NavContext::resolve(&state, Some(&user)),
        client.latest_weather(&user, location.as_deref(), today),
        client.weather_outlook(&user, location.as_deref(), today),
        client.crop_advisories(ADVISORY_LIMIT),
        client.recent_alerts(&user),
        client.user_crops(&user),
    );

    let latest = keep_or_notice(latest, "Current weather is unavailable.", &mut notices);
    let outlook = keep_or_notice(outlook, "The weather outlook is unavailable.", &mut notices);
    let advisories = keep_or_notice(advisories, "Crop advisories are unavailable.", &mut notices);
    let alerts = keep_or_notice(alerts, "Alerts could not be loaded.", &mut notices);
    let crops = keep_or_notice(crops, "Your crop fields could not be loaded.", &mut notices);

    let alerts: Vec<AlertView> = alerts.iter().map(AlertView::from).collect();
    let critical_alerts = alerts
        .iter()
        .filter(|a| a.severity == AlertSeverity::Critical.as_str())
        .count();

    DashboardTemplate {
        nav,
        greeting: greeting_name(profile.as_ref(), &user.email),
        farm_location: location,
        notices,
        weather: latest.as_ref().map(WeatherCard::from_observation),
        outlook: outlook.iter().map(OutlookDay::from_observation).collect(),
        advisories: advisories.iter().map(AdvisoryView::from).collect(),
        alerts,
        critical_alerts,
        total_acres: total_acres(&crops),
        crops: crops.iter().map(CropView::from).collect(),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Unwrap a read, or log it, record a notice and fall back to empty.
fn keep_or_notice<T: Default>(
    result: Result<T, SupabaseError>,
    notice: &'static str,
    notices: &mut Vec<&'static str>,
) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, notice, "Dashboard read failed");
        notices.push(notice);
        T::default()
    })
}

/// Name to greet: the profile's full name, else the account email.
fn greeting_name(profile: Option<&Profile>, email: &str) -> String {
    profile
        .and_then(|p| non_blank(Some(&p.full_name)))
        .unwrap_or_else(|| email.to_string())
}

fn farm_location(profile: &Profile) -> Option<String> {
    non_blank(profile.farm_location.as_deref())
}

fn total_acres(crops: &[Crop]) -> String {
    // An empty f64 sum is -0.0
    let total = crops
        .iter()
        .filter_map(|c| c.area_acres)
        .fold(0.0_f64, |acc, area| acc + area);
    format!("{total:.1}")
}

fn measurement(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}{unit}"))
}

fn conditions(raw: Option<&str>) -> String {
    non_blank(raw).unwrap_or_else(|| "No report".to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rain_advisory_core::{CropType, UserId};

    fn profile(full_name: &str, location: Option<&str>) -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": "0b7a3d52-8f0e-4c9d-9d64-2f6c2b8e5a10",
            "user_id": "6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11",
            "full_name": full_name,
            "email": "farmer@example.com",
            "phone_number": null,
            "farm_location": location,
            "farm_size_acres": 4.5,
            "created_at": "2025-01-10T08:00:00Z",
            "updated_at": "2025-01-10T08:00:00Z"
        }))
        .unwrap()
    }

    fn crop(area: Option<f64>) -> Crop {
        Crop {
            id: uuid::Uuid::new_v4().into(),
            user_id: UserId::new(uuid::Uuid::nil()),
            crop_type: CropType::Maize,
            planted_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            expected_harvest_date: None,
            area_acres: area,
            status: Some("  ".to_string()),
            notes: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_greeting_prefers_full_name() {
        let p = profile("Wanjiru Kamau", None);
        assert_eq!(greeting_name(Some(&p), "farmer@example.com"), "Wanjiru Kamau");
    }

    #[test]
    fn test_greeting_falls_back_to_email() {
        let p = profile("   ", None);
        assert_eq!(greeting_name(Some(&p), "farmer@example.com"), "farmer@example.com");
        assert_eq!(greeting_name(None, "farmer@example.com"), "farmer@example.com");
    }

    #[test]
    fn test_blank_farm_location_is_ignored() {
        assert_eq!(farm_location(&profile("A", Some(" "))), None);
        assert_eq!(
            farm_location(&profile("A", Some(" Nakuru "))).as_deref(),
            Some("Nakuru")
        );
    }

    #[test]
    fn test_measurement_formatting() {
        assert_eq!(measurement(Some(23.456), "°C"), "23.5°C");
        assert_eq!(measurement(None, " mm"), "n/a");
    }

    #[test]
    fn test_crop_view_defaults() {
        let view = CropView::from(&crop(None));
        assert_eq!(view.crop, "Maize");
        assert_eq!(view.planted, "15 Mar 2025");
        assert_eq!(view.harvest, "n/a");
        assert_eq!(view.area, "n/a");
        assert_eq!(view.status, "Planted");
    }

    #[test]
    fn test_total_acres_skips_unknown_areas() {
        assert_eq!(total_acres(&[crop(Some(1.5)), crop(None), crop(Some(2.0))]), "3.5");
        assert_eq!(total_acres(&[]), "0.0");
        assert_eq!(total_acres(&[crop(None), crop(None)]), "0.0");
    }

    #[test]
    fn test_keep_or_notice_records_failure() {
        let mut notices = Vec::new();
        let ok: Vec<u8> = keep_or_notice(Ok(vec![1]), "first", &mut notices);
        let failed: Vec<u8> = keep_or_notice(
            Err(SupabaseError::InvalidContentRange("x".to_string())),
            "second",
            &mut notices,
        );

        assert_eq!(ok, vec![1]);
        assert!(failed.is_empty());
        assert_eq!(notices, vec!["second"]);
    }
}
