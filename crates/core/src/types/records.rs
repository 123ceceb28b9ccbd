//! Table rows read from the hosted data service.
//!
//! Field names match the column names so rows deserialize directly from
//! PostgREST JSON. The application only ever reads these rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::{
    AdvisoryId, AlertId, CropId, ProfileId, RainfallRecordId, RoleAssignmentId, UserId,
    WeatherObservationId,
};
use super::status::{AlertSeverity, AppRole, CropType};

/// A row of `user_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: RoleAssignmentId,
    pub user_id: UserId,
    pub role: AppRole,
}

/// A row of `profiles`, one per signed-up user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub farm_location: Option<String>,
    pub farm_size_acres: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `weather_data`: an observation or forecast for one location and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub id: WeatherObservationId,
    pub location: String,
    #[serde(with = "calendar_date")]
    pub forecast_date: NaiveDate,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall_mm: Option<f64>,
    pub wind_speed: Option<f64>,
    pub conditions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row of `crop_advisory`: general planting guidance for a crop type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropAdvisory {
    pub id: AdvisoryId,
    pub crop_type: CropType,
    pub title: String,
    pub description: String,
    pub season: Option<String>,
    pub rainfall_requirement: Option<String>,
    pub best_planting_months: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `alerts`. A `None` owner means the alert is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub user_id: Option<UserId>,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub is_read: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Whether this alert is addressed to everyone rather than one user.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

/// A row of `crops`: one planting owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: CropId,
    pub user_id: UserId,
    pub crop_type: CropType,
    #[serde(with = "calendar_date")]
    pub planted_date: NaiveDate,
    #[serde(default, with = "optional_calendar_date")]
    pub expected_harvest_date: Option<NaiveDate>,
    pub area_acres: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `rainfall_records`: measured rainfall for one location and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallRecord {
    pub id: RainfallRecordId,
    pub location: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub rainfall_mm: f64,
    pub created_at: DateTime<Utc>,
}

/// Parse a calendar date from either `YYYY-MM-DD` or a full RFC 3339 timestamp.
///
/// `date` columns come back as plain dates, but some deployments store the
/// same fields as `timestamptz`; both must load.
fn parse_calendar_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.date_naive()))
}

mod calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

mod optional_calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // signature required by serde(with)
    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_calendar_date(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rainfall_record_from_postgrest_json() {
        let json = r#"{
            "id": "0b6a3b8e-58f5-4a53-bd3c-1f1c0c0e8a01",
            "location": "Kiambu",
            "date": "2025-03-14",
            "rainfall_mm": 12.5,
            "created_at": "2025-03-14T06:00:00.123456+00:00"
        }"#;
        let record: RainfallRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert!((record.rainfall_mm - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weather_forecast_date_accepts_timestamp() {
        let json = r#"{
            "id": "0b6a3b8e-58f5-4a53-bd3c-1f1c0c0e8a02",
            "location": "Nakuru",
            "forecast_date": "2025-04-02T00:00:00+00:00",
            "temperature": 24.0,
            "humidity": null,
            "rainfall_mm": 3.2,
            "wind_speed": null,
            "conditions": "Light rain",
            "created_at": "2025-04-01T18:00:00+00:00"
        }"#;
        let obs: WeatherObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.forecast_date, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        assert_eq!(obs.humidity, None);
    }

    #[test]
    fn test_crop_with_missing_harvest_date() {
        let json = r#"{
            "id": "0b6a3b8e-58f5-4a53-bd3c-1f1c0c0e8a03",
            "user_id": "0b6a3b8e-58f5-4a53-bd3c-1f1c0c0e8a04",
            "crop_type": "maize",
            "planted_date": "2025-02-01",
            "expected_harvest_date": null,
            "area_acres": 2.5,
            "status": "growing",
            "notes": null,
            "created_at": "2025-02-01T08:00:00+00:00",
            "updated_at": "2025-02-01T08:00:00+00:00"
        }"#;
        let crop: Crop = serde_json::from_str(json).unwrap();
        assert_eq!(crop.crop_type, CropType::Maize);
        assert_eq!(crop.expected_harvest_date, None);
    }

    #[test]
    fn test_global_alert_has_no_owner() {
        let json = r#"{
            "id": "0b6a3b8e-58f5-4a53-bd3c-1f1c0c0e8a05",
            "user_id": null,
            "title": "Heavy rain",
            "message": "Heavy rainfall expected tomorrow",
            "severity": "critical",
            "is_read": null,
            "created_at": "2025-04-01T18:00:00+00:00"
        }"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert!(alert.is_global());
        assert_eq!(alert.severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_calendar_date_rejects_garbage() {
        assert!(parse_calendar_date("14/03/2025").is_err());
    }
}
