//! Rainfall and crop aggregations over realistic row sets.

use chrono::NaiveDate;
use rain_advisory_core::{Crop, CropType, RainfallRecord};
use rain_advisory_web::services::reports::{
    crop_distribution, monthly_rainfall, resolve_range, summarize,
};
use serde_json::json;

fn rainfall(date: &str, mm: f64) -> RainfallRecord {
    serde_json::from_value(json!({
        "id": uuid::Uuid::new_v4(),
        "location": "Nakuru",
        "date": date,
        "rainfall_mm": mm,
        "created_at": "2025-01-01T00:00:00Z"
    }))
    .expect("valid rainfall row")
}

fn crop(crop_type: &str) -> Crop {
    serde_json::from_value(json!({
        "id": uuid::Uuid::new_v4(),
        "user_id": "6f1c1f0e-2d7a-4c1b-9a57-3c0c5e0f9b11",
        "crop_type": crop_type,
        "planted_date": "2025-03-01",
        "expected_harvest_date": null,
        "area_acres": 1.0,
        "status": "growing",
        "notes": null,
        "created_at": "2025-03-01T00:00:00Z",
        "updated_at": "2025-03-01T00:00:00Z"
    }))
    .expect("valid crop row")
}

#[test]
fn test_zero_records_is_an_empty_state() {
    let months = monthly_rainfall(&[]);
    assert!(months.is_empty());
    assert!(summarize(&months).is_none());
    assert!(crop_distribution(&[]).is_empty());
}

#[test]
fn test_season_of_rainfall() {
    let records = [
        rainfall("2025-03-02", 10.0),
        rainfall("2025-03-20", 15.0),
        rainfall("2025-04-05", 50.0),
        rainfall("2025-05-11", 25.0),
    ];

    let months = monthly_rainfall(&records);
    let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, ["Mar 2025", "Apr 2025", "May 2025"]);

    let summary = summarize(&months).expect("non-empty summary");
    assert!((summary.total_mm - 100.0).abs() < f64::EPSILON);
    assert_eq!(summary.peak_label, "Apr 2025");
    assert!((months[1].percent_of_peak - 100.0).abs() < f64::EPSILON);
    assert!((months[0].percent_of_peak - 50.0).abs() < f64::EPSILON);
}

#[test]
fn test_dry_period_has_no_division_by_zero() {
    let records = [rainfall("2025-07-01", 0.0), rainfall("2025-08-01", 0.0)];

    let months = monthly_rainfall(&records);
    assert_eq!(months.len(), 2);
    assert!(months.iter().all(|m| m.percent_of_peak.abs() < f64::EPSILON));

    let summary = summarize(&months).expect("non-empty summary");
    assert!(summary.average_per_month_mm.abs() < f64::EPSILON);
}

#[test]
fn test_crop_distribution_orders_by_count() {
    let crops = [crop("beans"), crop("maize"), crop("maize"), crop("tea")];

    let shares = crop_distribution(&crops);
    let order: Vec<CropType> = shares.iter().map(|s| s.crop_type).collect();
    assert_eq!(order, [CropType::Maize, CropType::Beans, CropType::Tea]);
    assert!((shares[0].percent - 50.0).abs() < f64::EPSILON);
}

#[test]
fn test_reversed_range_is_swapped() {
    let today = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
    let later = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
    let earlier = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");

    assert_eq!(
        resolve_range(Some(later), Some(earlier), today),
        (earlier, later)
    );
}
