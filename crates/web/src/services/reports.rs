//! Rainfall and crop aggregations for the reports and dashboard pages.
//!
//! All functions are pure: the same records always produce the same output,
//! zero records produce an empty result, and no ratio divides by zero.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use rain_advisory_core::{Crop, CropType, RainfallRecord};

/// Rainfall total for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRainfall {
    pub year: i32,
    pub month: u32,
    /// Display label such as `Mar 2025`.
    pub label: String,
    pub total_mm: f64,
    /// Number of records that fell in this month.
    pub records: usize,
    /// Bar width relative to the wettest month, `0.0..=100.0`.
    pub percent_of_peak: f64,
}

/// Headline numbers for a rainfall series.
#[derive(Debug, Clone, PartialEq)]
pub struct RainfallSummary {
    pub total_mm: f64,
    pub average_per_month_mm: f64,
    pub peak_label: String,
    pub peak_mm: f64,
}

/// Number of fields planted with one crop type.
#[derive(Debug, Clone, PartialEq)]
pub struct CropShare {
    pub crop_type: CropType,
    pub count: usize,
    pub percent: f64,
}

/// Sum rainfall by calendar month, oldest month first.
///
/// Months without records are omitted. Records are bucketed by their date
/// only, so input order and duplicate rows never change the ordering.
#[must_use]
pub fn monthly_rainfall(records: &[RainfallRecord]) -> Vec<MonthlyRainfall> {
    let mut buckets: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = buckets
            .entry((record.date.year(), record.date.month()))
            .or_insert((0.0, 0));
        entry.0 += record.rainfall_mm.max(0.0);
        entry.1 += 1;
    }

    let peak = buckets.values().map(|(total, _)| *total).fold(0.0, f64::max);

    buckets
        .into_iter()
        .map(|((year, month), (total_mm, records))| MonthlyRainfall {
            year,
            month,
            label: month_label(year, month),
            total_mm,
            records,
            percent_of_peak: percent(total_mm, peak),
        })
        .collect()
}

/// Summary of a monthly series, or `None` when there is nothing to summarize.
///
/// The peak is the wettest month; ties go to the earliest month.
#[must_use]
pub fn summarize(months: &[MonthlyRainfall]) -> Option<RainfallSummary> {
    let first = months.first()?;
    let peak = months
        .iter()
        .fold(first, |best, m| if m.total_mm > best.total_mm { m } else { best });

    let total_mm: f64 = months.iter().map(|m| m.total_mm).sum();
    #[allow(clippy::cast_precision_loss)] // month count is tiny
    let average_per_month_mm = total_mm / months.len() as f64;

    Some(RainfallSummary {
        total_mm,
        average_per_month_mm,
        peak_label: peak.label.clone(),
        peak_mm: peak.total_mm,
    })
}

/// Count fields per crop type, most common first (ties by crop type order).
#[must_use]
pub fn crop_distribution(crops: &[Crop]) -> Vec<CropShare> {
    let mut counts: BTreeMap<CropType, usize> = BTreeMap::new();
    for crop in crops {
        *counts.entry(crop.crop_type).or_insert(0) += 1;
    }

    let total = crops.len();
    let mut shares: Vec<CropShare> = counts
        .into_iter()
        .map(|(crop_type, count)| {
            #[allow(clippy::cast_precision_loss)] // counts are bounded by the fetch limit
            let share = percent(count as f64, total as f64);
            CropShare {
                crop_type,
                count,
                percent: share,
            }
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count).then(a.crop_type.cmp(&b.crop_type)));
    shares
}

/// Default reporting window: the 180 days ending `today`.
#[must_use]
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - chrono::Duration::days(180), today)
}

/// Normalize a requested window: fill in defaults and swap reversed bounds.
#[must_use]
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let (default_from, default_to) = default_range(today);
    let from = from.unwrap_or(default_from);
    let to = to.unwrap_or(default_to);
    if from <= to { (from, to) } else { (to, from) }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole * 100.0).clamp(0.0, 100.0)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map_or_else(|| format!("{year}-{month:02}"), |d| d.format("%b %Y").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: NaiveDate, mm: f64) -> RainfallRecord {
        RainfallRecord {
            id: Uuid::new_v4().into(),
            location: "Kiambu".to_string(),
            date: day,
            rainfall_mm: mm,
            created_at: Utc::now(),
        }
    }

    fn crop(crop_type: CropType) -> Crop {
        Crop {
            id: Uuid::new_v4().into(),
            user_id: Uuid::nil().into(),
            crop_type,
            planted_date: date(2025, 3, 1),
            expected_harvest_date: None,
            area_acres: Some(1.0),
            status: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_records_is_empty_state() {
        let months = monthly_rainfall(&[]);
        assert!(months.is_empty());
        assert!(summarize(&months).is_none());
        assert!(crop_distribution(&[]).is_empty());
    }

    #[test]
    fn test_monthly_totals_and_peak_percent() {
        let records = vec![
            record(date(2025, 3, 2), 10.0),
            record(date(2025, 3, 20), 30.0),
            record(date(2025, 4, 1), 20.0),
        ];
        let months = monthly_rainfall(&records);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label, "Mar 2025");
        assert!((months[0].total_mm - 40.0).abs() < f64::EPSILON);
        assert_eq!(months[0].records, 2);
        assert!((months[0].percent_of_peak - 100.0).abs() < f64::EPSILON);
        assert!((months[1].percent_of_peak - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = vec![record(date(2025, 5, 1), 5.0), record(date(2025, 1, 1), 7.0)];
        let b = vec![record(date(2025, 1, 1), 7.0), record(date(2025, 5, 1), 5.0)];
        assert_eq!(monthly_rainfall(&a), monthly_rainfall(&b));
    }

    #[test]
    fn test_all_dry_months_do_not_divide_by_zero() {
        let months = monthly_rainfall(&[record(date(2025, 2, 1), 0.0)]);
        assert!((months[0].percent_of_peak - 0.0).abs() < f64::EPSILON);
        let summary = summarize(&months).unwrap();
        assert!((summary.average_per_month_mm - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_ties_go_to_earliest_month() {
        let months = monthly_rainfall(&[
            record(date(2025, 1, 10), 12.0),
            record(date(2025, 2, 10), 12.0),
            record(date(2025, 3, 10), 6.0),
        ]);
        let summary = summarize(&months).unwrap();
        assert_eq!(summary.peak_label, "Jan 2025");
        assert!((summary.total_mm - 30.0).abs() < f64::EPSILON);
        assert!((summary.average_per_month_mm - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_crop_distribution_orders_by_count() {
        let crops = vec![
            crop(CropType::Beans),
            crop(CropType::Maize),
            crop(CropType::Beans),
            crop(CropType::Tea),
        ];
        let shares = crop_distribution(&crops);

        assert_eq!(shares[0].crop_type, CropType::Beans);
        assert_eq!(shares[0].count, 2);
        assert!((shares[0].percent - 50.0).abs() < f64::EPSILON);
        // Ties fall back to enum order
        assert_eq!(shares[1].crop_type, CropType::Maize);
        assert_eq!(shares[2].crop_type, CropType::Tea);
    }

    #[test]
    fn test_resolve_range_defaults_and_swaps() {
        let today = date(2025, 7, 1);
        assert_eq!(resolve_range(None, None, today), (date(2025, 1, 2), today));
        assert_eq!(
            resolve_range(Some(date(2025, 6, 1)), Some(date(2025, 5, 1)), today),
            (date(2025, 5, 1), date(2025, 6, 1))
        );
    }
}
