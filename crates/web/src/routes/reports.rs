//! Rainfall and crop reports.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::nav::NavContext;
use crate::services::reports::{
    CropShare, MonthlyRainfall, RainfallSummary, crop_distribution, monthly_rainfall,
    resolve_range, summarize,
};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Reporting window, as entered in the date inputs.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

// =============================================================================
// View Models
// =============================================================================

/// One bar of the monthly rainfall chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBar {
    pub label: String,
    pub total: String,
    pub records: usize,
    /// Bar length relative to the wettest month, `0..=100`.
    pub width: String,
}

impl From<&MonthlyRainfall> for MonthBar {
    fn from(month: &MonthlyRainfall) -> Self {
        Self {
            label: month.label.clone(),
            total: format!("{:.1} mm", month.total_mm),
            records: month.records,
            width: format!("{:.0}", month.percent_of_peak),
        }
    }
}

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub total: String,
    pub average: String,
    pub peak_label: String,
    pub peak: String,
}

impl From<&RainfallSummary> for SummaryView {
    fn from(summary: &RainfallSummary) -> Self {
        Self {
            total: format!("{:.1} mm", summary.total_mm),
            average: format!("{:.1} mm", summary.average_per_month_mm),
            peak_label: summary.peak_label.clone(),
            peak: format!("{:.1} mm", summary.peak_mm),
        }
    }
}

/// One row of the crop distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareView {
    pub crop: &'static str,
    pub count: usize,
    pub percent: String,
}

impl From<&CropShare> for ShareView {
    fn from(share: &CropShare) -> Self {
        Self {
            crop: share.crop_type.label(),
            count: share.count,
            percent: format!("{:.0}", share.percent),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Reports page template.
#[derive(Template, WebTemplate)]
#[template(path = "reports.html")]
pub struct ReportsTemplate {
    pub nav: NavContext,
    pub notices: Vec<&'static str>,
    pub from: String,
    pub to: String,
    pub record_count: usize,
    pub summary: Option<SummaryView>,
    pub months: Vec<MonthBar>,
    pub shares: Vec<ShareView>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the reports page.
///
/// GET /reports?from=YYYY-MM-DD&to=YYYY-MM-DD
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn reports(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let mut notices = Vec::new();

    let from = parse_date(query.from.as_deref(), &mut notices);
    let to = parse_date(query.to.as_deref(), &mut notices);
    let (from, to) = resolve_range(from, to, Utc::now().date_naive());

    let client = state.supabase();
    let (nav, rainfall, crops) = tokio::join!(
        NavContext::resolve(&state, Some(&user)),
        client.rainfall_between(&user, from, to),
        client.user_crops(&user),
    );

    let rainfall = rainfall.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch rainfall records");
        notices.push("Rainfall records could not be loaded.");
        Vec::new()
    });
    let crops = crops.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch crops");
        notices.push("Your crop fields could not be loaded.");
        Vec::new()
    });

    let months = monthly_rainfall(&rainfall);

    ReportsTemplate {
        nav,
        notices,
        from: from.to_string(),
        to: to.to_string(),
        record_count: rainfall.len(),
        summary: summarize(&months).as_ref().map(SummaryView::from),
        months: months.iter().map(MonthBar::from).collect(),
        shares: crop_distribution(&crops).iter().map(ShareView::from).collect(),
    }
}

/// Parse a date input. Blank means "use the default"; garbage adds a notice.
fn parse_date(raw: Option<&str>, notices: &mut Vec<&'static str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            if notices.is_empty() {
                notices.push("Dates must be YYYY-MM-DD; the default range was used instead.");
            }
            None
        }
    }
}
