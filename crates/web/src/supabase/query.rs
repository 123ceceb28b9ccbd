//! PostgREST query builder.
//!
//! Builds the query-string form PostgREST expects: one parameter per column
//! filter (`user_id=eq.<uuid>`), `or=(...)` for disjunctions, a single
//! comma-separated `order` parameter and a `limit`.

use std::fmt::Display;

/// Tables the application reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Alerts,
    CropAdvisory,
    Crops,
    Profiles,
    RainfallRecords,
    UserRoles,
    WeatherData,
}

impl Table {
    /// Table name in the `public` schema.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::CropAdvisory => "crop_advisory",
            Self::Crops => "crops",
            Self::Profiles => "profiles",
            Self::RainfallRecords => "rainfall_records",
            Self::UserRoles => "user_roles",
            Self::WeatherData => "weather_data",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq(&'static str, String),
    /// `column >= value`
    Gte(&'static str, String),
    /// `column <= value`
    Lte(&'static str, String),
    /// `column IS NULL`
    IsNull(&'static str),
    /// Case-insensitive substring match on `column`.
    ILike(&'static str, String),
    /// Any of the nested filters.
    Or(Vec<Filter>),
}

impl Filter {
    /// Case-insensitive "contains" match. Characters PostgREST treats as
    /// syntax inside filter values are removed from the term.
    #[must_use]
    pub fn contains(column: &'static str, term: &str) -> Self {
        let cleaned: String = term
            .trim()
            .chars()
            .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')' | '"' | '\\'))
            .collect();
        Self::ILike(column, format!("*{cleaned}*"))
    }

    /// The column and operator expression as sent in a top-level parameter.
    fn to_param(&self) -> (String, String) {
        match self {
            Self::Or(filters) => {
                let inner: Vec<String> = filters.iter().map(Self::to_nested).collect();
                ("or".to_string(), format!("({})", inner.join(",")))
            }
            other => {
                let (column, expr) = other.operator();
                (column.to_string(), expr)
            }
        }
    }

    /// The `column.op.value` form used inside `or=(...)`.
    fn to_nested(&self) -> String {
        match self {
            Self::Or(filters) => {
                let inner: Vec<String> = filters.iter().map(Self::to_nested).collect();
                format!("or({})", inner.join(","))
            }
            other => {
                let (column, expr) = other.operator();
                format!("{column}.{expr}")
            }
        }
    }

    fn operator(&self) -> (&'static str, String) {
        match self {
            Self::Eq(column, value) => (*column, format!("eq.{value}")),
            Self::Gte(column, value) => (*column, format!("gte.{value}")),
            Self::Lte(column, value) => (*column, format!("lte.{value}")),
            Self::IsNull(column) => (*column, "is.null".to_string()),
            Self::ILike(column, pattern) => (*column, format!("ilike.{pattern}")),
            Self::Or(_) => ("or", String::new()),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A read query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: Table,
    columns: &'static str,
    filters: Vec<Filter>,
    order: Vec<(&'static str, Direction)>,
    limit: Option<usize>,
}

impl Select {
    /// Select all columns of `table`.
    #[must_use]
    pub const fn from(table: Table) -> Self {
        Self {
            table,
            columns: "*",
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the returned columns (comma-separated).
    #[must_use]
    pub const fn columns(mut self, columns: &'static str) -> Self {
        self.columns = columns;
        self
    }

    /// Add a filter. Filters are combined with AND.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for an equality filter.
    #[must_use]
    pub fn eq(self, column: &'static str, value: impl Display) -> Self {
        self.filter(Filter::Eq(column, value.to_string()))
    }

    /// Append a sort key. Keys apply in the order added.
    #[must_use]
    pub fn order(mut self, column: &'static str, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The table this query reads.
    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    /// Query-string pairs for this select.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.to_string())];
        pairs.extend(self.filter_pairs());

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, direction)| format!("{column}.{}", direction.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }

    /// Only the filter pairs, as used by count requests.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::to_param).collect()
    }
}
