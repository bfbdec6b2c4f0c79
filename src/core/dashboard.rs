//! Assembles the fixed battery of views for a data category.
//!
//! Derived columns are computed once per request and shared by every view.
//! Each view carries its own result, so one failing view never blocks the
//! others.

use crate::core::aggregate::{
    column_totals, distinct_count, group_aggregate, histogram, mean, melt_aggregate, sum,
    AggregateOp, GroupSpec, MeltSpec, SeriesOrder,
};
use crate::core::schema::*;
use crate::core::transform::{
    extract_integer_column, month_bucketing, parse_date_column, synthetic_sum_column, MONTH_COLUMN,
};
use crate::domain::model::{BucketSpec, Category, Table};
use crate::domain::series::{Scalar, Series, Unit, View};
use crate::utils::error::AggregationError;
use chrono::{DateTime, Utc};
use serde::Serialize;

type AggResult<T> = std::result::Result<T, AggregationError>;

/// Everything one dashboard computation needs. Built per request and passed
/// in explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardRequest {
    pub category: Category,
    pub age_histogram: BucketSpec,
}

impl DashboardRequest {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            age_histogram: BucketSpec::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewStatus {
    Ready { view: View },
    Failed { error: AggregationError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewOutcome {
    pub id: String,
    pub title: String,
    pub status: ViewStatus,
}

impl ViewOutcome {
    pub fn view(&self) -> Option<&View> {
        match &self.status {
            ViewStatus::Ready { view } => Some(view),
            ViewStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AggregationError> {
        match &self.status {
            ViewStatus::Failed { error } => Some(error),
            ViewStatus::Ready { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, ViewStatus::Ready { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub category: Category,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub row_count: usize,
    pub views: Vec<ViewOutcome>,
    /// Row-level problems that were recovered from, e.g. unparseable dates.
    pub diagnostics: Vec<AggregationError>,
}

impl DashboardReport {
    pub fn outcome(&self, id: &str) -> Option<&ViewOutcome> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn scalar(&self, id: &str) -> Option<&Scalar> {
        self.outcome(id)?.view()?.as_scalar()
    }

    pub fn series(&self, id: &str) -> Option<&Series> {
        self.outcome(id)?.view()?.as_series()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ViewOutcome> {
        self.views.iter().filter(|v| !v.is_ready())
    }

    pub fn ready_count(&self) -> usize {
        self.views.iter().filter(|v| v.is_ready()).count()
    }
}

type Compute = fn(&Table, &DashboardRequest) -> AggResult<View>;

struct ViewDef {
    id: &'static str,
    title: &'static str,
    reads: &'static [&'static str],
    compute: Compute,
}

/// Raw table plus the per-request derived columns.
struct Prepared {
    table: Table,
    schema: SchemaCheck,
    diagnostics: Vec<AggregationError>,
}

impl Prepared {
    fn new(table: &Table, category: Category) -> Self {
        Self {
            table: table.clone(),
            schema: SchemaCheck::run(table, expected_columns(category)),
            diagnostics: Vec::new(),
        }
    }

    fn derive(&mut self, column: &str, derivation: impl FnOnce(&Table) -> AggResult<Table>) {
        match derivation(&self.table) {
            Ok(table) => self.table = table,
            Err(err) => {
                tracing::warn!("⚠️ Could not derive '{}': {}", column, err);
                self.schema.record(column, err);
            }
        }
    }

    /// Parses the start dates once; every month-keyed view reads the result.
    fn derive_months(&mut self) {
        match month_bucketing(&self.table, START_DATE) {
            Ok(buckets) => {
                self.table = buckets.table;
                self.diagnostics.extend(buckets.rejected);
            }
            Err(err) => {
                tracing::warn!("⚠️ Could not derive '{}': {}", MONTH_COLUMN, err);
                self.schema.record(MONTH_COLUMN, err);
            }
        }
    }
}

fn prepare(table: &Table, category: Category) -> Prepared {
    let mut prepared = Prepared::new(table, category);

    match category {
        Category::Employee => {}
        Category::Travel => {
            prepared.derive(DISTANCE_MILES, |t| {
                extract_integer_column(t, TRAVEL_DISTANCE, DISTANCE_MILES)
            });
            prepared.derive_months();
            // End date 僅做檢查，不參與任何月份統計
            if let Ok(parsed) = parse_date_column(&prepared.table, END_DATE) {
                prepared.diagnostics.extend(parsed.rejected);
            }
        }
        Category::Expense => {
            prepared.derive_months();
            prepared.derive(MISCELLANEOUS_EXPENSES, |t| {
                synthetic_sum_column(t, &MISCELLANEOUS_COMPONENTS, MISCELLANEOUS_EXPENSES)
            });
        }
    }
    prepared
}

/// Computes every view of `request.category` over `table`.
pub fn build_dashboard(table: &Table, request: &DashboardRequest) -> DashboardReport {
    let prepared = prepare(table, request.category);

    let views: Vec<ViewOutcome> = view_defs(request.category)
        .into_iter()
        .map(|def| {
            let result = prepared
                .schema
                .require(def.reads)
                .and_then(|_| (def.compute)(&prepared.table, request));
            let status = match result {
                Ok(view) => ViewStatus::Ready { view },
                Err(error) => {
                    tracing::warn!("❌ View '{}' failed: {}", def.id, error);
                    ViewStatus::Failed { error }
                }
            };
            ViewOutcome {
                id: def.id.to_string(),
                title: def.title.to_string(),
                status,
            }
        })
        .collect();

    let report = DashboardReport {
        category: request.category,
        title: request.category.title().to_string(),
        generated_at: Utc::now(),
        row_count: table.row_count(),
        views,
        diagnostics: prepared.diagnostics,
    };

    tracing::info!(
        "📊 {} dashboard: {}/{} views ready over {} rows",
        report.category,
        report.ready_count(),
        report.views.len(),
        report.row_count
    );
    report
}

/// Stable ids of the views built for `category`, in report order.
pub fn view_ids(category: Category) -> Vec<&'static str> {
    view_defs(category).iter().map(|def| def.id).collect()
}

fn count_scalar(table: &Table, column: &str, label: &str) -> AggResult<View> {
    let count = distinct_count(table, column)?;
    Ok(View::Scalar(Scalar::new(label, count as f64, Unit::Count)))
}

fn grouped(table: &Table, spec: GroupSpec<'_>) -> AggResult<View> {
    group_aggregate(table, &spec).map(View::Series)
}

fn view_defs(category: Category) -> Vec<ViewDef> {
    match category {
        Category::Employee => employee_views(),
        Category::Travel => travel_views(),
        Category::Expense => expense_views(),
    }
}

fn employee_views() -> Vec<ViewDef> {
    vec![
        ViewDef {
            id: "employees",
            title: "Number of Employees",
            reads: &[EMPLOYEE_NAME],
            compute: |t, _| count_scalar(t, EMPLOYEE_NAME, "Number of Employees"),
        },
        ViewDef {
            id: "departments",
            title: "Number of Departments",
            reads: &[DEPARTMENT],
            compute: |t, _| count_scalar(t, DEPARTMENT, "Number of Departments"),
        },
        ViewDef {
            id: "locations",
            title: "Number of HQ Locations",
            reads: &[LOCATION],
            compute: |t, _| count_scalar(t, LOCATION, "Number of HQ Locations"),
        },
        ViewDef {
            id: "seniority_by_department",
            title: "Seniority Level Distribution Across Departments",
            reads: &[DEPARTMENT, SENIORITY_LEVEL],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::count(&[DEPARTMENT, SENIORITY_LEVEL]).ordered(SeriesOrder::KeyAscending),
                )
            },
        },
        ViewDef {
            id: "age_distribution",
            title: "Distribution of Employees by age",
            reads: &[EMPLOYEE_AGE],
            compute: |t, request| histogram(t, EMPLOYEE_AGE, &request.age_histogram).map(View::Series),
        },
        ViewDef {
            id: "seniority_by_status",
            title: "Seniority Level Distribution by Employee Status",
            reads: &[EMPLOYEE_STATUS, SENIORITY_LEVEL],
            compute: |t, _| grouped(t, GroupSpec::count(&[EMPLOYEE_STATUS, SENIORITY_LEVEL])),
        },
        ViewDef {
            id: "gender_split",
            title: "Distribution of Employees by gender",
            reads: &[EMPLOYEE_GENDER],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::count(&[EMPLOYEE_GENDER]).ordered(SeriesOrder::ValueDescending),
                )
            },
        },
    ]
}

fn travel_views() -> Vec<ViewDef> {
    vec![
        ViewDef {
            id: "trips",
            title: "Number of Trips",
            reads: &[TRIP_ID],
            compute: |t, _| count_scalar(t, TRIP_ID, "Number of Trips"),
        },
        ViewDef {
            id: "average_duration",
            title: "Average Duration of trips",
            reads: &[DURATION],
            compute: |t, _| {
                let value = mean(t, DURATION)?;
                Ok(View::Scalar(Scalar::new("Average Duration of trips", value, Unit::Days)))
            },
        },
        ViewDef {
            id: "total_distance",
            title: "Total Distance Travelled",
            reads: &[DISTANCE_MILES],
            compute: |t, _| {
                let value = sum(t, DISTANCE_MILES)?;
                Ok(View::Scalar(Scalar::new("Total Distance Travelled", value, Unit::Miles)))
            },
        },
        ViewDef {
            id: "accommodation",
            title: "Distribution of Accommodation",
            reads: &[ACCOMMODATION_TYPE],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::count(&[ACCOMMODATION_TYPE]).ordered(SeriesOrder::ValueDescending),
                )
            },
        },
        ViewDef {
            id: "destinations",
            title: "Top Destinations",
            reads: &[LOCATION],
            compute: |t, _| {
                grouped(t, GroupSpec::count(&[LOCATION]).ordered(SeriesOrder::ValueDescending))
            },
        },
        ViewDef {
            id: "monthly_distance",
            title: "Monthly Travel Distance",
            reads: &[MONTH_COLUMN, DISTANCE_MILES],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::sum(&[MONTH_COLUMN], DISTANCE_MILES).ordered(SeriesOrder::KeyAscending),
                )
            },
        },
        ViewDef {
            id: "purpose_by_destination",
            title: "Purpose of Travel Distribution by Destination",
            reads: &[PURPOSE_OF_TRAVEL, LOCATION],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::count(&[PURPOSE_OF_TRAVEL, LOCATION]).ordered(SeriesOrder::KeyAscending),
                )
            },
        },
        ViewDef {
            id: "transport_by_class",
            title: "Transportation Type vs Travel Class",
            reads: &[TRANSPORTATION_TYPE, TRAVEL_CLASS],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::count(&[TRANSPORTATION_TYPE, TRAVEL_CLASS])
                        .ordered(SeriesOrder::KeyAscending),
                )
            },
        },
    ]
}

const CORE_EXPENSES: [&str; 3] = [ACCOMMODATION_COST, TRANSPORTATION_COST, MEAL_EXPENSES];

const BREAKDOWN_EXPENSES: [&str; 7] = [
    TRANSPORTATION_COST,
    ACCOMMODATION_COST,
    MEAL_EXPENSES,
    CONFERENCE_FEES,
    VISA_PASSPORT_FEES,
    BUSINESS_SUPPLIES,
    TIPS_GRATUITIES,
];

fn expense_views() -> Vec<ViewDef> {
    vec![
        ViewDef {
            id: "trips",
            title: "Number of Trips",
            reads: &[TRIP_ID],
            compute: |t, _| count_scalar(t, TRIP_ID, "Number of Trips"),
        },
        ViewDef {
            id: "average_cost",
            title: "Average Cost Per Trip",
            reads: &[TOTAL_TRAVEL_EXPENSE],
            compute: |t, _| {
                let value = mean(t, TOTAL_TRAVEL_EXPENSE)?;
                Ok(View::Scalar(Scalar::new("Average Cost Per Trip", value, Unit::Dollars)))
            },
        },
        ViewDef {
            id: "total_expenditure",
            title: "Total Trip Expenditure",
            reads: &CORE_EXPENSES,
            compute: |t, _| {
                let mut total = 0.0;
                for column in CORE_EXPENSES {
                    total += sum(t, column)?;
                }
                Ok(View::Scalar(Scalar::new("Total Trip Expenditure", total, Unit::Dollars)))
            },
        },
        ViewDef {
            id: "monthly_core_expenses",
            title: "Monthly Expenses for Accommodation, Transportation, and Meals",
            reads: &[MONTH_COLUMN, ACCOMMODATION_COST, TRANSPORTATION_COST, MEAL_EXPENSES],
            compute: |t, _| {
                melt_aggregate(
                    t,
                    &MeltSpec {
                        by: &[MONTH_COLUMN],
                        values: &CORE_EXPENSES,
                        op: AggregateOp::Sum,
                        variable: "Expense Type",
                        measure: "Cost",
                        order: SeriesOrder::KeyAscending,
                    },
                )
                .map(View::Series)
            },
        },
        ViewDef {
            id: "monthly_miscellaneous",
            title: "Monthly Miscellaneous Expenses",
            reads: &[
                MONTH_COLUMN,
                TIPS_GRATUITIES,
                CONFERENCE_FEES,
                VISA_PASSPORT_FEES,
                BUSINESS_SUPPLIES,
            ],
            compute: |t, _| {
                melt_aggregate(
                    t,
                    &MeltSpec {
                        by: &[MONTH_COLUMN],
                        values: &MISCELLANEOUS_COMPONENTS,
                        op: AggregateOp::Sum,
                        variable: "Expense Type",
                        measure: "Cost",
                        order: SeriesOrder::KeyAscending,
                    },
                )
                .map(View::Series)
            },
        },
        ViewDef {
            id: "monthly_miscellaneous_total",
            title: "Monthly Miscellaneous Total",
            reads: &[MONTH_COLUMN, MISCELLANEOUS_EXPENSES],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::sum(&[MONTH_COLUMN], MISCELLANEOUS_EXPENSES)
                        .ordered(SeriesOrder::KeyAscending),
                )
            },
        },
        ViewDef {
            id: "travel_insurance",
            title: "Travel Insurance of Employees",
            reads: &[TRAVEL_INSURANCE],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::count(&[TRAVEL_INSURANCE]).ordered(SeriesOrder::ValueDescending),
                )
            },
        },
        ViewDef {
            id: "expense_breakdown",
            title: "Percentage of Total Travel Expenses",
            reads: &BREAKDOWN_EXPENSES,
            compute: |t, _| {
                column_totals(t, &BREAKDOWN_EXPENSES, "Expense Category", "Total Amount")
                    .map(View::Series)
            },
        },
        ViewDef {
            id: "monthly_total_expense",
            title: "Monthly Total Travel Expenses",
            reads: &[MONTH_COLUMN, TOTAL_TRAVEL_EXPENSE],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::sum(&[MONTH_COLUMN], TOTAL_TRAVEL_EXPENSE)
                        .ordered(SeriesOrder::KeyAscending),
                )
            },
        },
        ViewDef {
            id: "average_cost_by_department",
            title: "Average Travel Cost per Department",
            reads: &[DEPARTMENT, TOTAL_TRAVEL_EXPENSE],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::mean(&[DEPARTMENT], TOTAL_TRAVEL_EXPENSE)
                        .ordered(SeriesOrder::KeyAscending),
                )
            },
        },
        ViewDef {
            id: "cost_by_transportation",
            title: "Comparison of Total Costs by Transportation type",
            reads: &[TRANSPORTATION_TYPE, TOTAL_TRAVEL_EXPENSE],
            compute: |t, _| {
                grouped(
                    t,
                    GroupSpec::sum(&[TRANSPORTATION_TYPE], TOTAL_TRAVEL_EXPENSE)
                        .ordered(SeriesOrder::KeyAscending),
                )
            },
        },
    ]
}
