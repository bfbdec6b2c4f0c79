use std::collections::HashSet;
use voyage_value::core::aggregate::{distinct_count, group_aggregate, histogram, mean, sum, GroupSpec};
use voyage_value::core::transform::{
    extract_integer_column, extract_leading_integer, month_bucketing, synthetic_sum_column,
    MONTH_COLUMN,
};
use voyage_value::domain::model::BucketSpec;
use voyage_value::{build_dashboard, AggregationError, Category, Cell, DashboardRequest, Table};

fn text_column(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| Cell::text(*v)).collect()
}

fn number_column(values: &[f64]) -> Vec<Cell> {
    values.iter().map(|v| Cell::Number(*v)).collect()
}

#[test]
fn test_distinct_count_is_bounded_by_rows_and_idempotent() -> anyhow::Result<()> {
    let table = Table::from_columns([(
        "Location",
        text_column(&["Paris", "Tokyo", "Paris", "Lima", "Tokyo"]),
    )])?;

    let first = distinct_count(&table, "Location")?;
    let second = distinct_count(&table, "Location")?;

    assert_eq!(first, 3);
    assert_eq!(first, second);
    assert!(first <= table.row_count());
    Ok(())
}

#[test]
fn test_aggregations_do_not_modify_the_table() -> anyhow::Result<()> {
    let table = Table::from_columns([
        ("Duration", number_column(&[3.0, 5.0, 7.0])),
        ("Location", text_column(&["Paris", "Tokyo", "Paris"])),
    ])?;
    let before = table.clone();

    assert_eq!(mean(&table, "Duration")?, 5.0);
    assert_eq!(sum(&table, "Duration")?, 15.0);
    group_aggregate(&table, &GroupSpec::count(&["Location"]))?;

    assert_eq!(table.column_names(), before.column_names());
    assert_eq!(table.column("Duration")?, before.column("Duration")?);
    Ok(())
}

#[test]
fn test_extract_leading_integer_examples() {
    assert_eq!(extract_leading_integer("12 miles"), 12);
    assert_eq!(extract_leading_integer("about 300"), 300);
    assert_eq!(extract_leading_integer("unknown"), 0);
}

#[test]
fn test_extract_leading_integer_is_idempotent() {
    let inputs = [
        "",
        "   ",
        "12 miles",
        "007 km",
        "0",
        "approx. 1500 mi (2400 km)",
        "12.75",
        "-40 miles",
        "no digits here",
        "99999999999999999999999",
        "18446744073709551615 miles",
    ];

    for input in inputs {
        let once = extract_leading_integer(input);
        let twice = extract_leading_integer(&once.to_string());
        assert_eq!(twice, once, "extracting twice changed the result for {:?}", input);
    }

    assert_eq!(extract_leading_integer("007 km"), 7);
    assert_eq!(extract_leading_integer("99999999999999999999999"), u64::MAX);
}

#[test]
fn test_extracted_distance_sums_to_total() -> anyhow::Result<()> {
    let table = Table::from_columns([(
        "Travel Distance",
        text_column(&["12 miles", "30 miles", "n/a"]),
    )])?;

    let derived = extract_integer_column(&table, "Travel Distance", "Distance (miles)")?;

    assert_eq!(sum(&derived, "Distance (miles)")?, 42.0);
    assert!(!table.has_column("Distance (miles)"));
    Ok(())
}

#[test]
fn test_group_counts_sum_to_rows_with_keys() -> anyhow::Result<()> {
    let table = Table::from_columns([
        (
            "Transportation type",
            text_column(&["Flight", "Train", "Flight", "Car", "Flight"]),
        ),
        (
            "Travel Class",
            vec![
                Cell::text("Economy"),
                Cell::text("Standard"),
                Cell::text("Business"),
                Cell::Missing,
                Cell::text("Economy"),
            ],
        ),
    ])?;

    let series = group_aggregate(&table, &GroupSpec::count(&["Transportation type", "Travel Class"]))?;

    // 缺值的列不計入
    assert_eq!(series.total(), 4.0);
    assert_eq!(series.find(&["Flight", "Economy"]), Some(2.0));

    let keys: HashSet<&[Cell]> = series.keys().collect();
    assert_eq!(keys.len(), series.len());
    Ok(())
}

#[test]
fn test_month_keys_are_year_month() -> anyhow::Result<()> {
    let table = Table::from_columns([(
        "Start date",
        text_column(&["2023-01-15", "01/31/2023", "2023-02-01", "next week"]),
    )])?;

    let buckets = month_bucketing(&table, "Start date")?;
    let months = buckets.table.column(MONTH_COLUMN)?;

    assert_eq!(months[0], Cell::text("2023-01"));
    assert_eq!(months[1], Cell::text("2023-01"));
    assert_eq!(months[2], Cell::text("2023-02"));
    assert!(months[3].is_missing());
    assert_eq!(
        buckets.rejected,
        vec![AggregationError::UnparseableDate {
            column: "Start date".to_string(),
            row: 3,
            value: "next week".to_string(),
        }]
    );
    Ok(())
}

#[test]
fn test_age_histogram_default_buckets() -> anyhow::Result<()> {
    let table = Table::from_columns([("Employee Age", number_column(&[21.0, 21.0, 23.0, 59.0]))])?;

    let series = histogram(&table, "Employee Age", &BucketSpec::default())?;

    assert_eq!(series.len(), 19);
    assert_eq!(series.find(&["21"]), Some(2.0));
    assert_eq!(series.find(&["23"]), Some(1.0));
    // 59 超出 [20, 58)
    assert_eq!(series.total(), 3.0);
    Ok(())
}

#[test]
fn test_synthetic_sum_column() -> anyhow::Result<()> {
    let table = Table::from_columns([
        ("Tips/Gratuities", number_column(&[1.0, 2.0])),
        ("Conference Fees", number_column(&[3.0, 4.0])),
    ])?;

    let derived = synthetic_sum_column(
        &table,
        &["Tips/Gratuities", "Conference Fees"],
        "Miscellaneous Expenses",
    )?;

    assert_eq!(
        derived.column("Miscellaneous Expenses")?,
        &[Cell::Number(4.0), Cell::Number(6.0)]
    );
    Ok(())
}

#[test]
fn test_missing_column_fails_only_its_views() -> anyhow::Result<()> {
    let table = Table::from_columns([
        ("Employee Name", text_column(&["Ann", "Bo"])),
        ("Location", text_column(&["Austin", "Boston"])),
    ])?;

    let report = build_dashboard(&table, &DashboardRequest::new(Category::Employee));

    assert_eq!(report.scalar("locations").map(|s| s.value), Some(2.0));
    assert_eq!(
        report.outcome("departments").and_then(|o| o.error()),
        Some(&AggregationError::ColumnNotFound {
            column: "Department".to_string(),
        })
    );
    Ok(())
}
