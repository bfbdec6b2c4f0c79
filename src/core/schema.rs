use crate::core::aggregate::coerce_numeric;
use crate::domain::model::{Category, Table};
use crate::utils::error::AggregationError;
use std::collections::HashMap;

pub const EMPLOYEE_NAME: &str = "Employee Name";
pub const DEPARTMENT: &str = "Department";
pub const LOCATION: &str = "Location";
pub const SENIORITY_LEVEL: &str = "Seniority Level";
pub const EMPLOYEE_AGE: &str = "Employee Age";
pub const EMPLOYEE_STATUS: &str = "Employee Status";
pub const EMPLOYEE_GENDER: &str = "Employee Gender";

pub const TRIP_ID: &str = "Trip ID";
pub const DURATION: &str = "Duration";
pub const TRAVEL_DISTANCE: &str = "Travel Distance";
pub const DISTANCE_MILES: &str = "Distance (miles)";
pub const START_DATE: &str = "Start date";
pub const END_DATE: &str = "End date";
pub const ACCOMMODATION_TYPE: &str = "Accommodation type";
pub const PURPOSE_OF_TRAVEL: &str = "Purpose of Travel";
pub const TRANSPORTATION_TYPE: &str = "Transportation type";
pub const TRAVEL_CLASS: &str = "Travel Class";

pub const ACCOMMODATION_COST: &str = "Accommodation Cost";
pub const TRANSPORTATION_COST: &str = "Transportation Cost";
pub const MEAL_EXPENSES: &str = "Meal Expenses";
pub const TOTAL_TRAVEL_EXPENSE: &str = "Total Travel Expense";
pub const TIPS_GRATUITIES: &str = "Tips/Gratuities";
pub const CONFERENCE_FEES: &str = "Conference Fees";
pub const VISA_PASSPORT_FEES: &str = "Visa/Passport Fees";
pub const BUSINESS_SUPPLIES: &str = "Business Supplies";
pub const TRAVEL_INSURANCE: &str = "Travel Insurance";
pub const MISCELLANEOUS_EXPENSES: &str = "Miscellaneous Expenses";

/// Components of [`MISCELLANEOUS_EXPENSES`], in display order.
pub const MISCELLANEOUS_COMPONENTS: [&str; 4] = [
    TIPS_GRATUITIES,
    CONFERENCE_FEES,
    VISA_PASSPORT_FEES,
    BUSINESS_SUPPLIES,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Date,
    FreeText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRequirement {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn req(name: &'static str, kind: ColumnKind) -> ColumnRequirement {
    ColumnRequirement { name, kind }
}

const EMPLOYEE_COLUMNS: &[ColumnRequirement] = &[
    req(EMPLOYEE_NAME, ColumnKind::Categorical),
    req(DEPARTMENT, ColumnKind::Categorical),
    req(LOCATION, ColumnKind::Categorical),
    req(SENIORITY_LEVEL, ColumnKind::Categorical),
    req(EMPLOYEE_AGE, ColumnKind::Numeric),
    req(EMPLOYEE_STATUS, ColumnKind::Categorical),
    req(EMPLOYEE_GENDER, ColumnKind::Categorical),
];

const TRAVEL_COLUMNS: &[ColumnRequirement] = &[
    req(TRIP_ID, ColumnKind::Categorical),
    req(DURATION, ColumnKind::Numeric),
    req(TRAVEL_DISTANCE, ColumnKind::FreeText),
    req(START_DATE, ColumnKind::Date),
    req(END_DATE, ColumnKind::Date),
    req(ACCOMMODATION_TYPE, ColumnKind::Categorical),
    req(LOCATION, ColumnKind::Categorical),
    req(PURPOSE_OF_TRAVEL, ColumnKind::Categorical),
    req(TRANSPORTATION_TYPE, ColumnKind::Categorical),
    req(TRAVEL_CLASS, ColumnKind::Categorical),
];

const EXPENSE_COLUMNS: &[ColumnRequirement] = &[
    req(TRIP_ID, ColumnKind::Categorical),
    req(ACCOMMODATION_COST, ColumnKind::Numeric),
    req(TRANSPORTATION_COST, ColumnKind::Numeric),
    req(MEAL_EXPENSES, ColumnKind::Numeric),
    req(TOTAL_TRAVEL_EXPENSE, ColumnKind::Numeric),
    req(START_DATE, ColumnKind::Date),
    req(DEPARTMENT, ColumnKind::Categorical),
    req(TIPS_GRATUITIES, ColumnKind::Numeric),
    req(CONFERENCE_FEES, ColumnKind::Numeric),
    req(VISA_PASSPORT_FEES, ColumnKind::Numeric),
    req(BUSINESS_SUPPLIES, ColumnKind::Numeric),
    req(TRAVEL_INSURANCE, ColumnKind::Categorical),
    req(TRANSPORTATION_TYPE, ColumnKind::Categorical),
];

/// Columns a category's dashboard reads from the raw table.
pub fn expected_columns(category: Category) -> &'static [ColumnRequirement] {
    match category {
        Category::Employee => EMPLOYEE_COLUMNS,
        Category::Travel => TRAVEL_COLUMNS,
        Category::Expense => EXPENSE_COLUMNS,
    }
}

/// Result of the single validation pass run before any view is computed.
///
/// Holds at most one error per column: absent columns and, for numeric
/// columns, the first cell that does not coerce. Derived columns whose
/// derivation failed are recorded here too.
#[derive(Debug, Clone, Default)]
pub struct SchemaCheck {
    failures: HashMap<String, AggregationError>,
}

impl SchemaCheck {
    pub fn run(table: &Table, requirements: &[ColumnRequirement]) -> Self {
        let mut check = SchemaCheck::default();

        for requirement in requirements {
            let cells = match table.column(requirement.name) {
                Ok(cells) => cells,
                Err(err) => {
                    check.record(requirement.name, err);
                    continue;
                }
            };

            if requirement.kind == ColumnKind::Numeric {
                let first_bad = cells
                    .iter()
                    .enumerate()
                    .find_map(|(row, cell)| coerce_numeric(requirement.name, row, cell).err());
                if let Some(err) = first_bad {
                    check.record(requirement.name, err);
                }
            }
        }

        if !check.failures.is_empty() {
            tracing::warn!(
                "⚠️ Schema check found {} unusable column(s): {:?}",
                check.failures.len(),
                check.failures.keys().collect::<Vec<_>>()
            );
        }
        check
    }

    pub fn record(&mut self, column: &str, error: AggregationError) {
        self.failures.entry(column.to_string()).or_insert(error);
    }

    /// First recorded failure among `columns`, in the order given.
    pub fn require(&self, columns: &[&str]) -> std::result::Result<(), AggregationError> {
        match columns.iter().find_map(|c| self.failures.get(*c)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn failure(&self, column: &str) -> Option<&AggregationError> {
        self.failures.get(column)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Cell;

    #[test]
    fn test_schema_check_records_missing_and_non_numeric() {
        let table = Table::from_columns([
            (TRIP_ID, vec![Cell::Number(1.0), Cell::Number(2.0)]),
            (ACCOMMODATION_COST, vec![Cell::Number(100.0), Cell::text("n/a")]),
        ])
        .unwrap();

        let check = SchemaCheck::run(&table, expected_columns(Category::Expense));

        assert!(!check.is_clean());
        assert!(check.require(&[TRIP_ID]).is_ok());
        assert_eq!(
            check.failure(ACCOMMODATION_COST),
            Some(&AggregationError::NonNumericColumn {
                column: ACCOMMODATION_COST.to_string(),
                row: 1,
                value: "n/a".to_string(),
            })
        );
        assert_eq!(
            check.require(&[TRIP_ID, DEPARTMENT, MEAL_EXPENSES]),
            Err(AggregationError::column_not_found(DEPARTMENT))
        );
    }

    #[test]
    fn test_record_keeps_first_failure() {
        let mut check = SchemaCheck::default();
        check.record("Month", AggregationError::column_not_found(START_DATE));
        check.record("Month", AggregationError::column_not_found("other"));
        assert_eq!(
            check.require(&["Month"]),
            Err(AggregationError::column_not_found(START_DATE))
        );
    }

    #[test]
    fn test_every_category_lists_columns() {
        for category in Category::ALL {
            assert!(!expected_columns(category).is_empty());
        }
        assert_eq!(expected_columns(Category::Travel).len(), 10);
        assert_eq!(expected_columns(Category::Expense).len(), 13);
    }
}
