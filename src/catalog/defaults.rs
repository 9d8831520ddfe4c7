use super::FieldDescriptor;

/// Derived column: `CURRENT_AVM_VALUE - CURRENT_SALE_MTG_1_LOAN_AMOUNT`.
pub const EQUITY_COLUMN: &str = "EQUITY";
/// Derived column: year of the last recorded sale.
pub const SALE_YEAR_COLUMN: &str = "SALE_YEAR";
pub const MEDIAN_HOME_PRICE_COLUMN: &str = "MEDIAN_HOME_PRICE";
pub const MEDIAN_SQFT_COLUMN: &str = "MEDIAN_SQFT";
pub const MORTGAGE_BALANCE_COLUMN: &str = "CURRENT_SALE_MTG_1_LOAN_AMOUNT";
pub const INTEREST_RATE_COLUMN: &str = "CURRENT_SALE_MTG_1_INT_RATE";

/// The homeowner fields every deployment ships with, in listing order.
pub(super) fn homeowner_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::numeric("Age", "AGE", "Client age"),
        FieldDescriptor::numeric("YearsOwned", "LENGTH_OF_RESIDENCE", "Years of ownership"),
        FieldDescriptor::numeric("Equity", EQUITY_COLUMN, "Home equity ($)"),
        FieldDescriptor::numeric(
            "Rate",
            INTEREST_RATE_COLUMN,
            "Mortgage interest rate (decimal)",
        ),
        FieldDescriptor::numeric(
            "Mortgage_Balance",
            MORTGAGE_BALANCE_COLUMN,
            "Current mortgage balance ($)",
        ),
        FieldDescriptor::numeric("HomeSQFT", "SUM_BUILDING_SQFT", "Home square footage"),
        FieldDescriptor::numeric("MedianSQFT", MEDIAN_SQFT_COLUMN, "ZIP median square footage"),
        FieldDescriptor::numeric(
            "MedianHomePrice",
            MEDIAN_HOME_PRICE_COLUMN,
            "ZIP median home price ($)",
        ),
        FieldDescriptor::numeric("LastSaleDate", SALE_YEAR_COLUMN, "Year of last sale"),
        FieldDescriptor::text("EmploymentStatus", "EMPLOYMENT_STATUS", "Employment status"),
        FieldDescriptor::boolean("IsOwner", "IS_OWNER", "Currently owns property"),
        FieldDescriptor::numeric(
            "InterestRate",
            INTEREST_RATE_COLUMN,
            "Mortgage interest rate (alias of Rate)",
        ),
    ]
}
