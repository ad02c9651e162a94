//! Filters transactions by search text, month and category, and groups them by day.

use serde::{Deserialize, Serialize};
use time::{Date, UtcOffset, macros::format_description};

use super::core::Transaction;

/// The English month names, indexed by the month filter value.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The value used in forms and query strings for "no filter".
pub const ALL: &str = "all";

/// The raw filter fields from a query string, e.g. `?search=coffee&month=0&category=all`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterQuery {
    /// Text to look for in transaction titles.
    pub search: String,
    /// A month index from 0 (January) to 11 (December), or "all".
    pub month: String,
    /// A category name, or "all".
    pub category: String,
}

/// The month predicate of a [TransactionFilter].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    /// A zero-based month index, 0 for January.
    Index(u8),
    /// A month value that names no month. Nothing matches it.
    Unknown,
}

/// The query value written back for [MonthFilter::Unknown].
const UNKNOWN_MONTH: &str = "none";

/// Predicates for narrowing down a list of transactions.
///
/// Every predicate must match for a transaction to be kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Case-insensitive text that must appear in the title. Empty matches everything.
    pub search: String,
    /// The month the transaction was created in, `None` for any month.
    pub month: Option<MonthFilter>,
    /// The exact category, `None` for any category.
    pub category: Option<String>,
}

impl From<FilterQuery> for TransactionFilter {
    fn from(query: FilterQuery) -> Self {
        let month = match query.month.trim() {
            "" | ALL => None,
            month => Some(
                month
                    .parse::<u8>()
                    .ok()
                    .filter(|month| (*month as usize) < MONTH_NAMES.len())
                    .map_or(MonthFilter::Unknown, MonthFilter::Index),
            ),
        };

        let category = match query.category.trim() {
            "" | ALL => None,
            category => Some(category.to_owned()),
        };

        Self {
            search: query.search,
            month,
            category,
        }
    }
}

impl TransactionFilter {
    /// Whether no predicate would remove anything.
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.month.is_none() && self.category.is_none()
    }

    /// The filter as query fields, with "all" for unset predicates.
    pub fn to_query(&self) -> FilterQuery {
        FilterQuery {
            search: self.search.clone(),
            month: self
                .month
                .map(|month| match month {
                    MonthFilter::Index(index) => index.to_string(),
                    MonthFilter::Unknown => UNKNOWN_MONTH.to_owned(),
                })
                .unwrap_or_else(|| ALL.to_owned()),
            category: self.category.clone().unwrap_or_else(|| ALL.to_owned()),
        }
    }

    /// The filter as a URL query string without the leading '?'.
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self.to_query()).unwrap_or_default()
    }

    /// Whether `transaction` matches every predicate.
    ///
    /// Months are taken from the creation time in `local_offset`. A
    /// transaction without a creation time never matches a specific month,
    /// and nothing matches [MonthFilter::Unknown].
    pub fn matches(&self, transaction: &Transaction, local_offset: UtcOffset) -> bool {
        let search_matches = self.search.is_empty()
            || transaction
                .title
                .to_lowercase()
                .contains(&self.search.to_lowercase());

        let category_matches = self
            .category
            .as_ref()
            .is_none_or(|category| *category == transaction.category);

        let month_matches = self.month.is_none_or(|month| match month {
            MonthFilter::Index(index) => transaction.created_at.is_some_and(|created_at| {
                u8::from(created_at.to_offset(local_offset).month()) - 1 == index
            }),
            MonthFilter::Unknown => false,
        });

        search_matches && category_matches && month_matches
    }
}

/// Keep the transactions that match `filter`, in their original order.
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
    local_offset: UtcOffset,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction, local_offset))
        .cloned()
        .collect()
}

/// The transactions created on one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    /// The local date the transactions were created on.
    pub date: Date,
    /// The transactions in the order they were given.
    pub transactions: Vec<Transaction>,
}

impl DateGroup {
    /// The date in long form, e.g. "Wednesday, 15 January 2025".
    pub fn label(&self) -> String {
        self.date
            .format(format_description!(
                "[weekday], [day padding:none] [month repr:long] [year]"
            ))
            .unwrap_or_else(|_| self.date.to_string())
    }
}

/// Group transactions by the local date they were created on.
///
/// Groups are ordered by when their date is first seen. Transactions without
/// a creation time are left out.
pub fn group_by_date(transactions: &[Transaction], local_offset: UtcOffset) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();

    for transaction in transactions {
        let Some(created_at) = transaction.created_at else {
            continue;
        };
        let date = created_at.to_offset(local_offset).date();

        match groups.iter().position(|group| group.date == date) {
            Some(index) => groups[index].transactions.push(transaction.clone()),
            None => groups.push(DateGroup {
                date,
                transactions: vec![transaction.clone()],
            }),
        }
    }

    groups
}

/// The distinct categories of `transactions`, in first seen order.
pub fn categories(transactions: &[Transaction]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();

    for transaction in transactions {
        if !categories.contains(&transaction.category) {
            categories.push(transaction.category.clone());
        }
    }

    categories
}

#[cfg(test)]
mod filter_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::transaction::{Transaction, TransactionType};

    use super::{FilterQuery, MonthFilter, TransactionFilter, categories, filter_transactions};

    fn transaction(id: i64, title: &str, category: &str, created_at: &str) -> Transaction {
        Transaction {
            id,
            title: title.to_owned(),
            amount: 1_000.0,
            kind: TransactionType::Expense,
            category: category.to_owned(),
            created_at: time::OffsetDateTime::parse(
                created_at,
                &time::format_description::well_known::Rfc3339,
            )
            .ok(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            transaction(1, "Morning Coffee", "Food", "2025-01-15T01:00:00Z"),
            transaction(2, "Bus ticket", "Transport", "2025-01-20T01:00:00Z"),
            transaction(3, "Coffee beans", "Shopping", "2025-02-03T01:00:00Z"),
            transaction(4, "Mystery", "Food", "not a date"),
        ]
    }

    fn ids(transactions: &[Transaction]) -> Vec<i64> {
        transactions.iter().map(|transaction| transaction.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = TransactionFilter::default();

        let got = filter_transactions(&sample(), &filter, UtcOffset::UTC);

        assert!(filter.is_empty());
        assert_eq!(ids(&got), vec![1, 2, 3, 4]);
    }

    #[test]
    fn search_ignores_case() {
        let filter = TransactionFilter {
            search: "COFFEE".to_owned(),
            ..Default::default()
        };

        let got = filter_transactions(&sample(), &filter, UtcOffset::UTC);

        assert_eq!(ids(&got), vec![1, 3]);
    }

    #[test]
    fn category_must_match_exactly() {
        let filter = TransactionFilter {
            category: Some("Food".to_owned()),
            ..Default::default()
        };

        let got = filter_transactions(&sample(), &filter, UtcOffset::UTC);

        assert_eq!(ids(&got), vec![1, 4]);
    }

    #[test]
    fn month_skips_transactions_without_timestamp() {
        let filter = TransactionFilter {
            month: Some(MonthFilter::Index(0)),
            ..Default::default()
        };

        let got = filter_transactions(&sample(), &filter, UtcOffset::UTC);

        assert_eq!(ids(&got), vec![1, 2]);
    }

    #[test]
    fn month_uses_local_offset() {
        let late_january_utc = Transaction {
            created_at: Some(datetime!(2025-01-31 20:00 UTC)),
            ..transaction(1, "Dinner", "Food", "")
        };
        let filter = TransactionFilter {
            month: Some(MonthFilter::Index(1)),
            ..Default::default()
        };
        let jakarta = UtcOffset::from_hms(7, 0, 0).unwrap();

        assert!(filter.matches(&late_january_utc, jakarta));
        assert!(!filter.matches(&late_january_utc, UtcOffset::UTC));
    }

    #[test]
    fn predicates_are_combined() {
        let filter = TransactionFilter {
            search: "coffee".to_owned(),
            month: Some(MonthFilter::Index(0)),
            category: Some("Food".to_owned()),
        };

        let got = filter_transactions(&sample(), &filter, UtcOffset::UTC);

        assert_eq!(ids(&got), vec![1]);
    }

    #[test]
    fn search_match_with_wrong_category_is_excluded() {
        let filter = TransactionFilter {
            search: "coffee".to_owned(),
            month: None,
            category: Some("Shopping".to_owned()),
        };

        let got = filter_transactions(&sample(), &filter, UtcOffset::UTC);

        assert_eq!(ids(&got), vec![3]);
    }

    #[test]
    fn unknown_month_matches_nothing() {
        for query_string in ["month=12", "month=abc", "month=-1"] {
            let query: FilterQuery = serde_urlencoded::from_str(query_string).unwrap();
            let filter = TransactionFilter::from(query);

            assert_eq!(filter.month, Some(MonthFilter::Unknown), "query {query_string:?}");
            assert!(
                filter_transactions(&sample(), &filter, UtcOffset::UTC).is_empty(),
                "query {query_string:?} should match nothing"
            );
        }
    }

    #[test]
    fn unknown_month_survives_query_string() {
        let query: FilterQuery = serde_urlencoded::from_str("month=abc").unwrap();
        let filter = TransactionFilter::from(query);

        assert_eq!(filter.to_query_string(), "search=&month=none&category=all");
    }

    #[test]
    fn parses_query() {
        let query: FilterQuery =
            serde_urlencoded::from_str("search=bus&month=11&category=Transport").unwrap();

        assert_eq!(
            TransactionFilter::from(query),
            TransactionFilter {
                search: "bus".to_owned(),
                month: Some(MonthFilter::Index(11)),
                category: Some("Transport".to_owned()),
            }
        );
    }

    #[test]
    fn all_and_empty_mean_no_filter() {
        for query_string in ["", "month=all&category=all", "month=&category="] {
            let query: FilterQuery = serde_urlencoded::from_str(query_string).unwrap();

            assert_eq!(
                TransactionFilter::from(query),
                TransactionFilter::default(),
                "query {query_string:?} should not filter anything"
            );
        }
    }

    #[test]
    fn query_string_uses_all_for_unset_predicates() {
        let filter = TransactionFilter {
            search: "bus ticket".to_owned(),
            month: Some(MonthFilter::Index(0)),
            category: None,
        };

        assert_eq!(
            filter.to_query_string(),
            "search=bus+ticket&month=0&category=all"
        );
    }

    #[test]
    fn lists_categories_in_first_seen_order() {
        assert_eq!(
            categories(&sample()),
            vec!["Food".to_owned(), "Transport".to_owned(), "Shopping".to_owned()]
        );
    }
}
