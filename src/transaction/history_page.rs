//! The transaction history page with search, month and category filters.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::UtcOffset;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{
        BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, link,
    },
    navigation::NavBar,
    timezone::local_offset_or_error,
};

use super::{
    core::{Transaction, list_transactions},
    filter::{
        ALL, DateGroup, FilterQuery, MONTH_NAMES, MonthFilter, TransactionFilter, categories,
        filter_transactions, group_by_date,
    },
    view::transaction_row,
};

/// The state needed for displaying the history page.
#[derive(Debug, Clone)]
pub struct HistoryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
}

impl FromRef<AppState> for HistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the user's transactions grouped by day, narrowed down by the
/// filters in the query string.
pub async fn get_history_page(
    State(state): State<HistoryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let filter = TransactionFilter::from(query);

    Ok(history_view(&transactions, &filter, local_offset).into_response())
}

fn history_view(
    transactions: &[Transaction],
    filter: &TransactionFilter,
    local_offset: UtcOffset,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let filtered = filter_transactions(transactions, filter, local_offset);
    let groups = group_by_date(&filtered, local_offset);
    let export_url = format!("{}?{}", endpoints::EXPORT, filter.to_query_string());

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="self-start text-xl font-bold" { "Transaction History" }

            (filter_form(filter, &categories(transactions)))

            @if !filter.is_empty() {
                p id="filter-summary" class="self-start text-sm"
                {
                    "Showing " (filtered.len()) " of " (transactions.len()) " transactions. "
                    (link(endpoints::TRANSACTIONS_VIEW, "Clear filters"))
                }
            }

            a
                id="export-link"
                href=(export_url)
                download="transactions.csv"
                class=(BUTTON_SECONDARY_STYLE)
            {
                "Export CSV"
            }

            (grouped_list(&groups, local_offset))
        }
    };

    base("History", &[], &content)
}

fn filter_form(filter: &TransactionFilter, categories: &[String]) -> Markup {
    let selected_category = filter.category.as_deref().unwrap_or(ALL);

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class={ "grid grid-cols-1 gap-4 sm:grid-cols-3 " (CARD_STYLE) }
        {
            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }

                input
                    type="search"
                    name="search"
                    id="search"
                    placeholder="Search titles"
                    value=(filter.search)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }

                select name="month" id="month" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value=(ALL) selected[filter.month.is_none()] { "All months" }

                    @for (index, name) in MONTH_NAMES.iter().enumerate() {
                        option
                            value=(index)
                            selected[filter.month == Some(MonthFilter::Index(index as u8))]
                        {
                            (name)
                        }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value=(ALL) selected[selected_category == ALL] { "All categories" }

                    @for category in categories {
                        option
                            value=(category)
                            selected[selected_category == category]
                        {
                            (category)
                        }
                    }
                }
            }

            button type="submit" class={ "sm:col-span-3 " (BUTTON_SECONDARY_STYLE) }
            {
                "Apply filters"
            }
        }
    }
}

fn grouped_list(groups: &[DateGroup], local_offset: UtcOffset) -> Markup {
    html! {
        section id="history" class="w-full space-y-4"
        {
            @if groups.is_empty() {
                p class="py-8 text-center text-sm text-gray-400" { "No transactions found" }
            }

            @for group in groups {
                div class=(CARD_STYLE)
                {
                    h2 class="text-sm font-semibold text-gray-500 dark:text-gray-400"
                    {
                        (group.label())
                    }

                    ul class="divide-y divide-gray-200 dark:divide-gray-700"
                    {
                        @for transaction in &group.transactions {
                            (transaction_row(transaction, local_offset))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod history_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        transaction::{FilterQuery, NewTransaction, create_transaction},
    };

    use super::{HistoryState, get_history_page};

    fn get_test_state() -> (HistoryState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let transactions = [
            ("Coffee", "45000", "expense", "Food", datetime!(2025-01-15 01:00 UTC)),
            ("Lunch", "30000", "expense", "Food", datetime!(2025-01-15 05:00 UTC)),
            ("Salary", "5000000", "income", "Other", datetime!(2025-02-01 02:00 UTC)),
        ];

        for (title, amount, kind, category, created_at) in transactions {
            create_transaction(
                user.id,
                NewTransaction::parse(title, amount, kind, category)
                    .unwrap()
                    .created_at(created_at),
                &connection,
            )
            .unwrap();
        }

        let state = HistoryState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Jakarta".to_owned(),
        };

        (state, user.id)
    }

    fn group_labels(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("#history h2").unwrap())
            .map(|heading| heading.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn groups_transactions_by_day() {
        let (state, user_id) = get_test_state();

        let response = get_history_page(
            State(state),
            Extension(user_id),
            Query(FilterQuery::default()),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            group_labels(&html),
            vec![
                "Saturday, 1 February 2025".to_owned(),
                "Wednesday, 15 January 2025".to_owned()
            ]
        );
        let rows = html.select(&Selector::parse("#history li").unwrap()).count();
        assert_eq!(rows, 3);
    }

    #[tokio::test]
    async fn applies_filters_from_query() {
        let (state, user_id) = get_test_state();
        let query = FilterQuery {
            search: "coff".to_owned(),
            month: "0".to_owned(),
            category: "Food".to_owned(),
        };

        let response = get_history_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(
            group_labels(&html),
            vec!["Wednesday, 15 January 2025".to_owned()]
        );
        let rows = html.select(&Selector::parse("#history li").unwrap()).count();
        assert_eq!(rows, 1);
        let summary = html
            .select(&Selector::parse("#filter-summary").unwrap())
            .next()
            .expect("filtered page should show a summary");
        assert!(
            summary
                .text()
                .collect::<String>()
                .contains("Showing 1 of 3 transactions."),
            "got summary {:?}",
            summary.text().collect::<String>()
        );
    }

    #[tokio::test]
    async fn export_link_keeps_filters() {
        let (state, user_id) = get_test_state();
        let query = FilterQuery {
            search: String::new(),
            month: "1".to_owned(),
            category: "all".to_owned(),
        };

        let response = get_history_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let href = html
            .select(&Selector::parse("#export-link").unwrap())
            .next()
            .expect("No export link found")
            .value()
            .attr("href")
            .map(str::to_owned);
        assert_eq!(
            href.as_deref(),
            Some("/api/transactions/export?search=&month=1&category=all")
        );
    }

    #[tokio::test]
    async fn selects_current_filters_in_form() {
        let (state, user_id) = get_test_state();
        let query = FilterQuery {
            search: "sal".to_owned(),
            month: "1".to_owned(),
            category: "Other".to_owned(),
        };

        let response = get_history_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let selected: Vec<String> = html
            .select(&Selector::parse("option[selected]").unwrap())
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect();
        assert_eq!(selected, vec!["1".to_owned(), "Other".to_owned()]);
        let search_value = html
            .select(&Selector::parse("input[name=search]").unwrap())
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(str::to_owned);
        assert_eq!(search_value.as_deref(), Some("sal"));
    }

    #[tokio::test]
    async fn shows_message_when_nothing_matches() {
        let (state, user_id) = get_test_state();
        let query = FilterQuery {
            search: "nothing like this".to_owned(),
            ..Default::default()
        };

        let response = get_history_page(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let message = html
            .select(&Selector::parse("#history p").unwrap())
            .next()
            .expect("No empty message found")
            .text()
            .collect::<String>();
        assert_eq!(message.trim(), "No transactions found");
    }
}
