//! Markup shared by the pages that list transactions.

use maud::{Markup, html};
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE,
        format_currency, format_title,
    },
};

use super::core::{Transaction, TransactionType};

/// Format a creation time as a short local date, e.g. "15/01/2025".
pub fn short_date(created_at: Option<OffsetDateTime>, local_offset: UtcOffset) -> String {
    created_at
        .and_then(|created_at| {
            created_at
                .to_offset(local_offset)
                .format(format_description!("[day]/[month]/[year]"))
                .ok()
        })
        .unwrap_or_else(|| "-".to_owned())
}

/// The amount with a sign and colour for its type.
pub fn signed_amount(transaction: &Transaction) -> Markup {
    let (sign, style) = match transaction.kind {
        TransactionType::Income => ("+", INCOME_TEXT_STYLE),
        TransactionType::Expense => ("-", EXPENSE_TEXT_STYLE),
    };

    html! {
        span class={ "font-semibold " (style) }
        {
            @if transaction.amount.is_finite() {
                (sign) (format_currency(transaction.amount))
            } @else {
                (format_currency(transaction.amount))
            }
        }
    }
}

/// A list item for a transaction with a delete button.
///
/// Deleting sends `DELETE /api/transactions/{id}`; on success the server asks
/// htmx to refresh the page so that totals are recomputed.
pub fn transaction_row(transaction: &Transaction, local_offset: UtcOffset) -> Markup {
    let (title, tooltip) = format_title(&transaction.title);
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

    html! {
        li
            class="flex justify-between items-start gap-4 py-3"
            data-transaction-id=(transaction.id)
        {
            div class="min-w-0 flex-1"
            {
                p class="truncate text-sm font-semibold" title=[tooltip] { (title) }

                div class="mt-1 flex items-center gap-2 text-xs text-gray-500 dark:text-gray-400"
                {
                    span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
                    span { (short_date(transaction.created_at, local_offset)) }
                }
            }

            div class="text-right shrink-0"
            {
                p class="text-base" { (signed_amount(transaction)) }

                button
                    type="button"
                    hx-delete=(delete_url)
                    hx-confirm={ "Delete \"" (transaction.title) "\"?" }
                    hx-target-error="#alert-container"
                    class={ "text-xs " (BUTTON_DELETE_STYLE) }
                {
                    "Delete"
                }
            }
        }
    }
}

#[cfg(test)]
mod view_tests {
    use scraper::{Html, Selector};
    use time::{UtcOffset, macros::datetime};

    use crate::transaction::{Transaction, TransactionType};

    use super::{short_date, signed_amount, transaction_row};

    fn coffee() -> Transaction {
        Transaction {
            id: 7,
            title: "Coffee".to_owned(),
            amount: 45_000.0,
            kind: TransactionType::Expense,
            category: "Food".to_owned(),
            created_at: Some(datetime!(2025-01-15 20:00 UTC)),
        }
    }

    #[test]
    fn short_date_uses_local_offset() {
        let jakarta = UtcOffset::from_hms(7, 0, 0).unwrap();

        assert_eq!(short_date(coffee().created_at, jakarta), "16/01/2025");
        assert_eq!(short_date(None, jakarta), "-");
    }

    #[test]
    fn expenses_are_negative() {
        let html = signed_amount(&coffee()).into_string();

        assert!(html.contains("-Rp 45,000"), "got {html}");
    }

    #[test]
    fn row_has_delete_button() {
        let html = Html::parse_fragment(&transaction_row(&coffee(), UtcOffset::UTC).into_string());

        let button = html
            .select(&Selector::parse("button").unwrap())
            .next()
            .expect("No delete button found");
        assert_eq!(
            button.value().attr("hx-delete"),
            Some("/api/transactions/7")
        );
        assert_eq!(
            button.value().attr("hx-target-error"),
            Some("#alert-container")
        );
    }
}
