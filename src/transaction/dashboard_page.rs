//! The dashboard: balance, income and expense totals, spending by category,
//! the add-transaction form and the list of transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use time::UtcOffset;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, EXPENSE_TEXT_STYLE, FORM_LABEL_STYLE,
        FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, HeadElement, INCOME_TEXT_STYLE, PAGE_CONTAINER_STYLE, base,
        format_currency, link, loading_spinner, rupiah_input_styles,
    },
    navigation::NavBar,
    timezone::local_offset_or_error,
};

use super::{
    aggregate::{CategoryTotal, Totals, category_breakdown, totals},
    chart::{DashboardChart, ECHARTS_SCRIPT, category_breakdown_chart, chart_view, charts_script},
    core::{SUGGESTED_CATEGORIES, Transaction, list_transactions},
    view::transaction_row,
};

/// How long the balance takes to count up to its value, in milliseconds.
const BALANCE_ANIMATION_MS: u32 = 480;

const CATEGORY_CHART_ID: &str = "category-chart";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the dashboard for the logged in user.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
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

    Ok(dashboard_view(&transactions, local_offset).into_response())
}

fn dashboard_view(transactions: &[Transaction], local_offset: UtcOffset) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let totals = totals(transactions);
    let breakdown = category_breakdown(transactions);

    let chart = (!breakdown.is_empty()).then(|| DashboardChart {
        id: CATEGORY_CHART_ID,
        options: category_breakdown_chart(&breakdown).to_string(),
    });

    let mut head_elements = vec![rupiah_input_styles(), balance_script()];

    if let Some(chart) = &chart {
        head_elements.push(HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()));
        head_elements.push(charts_script(std::slice::from_ref(chart)));
    }

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (balance_card(&totals))
            (breakdown_card(&breakdown, chart.as_ref()))
            (create_transaction_form())
            (transaction_list(transactions, local_offset))
        }
    };

    base("Dashboard", &head_elements, &content)
}

fn balance_card(totals: &Totals) -> Markup {
    let balance = totals.balance();

    html! {
        section
            class="w-full p-6 rounded-lg shadow-sm text-white bg-gradient-to-br
                from-blue-600 via-blue-700 to-cyan-600"
        {
            p class="text-xs font-medium uppercase tracking-wide opacity-80" { "Total Balance" }

            p
                id="balance"
                class="mt-2 text-4xl font-bold tracking-tight"
                data-balance=(balance)
            {
                (format_currency(balance))
            }
        }

        div class="grid w-full grid-cols-2 gap-4"
        {
            div class=(CARD_STYLE)
            {
                p class="text-xs text-gray-500 dark:text-gray-400" { "Income" }
                p id="income-total" class={ "text-lg font-semibold " (INCOME_TEXT_STYLE) }
                {
                    (format_currency(totals.income))
                }
            }

            div class=(CARD_STYLE)
            {
                p class="text-xs text-gray-500 dark:text-gray-400" { "Expenses" }
                p id="expense-total" class={ "text-lg font-semibold " (EXPENSE_TEXT_STYLE) }
                {
                    (format_currency(totals.expense))
                }
            }
        }
    }
}

/// Counts the balance up from zero when the page loads.
///
/// The server renders the final value, so the page still shows the right
/// balance without JavaScript.
fn balance_script() -> HeadElement {
    HeadElement::ScriptSource(PreEscaped(format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const element = document.getElementById('balance');
            if (!element) return;

            const end = Number(element.dataset.balance);
            if (!Number.isFinite(end)) return;

            const formatter = new Intl.NumberFormat('en-US', {{ maximumFractionDigits: 0 }});
            const format = (value) => (value < 0 ? '-Rp ' : 'Rp ') + formatter.format(Math.abs(value));
            const duration = {BALANCE_ANIMATION_MS};
            const startTime = performance.now();

            function animate(now) {{
                const progress = Math.min((now - startTime) / duration, 1);
                element.textContent = format(Math.round(end * progress));
                if (progress < 1) requestAnimationFrame(animate);
            }}

            requestAnimationFrame(animate);
        }});"#
    )))
}

fn breakdown_card(breakdown: &[CategoryTotal], chart: Option<&DashboardChart>) -> Markup {
    html! {
        section id="category-breakdown" class=(CARD_STYLE)
        {
            h2 class="text-sm font-semibold mb-4" { "Expense Breakdown" }

            @match chart {
                Some(chart) => {
                    (chart_view(chart))

                    ul class="mt-4 divide-y divide-gray-200 dark:divide-gray-700"
                    {
                        @for bucket in breakdown {
                            li class="flex justify-between py-2 text-sm"
                            {
                                span { (bucket.category) }
                                span class="font-semibold" { (format_currency(bucket.total)) }
                            }
                        }
                    }
                }
                None => {
                    p class="py-10 text-center text-xs text-gray-400"
                    {
                        "No expenses yet, you are doing great."
                    }
                }
            }
        }
    }
}

fn create_transaction_form() -> Markup {
    let spinner = loading_spinner();

    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class={ "space-y-4 " (CARD_STYLE) }
        {
            h2 class="text-sm font-semibold" { "Add Transaction" }

            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                input
                    name="title"
                    id="title"
                    type="text"
                    placeholder="Transaction title"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        name="amount"
                        id="amount"
                        type="number"
                        min="0"
                        step="any"
                        placeholder="0"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    label class="flex-1"
                    {
                        input
                            type="radio"
                            name="type"
                            value="expense"
                            checked
                            required
                            class=(FORM_RADIO_INPUT_STYLE);
                        span class=(FORM_RADIO_LABEL_STYLE) { "Expense" }
                    }

                    label class="flex-1"
                    {
                        input
                            type="radio"
                            name="type"
                            value="income"
                            required
                            class=(FORM_RADIO_INPUT_STYLE);
                        span class=(FORM_RADIO_LABEL_STYLE) { "Income" }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in SUGGESTED_CATEGORIES {
                        option value=(category) { (category) }
                    }
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (spinner) }
                " Add Transaction"
            }
        }
    }
}

fn transaction_list(transactions: &[Transaction], local_offset: UtcOffset) -> Markup {
    html! {
        section id="recent-transactions" class=(CARD_STYLE)
        {
            div class="flex justify-between items-center"
            {
                h2 class="text-sm font-semibold" { "Recent Transactions" }
                (link(endpoints::TRANSACTIONS_VIEW, "View history"))
            }

            @if transactions.is_empty() {
                p class="py-8 text-center text-xs text-gray-400" { "No transactions yet" }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for transaction in transactions {
                        (transaction_row(transaction, local_offset))
                    }
                }
            }
        }
    }
}
