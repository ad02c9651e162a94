//! The ECharts pie chart of spending by category shown on the dashboard.

use charming::{
    Chart,
    component::{Legend, Title},
    element::{JsFunction, Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};

use crate::html::HeadElement;

use super::aggregate::CategoryTotal;

/// The path to the ECharts library served from the static directory.
pub const ECHARTS_SCRIPT: &str = "/static/echarts.6.0.0.min.js";

/// A chart with its HTML container ID and ECharts configuration.
pub struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the container the chart is drawn into.
pub fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[320px] w-full rounded dark:bg-gray-100"
        {}
    )
}

/// Generates JavaScript initialization code for charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

fn rupiah_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('id-ID', {
              style: 'currency',
              currency: 'IDR',
              maximumFractionDigits: 0
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// A pie chart with one slice per expense category.
pub fn category_breakdown_chart(breakdown: &[CategoryTotal]) -> Chart {
    let data: Vec<(f64, String)> = breakdown
        .iter()
        .map(|bucket| (bucket.total, bucket.category.clone()))
        .collect();

    Chart::new()
        .title(Title::new().text("Spending by category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(rupiah_formatter()),
        )
        .legend(Legend::new().bottom("0"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

#[cfg(test)]
mod chart_tests {
    use crate::{html::HeadElement, transaction::CategoryTotal};

    use super::{DashboardChart, category_breakdown_chart, charts_script};

    #[test]
    fn chart_options_contain_categories() {
        let breakdown = vec![
            CategoryTotal {
                category: "Food".to_owned(),
                total: 45_000.0,
            },
            CategoryTotal {
                category: "Transport".to_owned(),
                total: 3_500.0,
            },
        ];

        let options = category_breakdown_chart(&breakdown).to_string();

        assert!(options.contains("\"pie\""), "want a pie series in {options}");
        assert!(options.contains("Food"));
        assert!(options.contains("Transport"));
        assert!(options.contains("45000"));
    }

    #[test]
    fn script_initialises_every_chart() {
        let charts = [
            DashboardChart {
                id: "first-chart",
                options: "{}".to_owned(),
            },
            DashboardChart {
                id: "second-chart",
                options: "{}".to_owned(),
            },
        ];

        let HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("want an inline script");
        };

        assert!(script.0.starts_with("document.addEventListener('DOMContentLoaded'"));
        assert!(script.0.contains("document.getElementById(\"first-chart\")"));
        assert!(script.0.contains("document.getElementById(\"second-chart\")"));
    }
}
