use super::{object_schema, ToolContext, ToolDefinition, ToolFuture};
use crate::errors::AppResult;
use crate::formatting::rule;
use crate::harness::arguments::ToolArguments;
use crate::models::{number_field, present_field, OrderKind, PageRequest, Record, StatusCategory, StatusValue, MAX_PAGE_SIZE};
use crate::quality::filter_quality;
use chrono::Duration;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

const DEFAULT_DAYS_BACK: i64 = 7;
const TOP_CUSTOMERS: usize = 5;

pub fn definitions() -> Vec<ToolDefinition> {
    let schema = object_schema(
        json!({ "days_back": { "type": "integer", "minimum": 1, "maximum": 3650 } }),
        &[],
    );
    vec![
        ToolDefinition::new(
            "get_production_summary",
            "Quick dashboard of recently modified production orders: counts by status category and top customers.",
            schema.clone(),
            "production summary",
            get_production_summary,
        ),
        ToolDefinition::new(
            "get_orders_summary",
            "Quick dashboard of recently modified customer orders: counts by status category, total value and top customers.",
            schema,
            "customer orders summary",
            get_orders_summary,
        ),
    ]
}

/// Aggregates over one page of quality-filtered records.
#[derive(Debug, Default)]
struct Summary {
    total: usize,
    by_category: BTreeMap<&'static str, usize>,
    customers: Vec<(String, usize)>,
    total_value: f64,
}

impl Summary {
    fn from_records(records: &[Record], demo_mode: bool) -> Self {
        let mut by_category = BTreeMap::new();
        let mut customer_counts: HashMap<String, usize> = HashMap::new();
        let mut total_value = 0.0;

        for record in records {
            let category = StatusValue::of(record)
                .map(|status| status.category())
                .unwrap_or(StatusCategory::Other);
            *by_category.entry(category.as_str()).or_insert(0) += 1;

            if !demo_mode {
                let customer = present_field(record, "customerName").unwrap_or_else(|| "Unknown".to_string());
                *customer_counts.entry(customer).or_insert(0) += 1;
            }

            if let Some(positions) = record.get("positions").and_then(Value::as_array) {
                total_value += positions
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|position| {
                        number_field(position, "netPricePerUnit").unwrap_or(0.0)
                            * number_field(position, "targetQuantity").unwrap_or(0.0)
                    })
                    .sum::<f64>();
            }
        }

        let mut customers: Vec<(String, usize)> = customer_counts.into_iter().collect();
        customers.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
        customers.truncate(TOP_CUSTOMERS);

        Self {
            total: records.len(),
            by_category,
            customers,
            total_value,
        }
    }

    fn render(&self, title: &str, days_back: i64, with_value: bool) -> String {
        let mut text = format!("{}\nLast {} days\n{}\n\nOVERVIEW:\n", title, days_back, rule('='));
        text.push_str(&format!("   Total Orders: {}\n", self.total));
        if with_value {
            text.push_str(&format!("   Total Value: €{}\n", format_money(self.total_value)));
        }
        text.push_str("   Data Quality: Filtered for production data only\n\nSTATUS BREAKDOWN:\n");
        for (category, count) in &self.by_category {
            let percentage = if self.total > 0 {
                *count as f64 / self.total as f64 * 100.0
            } else {
                0.0
            };
            text.push_str(&format!("   {}: {} ({:.1}%)\n", category, count, percentage));
        }
        if !self.customers.is_empty() {
            text.push_str("\nTOP CUSTOMERS:\n");
            for (customer, count) in &self.customers {
                text.push_str(&format!("   {}: {} orders\n", customer, count));
            }
        }
        text.push_str("\nNOTE: Use the listing tools for detailed order information and pagination.\n");
        text
    }
}

/// Two decimals with thousands separators, e.g. `12,345.60`.
fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

async fn summarize(
    context: &ToolContext,
    arguments: &ToolArguments,
    kind: OrderKind,
    title: &str,
) -> AppResult<String> {
    let days_back = arguments.i64_or("days_back", DEFAULT_DAYS_BACK);
    let since = Duration::try_days(days_back)
        .and_then(|window| context.now().checked_sub_signed(window))
        .map(|start| start.format("%Y-%m-%dT00:00:00").to_string());
    let request = PageRequest::new(MAX_PAGE_SIZE).with_since(since);

    let page = context.source.fetch_page(kind, &request).await?;
    let label = match kind {
        OrderKind::CustomerOrder => "customer order data",
        OrderKind::ProductionOrder => "production data",
    };
    if page.is_empty() {
        return Ok(format!("No {} found for the last {} days.", label, days_back));
    }
    let records = filter_quality(page.into_records());
    if records.is_empty() {
        return Ok(format!(
            "No {} found for the last {} days (after quality filtering).",
            label, days_back
        ));
    }

    tracing::info!(kind = kind.as_str(), records = records.len(), days_back, "building summary dashboard");
    let summary = Summary::from_records(&records, context.demo_mode);
    Ok(summary.render(title, days_back, kind == OrderKind::CustomerOrder))
}

fn get_production_summary<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(summarize(
        context,
        arguments,
        OrderKind::ProductionOrder,
        "PRODUCTION SUMMARY DASHBOARD",
    ))
}

fn get_orders_summary<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(summarize(
        context,
        arguments,
        OrderKind::CustomerOrder,
        "CUSTOMER ORDERS SUMMARY DASHBOARD",
    ))
}
