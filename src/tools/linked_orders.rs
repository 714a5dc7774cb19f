use super::production_orders::{linked_production_orders, LOOKUP_PAGE_SIZE};
use super::{days_ago, object_schema, ToolContext, ToolDefinition, ToolFuture};
use crate::formatting::{format_record, rule};
use crate::harness::arguments::ToolArguments;
use crate::models::{present_field, OrderKind, PageRequest, ProductionStatus, Record, StatusValue};
use crate::quality::filter_quality;
use serde_json::json;

const DETAILED_LINK_SIZE: u32 = 20;
const DEFAULT_LINK_STATUS: &str = "RELEASED";
const DEFAULT_SINCE_DAYS: i64 = 30;
const DEFAULT_SALES_ORDERS: u32 = 15;

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "get_specific_sales_order_with_production",
            "One customer order (or a % pattern of them) with every production order created for it.",
            object_schema(
                json!({
                    "order_pattern": { "type": "string", "minLength": 1, "description": "e.g. 400139 or 400%" },
                    "include_details": { "type": "boolean", "description": "Show operations of each production order" },
                }),
                &["order_pattern"],
            ),
            "sales order with production",
            get_specific_sales_order_with_production,
        ),
        ToolDefinition::new(
            "get_sales_orders_with_production_by_status",
            "Recent customer orders with a given status, each with its linked production orders and a \
             production status breakdown.",
            object_schema(
                json!({
                    "status": { "type": "string", "description": "Customer order status, default RELEASED" },
                    "since_days": { "type": "integer", "minimum": 1, "maximum": 3650 },
                    "max_results": { "type": "integer", "minimum": 1, "maximum": 50 },
                }),
                &[],
            ),
            "sales orders with production",
            get_sales_orders_with_production_by_status,
        ),
    ]
}

/// Patterns without a wildcard match as prefixes.
fn as_prefix_pattern(pattern: &str) -> String {
    if pattern.contains('%') {
        pattern.to_string()
    } else {
        format!("{}%", pattern)
    }
}

fn get_specific_sales_order_with_production<'a>(
    context: &'a ToolContext,
    arguments: &'a ToolArguments,
) -> ToolFuture<'a> {
    Box::pin(async move {
        let pattern = arguments.required_str("order_pattern")?;
        let include_details = arguments.bool_or("include_details", true);
        let request = PageRequest::new(LOOKUP_PAGE_SIZE).with_search(Some(as_prefix_pattern(&pattern)));

        let sales_orders = context
            .source
            .fetch_page(OrderKind::CustomerOrder, &request)
            .await?
            .into_records();
        if sales_orders.is_empty() {
            return Ok(format!("No sales orders found matching pattern: {}", pattern));
        }

        let (link_size, production_format) = if include_details {
            (DETAILED_LINK_SIZE, context.detailed())
        } else {
            (LOOKUP_PAGE_SIZE, context.compact())
        };

        let mut text = format!(
            "SALES ORDER ANALYSIS: {}\nSales orders found: {}\n{}\n",
            pattern,
            sales_orders.len(),
            rule('=')
        );
        for sales_order in &sales_orders {
            text.push_str(&format_record(sales_order, OrderKind::CustomerOrder, &context.compact()));
            text.push_str("\nLINKED PRODUCTION ORDERS:\n");
            let Some(order_no) = present_field(sales_order, "customerOrderNo") else {
                text.push_str("  No order number to link by\n");
                text.push_str(&rule('-'));
                text.push('\n');
                continue;
            };
            match linked_production_orders(context, &order_no, link_size).await {
                Ok(linked) if linked.is_empty() => text.push_str("  No production orders found\n"),
                Ok(linked) => {
                    for production_order in &linked {
                        text.push_str(&format_record(production_order, OrderKind::ProductionOrder, &production_format));
                    }
                }
                Err(error) => {
                    tracing::warn!(order_no = %order_no, error = %error, "linking production orders failed");
                    text.push_str(&format!(
                        "  Error retrieving production orders: {}\n",
                        context.redactor.scrub(&error.to_string())
                    ));
                }
            }
            text.push_str(&rule('-'));
            text.push('\n');
        }
        Ok(text)
    })
}

/// Production order counts across all linked orders of a listing.
#[derive(Debug, Default, PartialEq, Eq)]
struct ProductionBreakdown {
    total: usize,
    in_progress: usize,
    released: usize,
    finished: usize,
}

impl ProductionBreakdown {
    fn add(&mut self, production_order: &Record) {
        self.total += 1;
        let status = match StatusValue::of(production_order) {
            Some(StatusValue::Code(code)) => ProductionStatus::from_code(code),
            Some(StatusValue::Name(name)) => ProductionStatus::from_name(&name),
            None => None,
        };
        match status {
            Some(ProductionStatus::InProgress) => self.in_progress += 1,
            Some(ProductionStatus::Released) => self.released += 1,
            Some(ProductionStatus::Finished) => self.finished += 1,
            _ => {}
        }
    }
}

fn get_sales_orders_with_production_by_status<'a>(
    context: &'a ToolContext,
    arguments: &'a ToolArguments,
) -> ToolFuture<'a> {
    Box::pin(async move {
        let status = arguments
            .optional_str("status")
            .unwrap_or_else(|| DEFAULT_LINK_STATUS.to_string())
            .to_ascii_uppercase();
        let since_days = arguments.i64_or("since_days", DEFAULT_SINCE_DAYS);
        let request = PageRequest::new(arguments.u32_or("max_results", DEFAULT_SALES_ORDERS))
            .with_status(Some(status.clone()))
            .with_since(days_ago(context, since_days));

        let page = context.source.fetch_page(OrderKind::CustomerOrder, &request).await?;
        let sales_orders = filter_quality(page.into_records());
        if sales_orders.is_empty() {
            return Ok(format!(
                "No {} sales orders found in the last {} days.",
                status, since_days
            ));
        }

        let mut breakdown = ProductionBreakdown::default();
        let mut text = format!(
            "SALES ORDERS ({}) WITH PRODUCTION LINKS - Last {} days\nSales orders found: {}\n{}\n",
            status,
            since_days,
            sales_orders.len(),
            rule('=')
        );
        for sales_order in &sales_orders {
            let Some(order_no) = present_field(sales_order, "customerOrderNo") else {
                continue;
            };
            let order_status = StatusValue::of(sales_order)
                .map(|value| value.label())
                .unwrap_or_else(|| status.clone());
            text.push_str(&format!("Sales Order: {} (Status: {})\n  Production Orders:\n", order_no, order_status));

            match linked_production_orders(context, &order_no, LOOKUP_PAGE_SIZE).await {
                Ok(linked) if linked.is_empty() => text.push_str("    - No production orders found\n"),
                Ok(linked) => {
                    for production_order in &linked {
                        breakdown.add(production_order);
                        let number =
                            present_field(production_order, "orderNo").unwrap_or_else(|| "N/A".to_string());
                        let label = StatusValue::of(production_order)
                            .map(|value| value.label())
                            .unwrap_or_else(|| "N/A".to_string());
                        text.push_str(&format!("    - {} (Status: {})\n", number, label));
                    }
                }
                Err(error) => {
                    tracing::warn!(order_no = %order_no, error = %error, "linking production orders failed");
                    text.push_str(&format!(
                        "    - Error: {}\n",
                        context.redactor.scrub(&error.to_string())
                    ));
                }
            }
            text.push('\n');
        }

        text.push_str(&format!(
            "PRODUCTION SUMMARY:\n{}\nTotal Production Orders: {}\nIn Progress (60): {}\nReleased (30): {}\nFinished (90): {}\n",
            rule('='),
            breakdown.total,
            breakdown.in_progress,
            breakdown.released,
            breakdown.finished
        ));
        Ok(text)
    })
}
