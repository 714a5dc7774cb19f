use super::{
    bulk_properties, days_ago, merge_properties, object_schema, paging_properties, recent_filter, recent_properties,
    run_bulk, run_listing, BulkQuery, ListingQuery, ToolContext, ToolDefinition, ToolFuture,
};
use crate::errors::{AppError, AppResult};
use crate::formatting::{format_listing, format_record, rule};
use crate::harness::arguments::ToolArguments;
use crate::models::{present_field, OrderKind, PageRequest, Record, StatusCategory, StatusValue, MAX_PAGE_SIZE};
use crate::overdue::{days_overdue, is_actionable_overdue};
use crate::pagination::CollectOptions;
use crate::quality::filter_quality;
use serde_json::json;

const DEFAULT_OVERDUE_DAYS: i64 = 7;
const DEFAULT_RECENT_DAYS: i64 = 30;
const DEFAULT_RECENT_RESULTS: u32 = 25;
const DEFAULT_BULK_PAGES: u32 = 3;

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "get_customer_orders",
            "List recent customer orders (last 12 months by default), newest first, quality filtered. \
             Auto-paginates up to 200 records when starting from page 1.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    recent_properties(),
                    filter_properties(),
                    json!({
                        "auto_paginate": { "type": "boolean", "description": "Fetch up to 4 pages in one call" },
                    }),
                ]),
                &[],
            ),
            "customer orders",
            get_customer_orders,
        ),
        ToolDefinition::new(
            "search_customer_orders",
            "Search customer orders by order number or external reference. Supports % wildcards.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    recent_properties(),
                    json!({
                        "search_term": { "type": "string", "minLength": 1 },
                        "status": { "type": "string" },
                    }),
                ]),
                &["search_term"],
            ),
            "customer orders",
            search_customer_orders,
        ),
        ToolDefinition::new(
            "get_customer_orders_by_status",
            "List customer orders with a given status such as COMPLETED, INVOICED or INCOMPLETE.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    recent_properties(),
                    json!({
                        "status": { "type": "string", "minLength": 1 },
                        "customer_no": { "type": "string" },
                    }),
                ]),
                &["status"],
            ),
            "customer orders",
            get_customer_orders_by_status,
        ),
        ToolDefinition::new(
            "get_orders_for_customer",
            "List the orders of one customer by customer number.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    recent_properties(),
                    json!({
                        "customer_no": { "type": "string", "minLength": 1 },
                        "status": { "type": "string" },
                    }),
                ]),
                &["customer_no"],
            ),
            "customer orders",
            get_orders_for_customer,
        ),
        ToolDefinition::new(
            "get_customer_order_details",
            "Full details of one customer order including positions and total value.",
            object_schema(
                json!({ "order_no": { "type": "string", "minLength": 1 } }),
                &["order_no"],
            ),
            "customer order details",
            get_customer_order_details,
        ),
        ToolDefinition::new(
            "check_customer_order_overdue",
            "Open orders of one customer whose delivery date is past due by at least days_overdue days.",
            object_schema(
                json!({
                    "customer_no": { "type": "string", "minLength": 1 },
                    "days_overdue": { "type": "integer", "minimum": 0 },
                    "max_results": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "filter_quality": { "type": "boolean" },
                }),
                &["customer_no"],
            ),
            "overdue customer orders",
            check_customer_order_overdue,
        ),
        ToolDefinition::new(
            "get_customer_orders_bulk",
            "Fetch several consecutive pages of customer orders in one call (up to 10 pages of 50).",
            object_schema(
                merge_properties(&[
                    bulk_properties(),
                    json!({
                        "status": { "type": "string" },
                        "customer_no": { "type": "string" },
                        "search_term": { "type": "string", "description": "% wildcards allowed" },
                    }),
                ]),
                &[],
            ),
            "customer orders",
            get_customer_orders_bulk,
        ),
        ToolDefinition::new(
            "get_recent_orders",
            "Customer orders modified within the last `days` days, newest first, quality filtered.",
            object_schema(
                json!({
                    "days": { "type": "integer", "minimum": 1, "maximum": 3650 },
                    "max_results": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "filter_quality": { "type": "boolean" },
                }),
                &[],
            ),
            "recent orders",
            get_recent_orders,
        ),
        ToolDefinition::new(
            "get_modified_orders",
            "Customer orders modified since a date, optionally narrowed to a business category \
             (newest, released, completed, other) or a customer.",
            object_schema(
                json!({
                    "since_date": { "type": "string", "minLength": 1, "description": "ISO 8601, e.g. 2024-01-01T00:00:00" },
                    "max_results": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "status_category": { "type": "string", "description": "newest, released, completed or other" },
                    "customer_no": { "type": "string" },
                }),
                &["since_date"],
            ),
            "modified orders",
            get_modified_orders,
        ),
    ]
}

fn filter_properties() -> serde_json::Value {
    json!({
        "status": { "type": "string", "description": "Order status, e.g. COMPLETED" },
        "customer_no": { "type": "string", "description": "Exact customer number" },
        "search_term": { "type": "string", "description": "Order number or external reference, % wildcards allowed" },
        "item_no": { "type": "string", "description": "Orders containing this item number" },
    })
}

#[derive(Debug, Default)]
struct CustomerFilters {
    status: Option<String>,
    customer_no: Option<String>,
    search_term: Option<String>,
    item_no: Option<String>,
    auto_paginate: bool,
}

impl CustomerFilters {
    fn from_arguments(arguments: &ToolArguments, auto_paginate: bool) -> Self {
        Self {
            status: arguments.optional_str("status"),
            customer_no: arguments.optional_str("customer_no"),
            search_term: arguments.optional_str("search_term"),
            item_no: arguments.optional_str("item_no"),
            auto_paginate,
        }
    }
}

async fn list_customer_orders(
    context: &ToolContext,
    arguments: &ToolArguments,
    filters: CustomerFilters,
) -> AppResult<String> {
    let page_index = arguments.page_index();
    let size = arguments.u32_or("size", MAX_PAGE_SIZE);
    let quality = arguments.bool_or("filter_quality", true);
    let recent = recent_filter(arguments);

    let request = PageRequest::new(size)
        .with_since(recent.resolve(context.now()))
        .with_status(filters.status.clone())
        .with_customer(filters.customer_no.clone())
        .with_search(filters.search_term.clone())
        .with_item(filters.item_no.clone());

    // Auto-pagination only kicks in from the first page.
    let options = if filters.auto_paginate && page_index == 0 {
        CollectOptions::auto_paginate(page_index, size, quality)
    } else {
        CollectOptions::single_page(page_index, size, quality)
    };

    let mut described = Vec::new();
    described.extend(recent.describe());
    if let Some(status) = &request.status {
        described.push(format!("Status: {}", status));
    }
    if let Some(customer) = &filters.customer_no {
        described.push(format!("Customer: {}", customer));
    }
    if let Some(term) = &filters.search_term {
        described.push(format!("Search: '{}'", term));
    }
    if let Some(item) = &filters.item_no {
        described.push(format!("Item: {}", item));
    }
    if quality {
        described.push("Quality filtered".to_string());
    }

    run_listing(
        context,
        ListingQuery {
            kind: OrderKind::CustomerOrder,
            title: "CUSTOMER ORDERS".to_string(),
            request,
            options,
            filters: described,
            format: context.compact(),
            historical_hint: !recent.include_all_data,
        },
    )
    .await
}

fn get_customer_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let auto_paginate = arguments.bool_or("auto_paginate", true);
        list_customer_orders(context, arguments, CustomerFilters::from_arguments(arguments, auto_paginate)).await
    })
}

fn search_customer_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let filters = CustomerFilters {
            search_term: Some(arguments.required_str("search_term")?),
            status: arguments.optional_str("status"),
            ..CustomerFilters::default()
        };
        list_customer_orders(context, arguments, filters).await
    })
}

fn get_customer_orders_by_status<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let filters = CustomerFilters {
            status: Some(arguments.required_str("status")?),
            customer_no: arguments.optional_str("customer_no"),
            auto_paginate: true,
            ..CustomerFilters::default()
        };
        list_customer_orders(context, arguments, filters).await
    })
}

fn get_orders_for_customer<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let filters = CustomerFilters {
            customer_no: Some(arguments.required_str("customer_no")?),
            status: arguments.optional_str("status"),
            auto_paginate: true,
            ..CustomerFilters::default()
        };
        list_customer_orders(context, arguments, filters).await
    })
}

fn get_customer_order_details<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let order_no = arguments.required_str("order_no")?;
        match context.source.fetch_customer_order(&order_no).await? {
            Some(order) => Ok(format_record(&order, OrderKind::CustomerOrder, &context.detailed())),
            None => Ok(format!("No customer order found with number: {}", order_no)),
        }
    })
}

fn check_customer_order_overdue<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let customer_no = arguments.required_str("customer_no")?;
        let threshold = arguments.i64_or("days_overdue", DEFAULT_OVERDUE_DAYS);
        let request =
            PageRequest::new(arguments.u32_or("max_results", MAX_PAGE_SIZE)).with_customer(Some(customer_no.clone()));

        let page = context.source.fetch_page(OrderKind::CustomerOrder, &request).await?;
        if page.is_empty() {
            return Ok(format!("No orders found for customer {}.", customer_no));
        }
        let mut orders = page.into_records();
        if arguments.bool_or("filter_quality", true) {
            orders = filter_quality(orders);
        }

        let overdue = overdue_by_delivery(orders, context, threshold);
        if overdue.is_empty() {
            return Ok(format!("No overdue orders found for customer {}.", customer_no));
        }

        let mut text = format!(
            "OVERDUE ORDERS for Customer {} (Past due by {}+ days):\nFound {} overdue orders\n{}\n",
            customer_no,
            threshold,
            overdue.len(),
            rule('=')
        );
        for (order, days) in &overdue {
            text.push_str(&format_record(order, OrderKind::CustomerOrder, &context.compact()));
            let planned = present_field(order, "deliveryDate").unwrap_or_else(|| "N/A".to_string());
            text.push_str(&format!(
                "  OVERDUE: Delivery planned for {} ({} days overdue)\n",
                planned, days
            ));
            text.push_str(&rule('-'));
            text.push('\n');
        }
        Ok(text)
    })
}

fn get_customer_orders_bulk<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let request = PageRequest::new(arguments.u32_or("size", MAX_PAGE_SIZE))
            .with_since(arguments.optional_str("since_date"))
            .with_status(arguments.optional_str("status"))
            .with_customer(arguments.optional_str("customer_no"))
            .with_search(arguments.optional_str("search_term"));
        run_bulk(
            context,
            BulkQuery {
                kind: OrderKind::CustomerOrder,
                title: "CUSTOMER ORDERS",
                request,
                start_page: arguments.page_index_of("start_page"),
                num_pages: arguments.u32_or("num_pages", DEFAULT_BULK_PAGES),
                quality_filter: arguments.bool_or("filter_quality", false),
                format: context.detailed(),
            },
        )
        .await
    })
}

fn get_recent_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let days = arguments.i64_or("days", DEFAULT_RECENT_DAYS);
        let size = arguments.u32_or("max_results", DEFAULT_RECENT_RESULTS);
        let quality = arguments.bool_or("filter_quality", true);

        let mut described = vec![format!("Last {} days", days)];
        if quality {
            described.push("Quality filtered".to_string());
        }
        run_listing(
            context,
            ListingQuery {
                kind: OrderKind::CustomerOrder,
                title: "RECENT CUSTOMER ORDERS".to_string(),
                request: PageRequest::new(size).with_since(days_ago(context, days)),
                options: CollectOptions::single_page(0, size, quality),
                filters: described,
                format: context.compact(),
                historical_hint: false,
            },
        )
        .await
    })
}

fn get_modified_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let since = arguments.required_str("since_date")?;
        let category = match arguments.optional_str("status_category") {
            Some(raw) => Some(StatusCategory::parse(&raw).ok_or_else(|| {
                AppError::InvalidArguments(format!(
                    "Unknown status_category '{}': expected newest, released, completed or other",
                    raw
                ))
            })?),
            None => None,
        };
        let customer_no = arguments.optional_str("customer_no");
        let request = PageRequest::new(arguments.u32_or("max_results", MAX_PAGE_SIZE))
            .with_since(Some(since.clone()))
            .with_customer(customer_no.clone());

        let page = context.source.fetch_page(OrderKind::CustomerOrder, &request).await?;
        if page.is_empty() {
            return Ok(format!("No customer orders found modified since {}", since));
        }
        let total = page.total_records();
        let orders: Vec<Record> = page
            .into_records()
            .into_iter()
            .filter(|order| category.map_or(true, |wanted| category_of(order) == wanted))
            .collect();
        if orders.is_empty() {
            let suffix = category
                .map(|wanted| format!(" in category '{}'", wanted.as_str().to_ascii_lowercase()))
                .unwrap_or_default();
            return Ok(format!("No orders found modified since {}{}", since, suffix));
        }

        let mut described = vec![format!("Modified since: {}", since)];
        if let Some(wanted) = category {
            described.push(format!("Category: {}", wanted.as_str()));
        }
        if let Some(customer) = &customer_no {
            described.push(format!("Customer: {}", customer));
        }
        let title = format!(
            "MODIFIED ORDERS ({} of {} total) | {}:",
            orders.len(),
            total,
            described.join(" | ")
        );
        Ok(format_listing(&title, &[], &orders, OrderKind::CustomerOrder, &context.compact()))
    })
}

fn category_of(order: &Record) -> StatusCategory {
    StatusValue::of(order)
        .map(|status| status.category())
        .unwrap_or(StatusCategory::Other)
}

/// Overdue orders paired with their days past delivery, most overdue first.
fn overdue_by_delivery(orders: Vec<Record>, context: &ToolContext, threshold: i64) -> Vec<(Record, i64)> {
    let mut overdue: Vec<(Record, i64)> = orders
        .into_iter()
        .filter(|order| is_actionable_overdue(order, "deliveryDate", context.as_of, threshold))
        .filter_map(|order| {
            let days = present_field(&order, "deliveryDate").and_then(|date| days_overdue(&date, context.as_of))?;
            Some((order, days))
        })
        .collect();
    overdue.sort_by(|left, right| right.1.cmp(&left.1));
    overdue
}

#[cfg(test)]
mod tests {
    use super::super::testing::{record, StaticSource};
    use super::super::{ToolContext, ToolRegistry};
    use crate::redaction::Redactor;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Arc;

    fn registry_with(source: Arc<StaticSource>, demo_mode: bool) -> ToolRegistry {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid date");
        ToolRegistry::new(ToolContext::new(source, demo_mode, Redactor::default()).with_as_of(as_of))
    }

    fn orders(count: usize) -> Vec<crate::models::Record> {
        (0..count)
            .map(|index| {
                record(json!({
                    "customerOrderNo": format!("CO-{:03}", index),
                    "customerName": "Blechwerk GmbH",
                    "customerNo": "K-10",
                    "status": "INCOMPLETE"
                }))
            })
            .collect()
    }

    #[tokio::test]
    async fn auto_paginates_with_recent_window() {
        let source = Arc::new(StaticSource {
            customer_orders: orders(120),
            ..StaticSource::default()
        });
        let outcome = registry_with(source.clone(), false)
            .call("get_customer_orders", None)
            .await
            .expect("outcome");
        assert!(!outcome.is_error);
        assert!(outcome.text.starts_with("CUSTOMER ORDERS (Recent (12 months) | Quality filtered):"));
        assert!(outcome.text.contains("Auto-paginated: Pages 1-3, 120 quality records of 120 total"));

        let requests = source.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].1.since.as_deref(), Some("2023-06-01T00:00:00"));
    }

    #[tokio::test]
    async fn later_pages_do_not_auto_paginate() {
        let source = Arc::new(StaticSource {
            customer_orders: orders(120),
            ..StaticSource::default()
        });
        let outcome = registry_with(source.clone(), false)
            .call("get_customer_orders", Some(json!({"page": 2, "include_all_data": true})))
            .await
            .expect("outcome");
        assert!(outcome.text.contains("Page 2/3, 50 quality records of 120 total"));
        assert!(outcome.text.contains("NEXT: Use page=3 to continue"));
        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.page_index, 1);
        assert!(requests[0].1.since.is_none());
    }

    #[tokio::test]
    async fn search_passes_term_and_single_page() {
        let source = Arc::new(StaticSource {
            customer_orders: orders(3),
            ..StaticSource::default()
        });
        let outcome = registry_with(source.clone(), false)
            .call("search_customer_orders", Some(json!({"search_term": "CO-%"})))
            .await
            .expect("outcome");
        assert!(outcome.text.contains("Search: 'CO-%'"));
        assert_eq!(source.requests()[0].1.search_by.as_deref(), Some("CO-%"));
    }

    #[tokio::test]
    async fn details_show_positions_and_missing_orders() {
        let source = Arc::new(StaticSource {
            customer_orders: vec![record(json!({
                "customerOrderNo": "238259",
                "customerName": "Blechwerk GmbH",
                "positions": [{"itemNo": "P-1", "targetQuantity": 4, "netPricePerUnit": 2.5}]
            }))],
            ..StaticSource::default()
        });
        let registry = registry_with(source, true);
        let found = registry
            .call("get_customer_order_details", Some(json!({"order_no": "238259"})))
            .await
            .expect("outcome");
        assert!(found.text.contains("Total Value: €10.00"));
        assert!(found.text.contains("Sheet Metal Connect"));

        let missing = registry
            .call("get_customer_order_details", Some(json!({"order_no": "999"})))
            .await
            .expect("outcome");
        assert_eq!(missing.text, "No customer order found with number: 999");
    }

    #[tokio::test]
    async fn overdue_check_skips_closed_and_sorts_by_lateness() {
        let source = Arc::new(StaticSource {
            customer_orders: vec![
                record(json!({"customerOrderNo": "A", "deliveryDate": "10.06.2024 00:00:00", "status": "INCOMPLETE"})),
                record(json!({"customerOrderNo": "B", "deliveryDate": "2024-05-01T00:00:00", "status": "INCOMPLETE"})),
                record(json!({"customerOrderNo": "C", "deliveryDate": "2024-05-01T00:00:00", "status": "INVOICED"})),
                record(json!({"customerOrderNo": "D", "deliveryDate": "01.01.2015 00:00:00", "status": "INCOMPLETE"})),
            ],
            ..StaticSource::default()
        });
        let outcome = registry_with(source.clone(), false)
            .call("check_customer_order_overdue", Some(json!({"customer_no": "K-10", "days_overdue": 3})))
            .await
            .expect("outcome");
        assert!(outcome.text.contains("Found 2 overdue orders"));
        let b = outcome.text.find("Order #B").expect("B listed");
        let a = outcome.text.find("Order #A").expect("A listed");
        assert!(b < a);
        assert!(!outcome.text.contains("Order #C"));
        assert!(!outcome.text.contains("Order #D"));
        assert!(outcome.text.contains("(45 days overdue)"));
        assert_eq!(source.requests()[0].1.customer_no.as_deref(), Some("K-10"));
    }

    #[tokio::test]
    async fn bulk_fetch_reports_page_range_and_continuation() {
        let source = Arc::new(StaticSource {
            customer_orders: orders(120),
            ..StaticSource::default()
        });
        let outcome = registry_with(source.clone(), false)
            .call(
                "get_customer_orders_bulk",
                Some(json!({"size": 20, "start_page": 2, "num_pages": 3})),
            )
            .await
            .expect("outcome");
        assert!(outcome
            .text
            .starts_with("CUSTOMER ORDERS BULK - 60 orders from Pages 2-4 of 6 total pages:"));
        assert!(outcome.text.contains("Total records in system: 120"));
        assert!(outcome.text.contains("BULK FETCH: Retrieved 3 pages (60 orders)"));
        assert!(outcome.text.contains("NEXT: Use start_page=5 to continue"));
        let pages: Vec<u32> = source.requests().iter().map(|(_, request)| request.page_index).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn bulk_fetch_past_the_end_is_empty() {
        let source = Arc::new(StaticSource {
            customer_orders: orders(10),
            ..StaticSource::default()
        });
        let outcome = registry_with(source, false)
            .call("get_customer_orders_bulk", Some(json!({"start_page": 4, "num_pages": 40})))
            .await
            .expect("outcome");
        assert_eq!(outcome.text, "No customer orders found starting from page 4.");
    }

    #[tokio::test]
    async fn recent_orders_use_a_day_window() {
        let source = Arc::new(StaticSource {
            customer_orders: orders(3),
            ..StaticSource::default()
        });
        let outcome = registry_with(source.clone(), false)
            .call("get_recent_orders", Some(json!({"days": 10})))
            .await
            .expect("outcome");
        assert!(outcome
            .text
            .starts_with("RECENT CUSTOMER ORDERS (Last 10 days | Quality filtered):"));
        let requests = source.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.since.as_deref(), Some("2024-06-05T12:00:00"));
        assert_eq!(requests[0].1.page_size, 25);
    }

    #[tokio::test]
    async fn modified_orders_filter_by_business_category() {
        let source = Arc::new(StaticSource {
            customer_orders: vec![
                record(json!({"customerOrderNo": "A", "status": "INVOICED"})),
                record(json!({"customerOrderNo": "B", "status": "RELEASED"})),
                record(json!({"customerOrderNo": "C"})),
            ],
            ..StaticSource::default()
        });
        let registry = registry_with(source.clone(), false);

        let completed = registry
            .call(
                "get_modified_orders",
                Some(json!({"since_date": "2024-06-01T00:00:00", "status_category": "completed"})),
            )
            .await
            .expect("outcome");
        assert!(completed.text.starts_with(
            "MODIFIED ORDERS (1 of 3 total) | Modified since: 2024-06-01T00:00:00 | Category: COMPLETED:"
        ));
        assert!(completed.text.contains("Order #A"));
        assert!(!completed.text.contains("Order #B"));
        assert_eq!(source.requests()[0].1.since.as_deref(), Some("2024-06-01T00:00:00"));

        let other = registry
            .call(
                "get_modified_orders",
                Some(json!({"since_date": "2024-06-01T00:00:00", "status_category": "OTHER"})),
            )
            .await
            .expect("outcome");
        assert!(other.text.contains("Order #C"));

        let newest = registry
            .call(
                "get_modified_orders",
                Some(json!({"since_date": "2024-06-01T00:00:00", "status_category": "newest"})),
            )
            .await
            .expect("outcome");
        assert_eq!(
            newest.text,
            "No orders found modified since 2024-06-01T00:00:00 in category 'newest'"
        );

        assert!(matches!(
            registry
                .call(
                    "get_modified_orders",
                    Some(json!({"since_date": "2024-06-01", "status_category": "shipped"})),
                )
                .await,
            Err(crate::errors::AppError::InvalidArguments(_))
        ));
    }
}
