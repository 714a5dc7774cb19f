use super::{
    bulk_properties, days_ago, merge_properties, newest_window_start, object_schema, paging_properties,
    recent_filter, recent_properties, run_bulk, run_listing, BulkQuery, ListingQuery, ToolContext, ToolDefinition,
    ToolFuture,
};
use crate::errors::AppResult;
use crate::formatting::{format_record, rule};
use crate::harness::arguments::ToolArguments;
use crate::models::{present_field, OrderKind, PageRequest, ProductionStatus, Record, MAX_PAGE_NUMBER, MAX_PAGE_SIZE};
use crate::overdue::{days_overdue, is_actionable_overdue, Urgency};
use crate::pagination::{collect_pages, CollectOptions, RecentFilter};
use crate::quality::filter_quality;
use serde_json::{json, Value};

const DEFAULT_OVERDUE_DAYS: i64 = 7;
pub(crate) const LOOKUP_PAGE_SIZE: u32 = 10;
const DEFAULT_BULK_PAGES: u32 = 3;

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "get_production_orders",
            "List recent production orders (last 12 months by default) with operations, quality filtered. \
             Auto-paginates up to 200 records when starting from page 1.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    recent_properties(),
                    json!({
                        "status": status_property(),
                        "search_term": { "type": "string", "description": "Order number, item or description" },
                        "auto_paginate": { "type": "boolean" },
                    }),
                ]),
                &[],
            ),
            "production orders",
            get_production_orders,
        ),
        ToolDefinition::new(
            "search_production_orders",
            "Search production orders by order number, item number or description. Supports % wildcards.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    recent_properties(),
                    json!({
                        "search_term": { "type": "string", "minLength": 1 },
                        "status": status_property(),
                    }),
                ]),
                &["search_term"],
            ),
            "production orders",
            search_production_orders,
        ),
        ToolDefinition::new(
            "get_production_orders_by_status",
            "List production orders with a status code or name (0 INVALID, 10 VALID, 20 PENDING, 30 RELEASED, \
             40 STARTED, 60 IN_PROGRESS, 90 FINISHED, 95 COMPLETED, 100 CANCELED).",
            object_schema(
                merge_properties(&[paging_properties(), recent_properties(), json!({ "status": status_property() })]),
                &["status"],
            ),
            "production orders",
            get_production_orders_by_status,
        ),
        status_browse_definition(
            "get_in_progress_production_orders",
            "Production orders currently being manufactured (status 60 IN_PROGRESS).",
            get_in_progress_production_orders,
        ),
        status_browse_definition(
            "get_released_production_orders",
            "Production orders released for manufacturing (status 30 RELEASED).",
            get_released_production_orders,
        ),
        status_browse_definition(
            "get_finished_production_orders",
            "Production orders whose manufacturing has finished (status 90 FINISHED).",
            get_finished_production_orders,
        ),
        ToolDefinition::new(
            "get_overdue_production_orders",
            "Open production orders from the recent window whose due date has passed, most overdue first.",
            object_schema(
                merge_properties(&[
                    paging_properties(),
                    json!({ "days_overdue": { "type": "integer", "minimum": 0 } }),
                ]),
                &[],
            ),
            "overdue production orders",
            get_overdue_production_orders,
        ),
        ToolDefinition::new(
            "check_production_order_overdue",
            "Overdue production orders matching a search term, labelled CRITICAL, URGENT or OVERDUE.",
            object_schema(
                json!({
                    "search_term": { "type": "string", "minLength": 1 },
                    "days_overdue": { "type": "integer", "minimum": 0 },
                    "max_results": { "type": "integer", "minimum": 1, "maximum": 50 },
                    "filter_quality": { "type": "boolean" },
                }),
                &["search_term"],
            ),
            "overdue production orders",
            check_production_order_overdue,
        ),
        ToolDefinition::new(
            "get_production_orders_for_customer_order",
            "All production orders linked to one customer order.",
            object_schema(
                json!({
                    "customer_order_no": { "type": "string", "minLength": 1 },
                    "size": { "type": "integer", "minimum": 1, "maximum": 50 },
                }),
                &["customer_order_no"],
            ),
            "production orders for customer order",
            get_production_orders_for_customer_order,
        ),
        ToolDefinition::new(
            "get_customer_order_for_production_order",
            "The customer order a production order was created for, alongside the production order itself.",
            object_schema(
                json!({ "production_order_no": { "type": "string", "minLength": 1 } }),
                &["production_order_no"],
            ),
            "customer order for production order",
            get_customer_order_for_production_order,
        ),
        ToolDefinition::new(
            "get_production_orders_bulk",
            "Fetch several consecutive pages of production orders in one call (up to 10 pages of 50), \
             e.g. to read pages 234 to 236.",
            object_schema(
                merge_properties(&[
                    bulk_properties(),
                    json!({
                        "status": status_property(),
                        "search_term": { "type": "string", "description": "% wildcards allowed" },
                    }),
                ]),
                &[],
            ),
            "production orders",
            get_production_orders_bulk,
        ),
    ]
}

fn status_property() -> Value {
    json!({
        "type": ["string", "integer"],
        "description": "Status code (e.g. 60) or name (e.g. IN_PROGRESS)",
    })
}

fn status_browse_definition(
    name: &'static str,
    description: &'static str,
    handler: super::ToolHandler,
) -> ToolDefinition {
    ToolDefinition::new(
        name,
        description,
        object_schema(
            json!({
                "max_results": { "type": "integer", "minimum": 1, "maximum": 50 },
                "page": { "type": "integer", "minimum": 1, "maximum": MAX_PAGE_NUMBER },
                "since_days": { "type": "integer", "minimum": 1 },
                "search_term": { "type": "string" },
                "filter_quality": { "type": "boolean" },
            }),
            &[],
        ),
        "production orders",
        handler,
    )
}

async fn list_production_orders(
    context: &ToolContext,
    arguments: &ToolArguments,
    status: Option<String>,
    search_term: Option<String>,
    auto_paginate: bool,
) -> AppResult<String> {
    let page_index = arguments.page_index();
    let size = arguments.u32_or("size", MAX_PAGE_SIZE);
    let quality = arguments.bool_or("filter_quality", true);
    let recent = recent_filter(arguments);

    let request = PageRequest::new(size)
        .with_since(recent.resolve(context.now()))
        .with_status(status)
        .with_search(search_term);
    let options = if auto_paginate && page_index == 0 {
        CollectOptions::auto_paginate(page_index, size, quality)
    } else {
        CollectOptions::single_page(page_index, size, quality)
    };

    let mut described = Vec::new();
    described.extend(recent.describe());
    if let Some(status) = &request.status {
        described.push(format!("Status: {}", status));
    }
    if let Some(term) = &request.search_by {
        described.push(format!("Search: '{}'", term));
    }
    if quality {
        described.push("Quality filtered".to_string());
    }

    run_listing(
        context,
        ListingQuery {
            kind: OrderKind::ProductionOrder,
            title: "PRODUCTION ORDERS".to_string(),
            request,
            options,
            filters: described,
            format: context.detailed(),
            historical_hint: !recent.include_all_data,
        },
    )
    .await
}

fn get_production_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        list_production_orders(
            context,
            arguments,
            arguments.optional_str("status"),
            arguments.optional_str("search_term"),
            arguments.bool_or("auto_paginate", true),
        )
        .await
    })
}

fn search_production_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let term = arguments.required_str("search_term")?;
        list_production_orders(context, arguments, arguments.optional_str("status"), Some(term), false).await
    })
}

fn get_production_orders_by_status<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let status = arguments.required_str("status")?;
        list_production_orders(context, arguments, Some(status), None, true).await
    })
}

/// Status browsing runs unsorted, so without an explicit page it jumps to the window
/// holding the newest records.
async fn browse_status(
    context: &ToolContext,
    arguments: &ToolArguments,
    status: ProductionStatus,
    title: &str,
) -> AppResult<String> {
    let size = arguments.u32_or("max_results", MAX_PAGE_SIZE);
    let quality = arguments.bool_or("filter_quality", true);
    let since_days = arguments.i64_or("since_days", 0);
    let since = days_ago(context, since_days);
    let search_term = arguments.optional_str("search_term");

    let request = PageRequest::new(size)
        .unsorted()
        .with_status(Some(status.name().to_string()))
        .with_since(since)
        .with_search(search_term.clone());

    let first_page = if arguments.u32_or("page", 0) > 0 {
        arguments.page_index()
    } else {
        newest_window_start(context, OrderKind::ProductionOrder, &request).await
    };

    let mut described = vec![format!("Status: {} ({})", status.code(), status.name())];
    if since_days > 0 {
        described.push(format!("Last {} days", since_days));
    }
    if let Some(term) = &search_term {
        described.push(format!("Search: '{}'", term));
    }
    if quality {
        described.push("Quality filtered".to_string());
    }

    run_listing(
        context,
        ListingQuery {
            kind: OrderKind::ProductionOrder,
            title: title.to_string(),
            request,
            options: CollectOptions::auto_paginate(first_page, size, quality),
            filters: described,
            format: context.detailed(),
            historical_hint: false,
        },
    )
    .await
}

fn get_in_progress_production_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(browse_status(
        context,
        arguments,
        ProductionStatus::InProgress,
        "IN-PROGRESS PRODUCTION ORDERS",
    ))
}

fn get_released_production_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(browse_status(
        context,
        arguments,
        ProductionStatus::Released,
        "RELEASED PRODUCTION ORDERS",
    ))
}

fn get_finished_production_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(browse_status(
        context,
        arguments,
        ProductionStatus::Finished,
        "FINISHED PRODUCTION ORDERS",
    ))
}

fn overdue_by_due_date(orders: Vec<Record>, context: &ToolContext, threshold: i64) -> Vec<(Record, i64)> {
    let mut overdue: Vec<(Record, i64)> = orders
        .into_iter()
        .filter(|order| is_actionable_overdue(order, "dueDate", context.as_of, threshold))
        .filter_map(|order| {
            let days = present_field(&order, "dueDate").and_then(|date| days_overdue(&date, context.as_of))?;
            Some((order, days))
        })
        .collect();
    overdue.sort_by(|left, right| right.1.cmp(&left.1));
    overdue
}

fn render_overdue(heading: String, overdue: &[(Record, i64)], context: &ToolContext) -> String {
    let mut text = heading;
    text.push_str(&rule('='));
    text.push('\n');
    for (order, days) in overdue {
        text.push_str(&format!("{} ({} days overdue)\n", Urgency::from_days(*days).as_str(), days));
        text.push_str(&format_record(order, OrderKind::ProductionOrder, &context.detailed()));
        text.push_str(&rule('-'));
        text.push('\n');
    }
    text
}

fn get_overdue_production_orders<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let size = arguments.u32_or("size", MAX_PAGE_SIZE);
        let quality = arguments.bool_or("filter_quality", true);
        let threshold = arguments.i64_or("days_overdue", 0);
        let request = PageRequest::new(size).with_since(RecentFilter::default().resolve(context.now()));

        let collected = collect_pages(
            context.source.as_ref(),
            OrderKind::ProductionOrder,
            &request,
            CollectOptions::auto_paginate(arguments.page_index(), size, quality),
        )
        .await?;
        let checked = collected.records.len();
        let overdue = overdue_by_due_date(collected.records, context, threshold);
        if overdue.is_empty() {
            return Ok("No overdue production orders found.".to_string());
        }

        let mut text = render_overdue(
            format!(
                "OVERDUE PRODUCTION ORDERS:\nFound {} overdue orders among {} checked\n",
                overdue.len(),
                checked
            ),
            &overdue,
            context,
        );
        if let Some(note) = &collected.interrupted {
            text.push_str(note);
            text.push('\n');
        }
        Ok(text)
    })
}

fn check_production_order_overdue<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        let term = arguments.required_str("search_term")?;
        let threshold = arguments.i64_or("days_overdue", DEFAULT_OVERDUE_DAYS);
        let request = PageRequest::new(arguments.u32_or("max_results", MAX_PAGE_SIZE))
            .unsorted()
            .with_search(Some(term.clone()));

        let page = context.source.fetch_page(OrderKind::ProductionOrder, &request).await?;
        if page.is_empty() {
            return Ok(format!("No production orders found matching '{}'.", term));
        }
        let mut orders = page.into_records();
        if arguments.bool_or("filter_quality", true) {
            orders = filter_quality(orders);
        }

        let overdue = overdue_by_due_date(orders, context, threshold);
        if overdue.is_empty() {
            return Ok(format!("No overdue production orders found matching '{}'.", term));
        }
        Ok(render_overdue(
            format!(
                "OVERDUE PRODUCTION ORDERS matching '{}' - {} orders:\n",
                term,
                overdue.len()
            ),
            &overdue,
            context,
        ))
    })
}

fn get_production_orders_for_customer_order<'a>(
    context: &'a ToolContext,
    arguments: &'a ToolArguments,
) -> ToolFuture<'a> {
    Box::pin(async move {
        let customer_order_no = arguments.required_str("customer_order_no")?;
        let related =
            linked_production_orders(context, &customer_order_no, arguments.u32_or("size", MAX_PAGE_SIZE)).await?;
        if related.is_empty() {
            return Ok(format!("No production orders found for customer order {}.", customer_order_no));
        }

        let mut text = format!(
            "PRODUCTION ORDERS FOR CUSTOMER ORDER {} - {} orders found:\n{}\n",
            customer_order_no,
            related.len(),
            rule('=')
        );
        for order in &related {
            text.push_str(&format_record(order, OrderKind::ProductionOrder, &context.detailed()));
            text.push_str(&rule('-'));
            text.push('\n');
        }
        Ok(text)
    })
}

/// Production orders whose `customerOrderNo` is exactly `customer_order_no`, found through
/// a prefix search on the order number.
pub(crate) async fn linked_production_orders(
    context: &ToolContext,
    customer_order_no: &str,
    size: u32,
) -> AppResult<Vec<Record>> {
    let request = PageRequest::new(size)
        .unsorted()
        .with_search(Some(format!("{}%", customer_order_no)));
    let page = context.source.fetch_page(OrderKind::ProductionOrder, &request).await?;
    Ok(page
        .into_records()
        .into_iter()
        .filter(|order| present_field(order, "customerOrderNo").as_deref() == Some(customer_order_no))
        .collect())
}

fn get_production_orders_bulk<'a>(context: &'a ToolContext, arguments: &'a ToolArguments) -> ToolFuture<'a> {
    Box::pin(async move {
        // Unsorted so page numbers follow upstream's stable order.
        let request = PageRequest::new(arguments.u32_or("size", MAX_PAGE_SIZE))
            .unsorted()
            .with_since(arguments.optional_str("since_date"))
            .with_status(arguments.optional_str("status"))
            .with_search(arguments.optional_str("search_term"));
        run_bulk(
            context,
            BulkQuery {
                kind: OrderKind::ProductionOrder,
                title: "PRODUCTION ORDERS",
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

async fn find_exact(
    context: &ToolContext,
    kind: OrderKind,
    number: &str,
) -> AppResult<Option<Record>> {
    let request = PageRequest::new(LOOKUP_PAGE_SIZE)
        .unsorted()
        .with_search(Some(number.to_string()));
    let page = context.source.fetch_page(kind, &request).await?;
    Ok(page
        .into_records()
        .into_iter()
        .find(|order| present_field(order, kind.number_field()).as_deref() == Some(number)))
}

fn get_customer_order_for_production_order<'a>(
    context: &'a ToolContext,
    arguments: &'a ToolArguments,
) -> ToolFuture<'a> {
    Box::pin(async move {
        let production_order_no = arguments.required_str("production_order_no")?;
        let Some(production_order) = find_exact(context, OrderKind::ProductionOrder, &production_order_no).await?
        else {
            return Ok(format!("Production order {} not found.", production_order_no));
        };
        let Some(customer_order_no) = present_field(&production_order, "customerOrderNo") else {
            return Ok(format!(
                "No customer order linked to production order {}.",
                production_order_no
            ));
        };
        let Some(customer_order) = find_exact(context, OrderKind::CustomerOrder, &customer_order_no).await? else {
            return Ok(format!("Customer order {} not found.", customer_order_no));
        };

        let mut text = format!(
            "CUSTOMER ORDER FOR PRODUCTION ORDER {}:\n{}\n",
            production_order_no,
            rule('=')
        );
        text.push_str(&format_record(&customer_order, OrderKind::CustomerOrder, &context.compact()));
        text.push('\n');
        text.push_str(&rule('='));
        text.push_str("\nLINKED PRODUCTION ORDER:\n");
        text.push_str(&format_record(&production_order, OrderKind::ProductionOrder, &context.compact()));
        Ok(text)
    })
}
