use crate::models::{number_field, present_field, OrderKind, ProductionStatus, Record, StatusValue};
use crate::redaction::sanitize_for_demo;
use serde_json::Value;
use std::fmt::Write;

pub const RULE_WIDTH: usize = 100;
pub const MAX_FIELD_CHARS: usize = 200;
const SAMPLE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub show_positions: bool,
    pub show_operations: bool,
    pub demo_mode: bool,
}

impl FormatOptions {
    pub fn detailed(demo_mode: bool) -> Self {
        Self {
            show_positions: true,
            show_operations: true,
            demo_mode,
        }
    }

    pub fn compact(demo_mode: bool) -> Self {
        Self {
            demo_mode,
            ..Self::default()
        }
    }
}

/// Status with business context, e.g. `30 (RELEASED - In manufacturing)`.
/// Unknown numeric codes render as `UNKNOWN(code)`.
pub fn status_text(status: &StatusValue, kind: OrderKind) -> String {
    let category = status.category();
    match status {
        StatusValue::Code(code) => match ProductionStatus::from_code(*code) {
            Some(known) => match category.context(kind) {
                Some(context) => format!("{} ({} - {})", code, known.name(), context),
                None => format!("{} ({})", code, known.name()),
            },
            None => status.label(),
        },
        StatusValue::Name(name) => match category.context(kind) {
            Some(context) => format!("{} ({} - {})", name, category.as_str(), context),
            None => name.clone(),
        },
    }
}

/// Renders one record as an indented text block. Absent fields are skipped.
pub fn format_record(record: &Record, kind: OrderKind, options: &FormatOptions) -> String {
    let sanitized;
    let record = if options.demo_mode {
        sanitized = sanitize_for_demo(record);
        &sanitized
    } else {
        record
    };

    let mut block = String::new();
    match kind {
        OrderKind::CustomerOrder => write_customer_order(&mut block, record, options),
        OrderKind::ProductionOrder => write_production_order(&mut block, record, options),
    }
    block
}

fn write_customer_order(out: &mut String, record: &Record, options: &FormatOptions) {
    match present_field(record, "customerOrderNo") {
        Some(number) => push_line(out, 0, &format!("Order #{}", number)),
        None => push_line(out, 0, "Customer Order"),
    }
    push_field(out, record, "External Ref", "customerOrderNoExt");
    push_customer(out, record);
    push_status(out, record, OrderKind::CustomerOrder);
    push_field(out, record, "Order Date", "orderDate");
    push_field(out, record, "Delivery Date", "deliveryDate");

    if options.show_positions {
        if let Some(positions) = array_field(record, "positions") {
            write_positions(out, positions);
        }
    }

    push_field(out, record, "Notes", "note");
}

fn write_positions(out: &mut String, positions: &[Value]) {
    if positions.is_empty() {
        return;
    }
    let total_value: f64 = positions
        .iter()
        .filter_map(Value::as_object)
        .map(|position| {
            number_field(position, "netPricePerUnit").unwrap_or(0.0)
                * number_field(position, "targetQuantity").unwrap_or(0.0)
        })
        .sum();
    push_line(
        out,
        1,
        &format!("Positions: {} items, Total Value: €{:.2}", positions.len(), total_value),
    );
    push_line(out, 1, "Sample Items:");
    for position in positions.iter().filter_map(Value::as_object).take(SAMPLE_LIMIT) {
        let item = present_field(position, "itemNo").unwrap_or_else(|| "N/A".to_string());
        let quantity = number_field(position, "targetQuantity").unwrap_or(0.0);
        let price = number_field(position, "netPricePerUnit").unwrap_or(0.0);
        push_line(
            out,
            2,
            &format!("- {} (Qty: {}, €{:.2}/unit)", item, format_quantity(quantity), price),
        );
    }
    if positions.len() > SAMPLE_LIMIT {
        push_line(out, 2, &format!("... and {} more items", positions.len() - SAMPLE_LIMIT));
    }
}

fn write_production_order(out: &mut String, record: &Record, options: &FormatOptions) {
    match present_field(record, "orderNo") {
        Some(number) => push_line(out, 0, &format!("Production Order #{}", number)),
        None => push_line(out, 0, "Production Order"),
    }
    push_field(out, record, "Description", "description");
    push_field(out, record, "Customer Order", "customerOrderNo");
    push_customer(out, record);
    push_status(out, record, OrderKind::ProductionOrder);

    let item = present_field(record, "itemNo").or_else(|| present_field(record, "partNo"));
    let item_description = present_field(record, "itemDescription")
        .or_else(|| present_field(record, "partDescription"));
    match (item, item_description) {
        (Some(item), Some(description)) => push_line(out, 1, &format!("Item: {} - {}", item, description)),
        (Some(item), None) => push_line(out, 1, &format!("Item: {}", item)),
        (None, Some(description)) => push_line(out, 1, &format!("Item: {}", description)),
        (None, None) => {}
    }

    if let Some(quantity) = quantity_text(record) {
        push_line(out, 1, &format!("Quantity: {}", quantity));
    }
    push_field(out, record, "Release Date", "releaseDate");
    push_field(out, record, "Due Date", "dueDate");

    if options.show_operations {
        if let Some(operations) = array_field(record, "operations") {
            write_operations(out, operations);
        }
    }
}

fn quantity_text(record: &Record) -> Option<String> {
    let unit = present_field(record, "unit");
    let with_unit = |value: String| match &unit {
        Some(unit) => format!("{} {}", value, unit),
        None => value,
    };
    match (present_field(record, "processedParts"), present_field(record, "desiredQuantity")) {
        (Some(processed), Some(desired)) => Some(with_unit(format!("{}/{}", processed, desired))),
        (None, Some(desired)) => Some(with_unit(desired)),
        _ => present_field(record, "quantity").map(with_unit),
    }
}

fn write_operations(out: &mut String, operations: &[Value]) {
    if operations.is_empty() {
        return;
    }
    push_line(out, 1, "Operations:");
    for operation in operations.iter().filter_map(Value::as_object).take(SAMPLE_LIMIT) {
        let number = present_field(operation, "operationNo").unwrap_or_else(|| "N/A".to_string());
        let mut line = format!("- {}", number);
        if let Some(activity) = present_field(operation, "activity") {
            let _ = write!(line, ": {}", activity);
        }
        if let Some(workplace) = present_field(operation, "workplaceName") {
            let _ = write!(line, " @ {}", workplace);
        }
        if let Some(status) = StatusValue::of(operation) {
            let _ = write!(line, " ({})", status.label());
        }
        push_line(out, 2, &line);
    }
    if operations.len() > SAMPLE_LIMIT {
        push_line(
            out,
            2,
            &format!("... and {} more operations", operations.len() - SAMPLE_LIMIT),
        );
    }
}

fn push_customer(out: &mut String, record: &Record) {
    match (present_field(record, "customerName"), present_field(record, "customerNo")) {
        (Some(name), Some(number)) => push_line(out, 1, &format!("Customer: {} ({})", name, number)),
        (Some(name), None) => push_line(out, 1, &format!("Customer: {}", name)),
        (None, Some(number)) => push_line(out, 1, &format!("Customer: ({})", number)),
        (None, None) => {}
    }
}

fn push_status(out: &mut String, record: &Record, kind: OrderKind) {
    if let Some(status) = StatusValue::of(record) {
        push_line(out, 1, &format!("Status: {}", status_text(&status, kind)));
    }
}

fn push_field(out: &mut String, record: &Record, label: &str, key: &str) {
    if let Some(value) = present_field(record, key) {
        push_line(out, 1, &format!("{}: {}", label, value));
    }
}

fn push_line(out: &mut String, indent: usize, text: &str) {
    for _ in 0..indent {
        out.push_str("  ");
    }
    out.push_str(&truncate(text, MAX_FIELD_CHARS));
    out.push('\n');
}

fn array_field<'a>(record: &'a Record, key: &str) -> Option<&'a [Value]> {
    record.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

pub fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(RULE_WIDTH).collect()
}

/// A titled list of record blocks separated by rules, with optional footer notes.
pub struct Listing<'a> {
    pub title: String,
    pub summary: Vec<String>,
    pub records: &'a [Record],
    pub kind: OrderKind,
    pub options: FormatOptions,
    pub footer: Vec<String>,
}

impl Listing<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        for line in &self.summary {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&rule('='));
        out.push('\n');
        for record in self.records {
            out.push_str(&format_record(record, self.kind, &self.options));
            out.push_str(&rule('-'));
            out.push('\n');
        }
        if !self.footer.is_empty() {
            out.push('\n');
            out.push_str(&rule('='));
            out.push('\n');
            for line in &self.footer {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

pub fn format_listing(
    title: &str,
    summary: &[String],
    records: &[Record],
    kind: OrderKind,
    options: &FormatOptions,
) -> String {
    Listing {
        title: title.to_string(),
        summary: summary.to_vec(),
        records,
        kind,
        options: *options,
        footer: Vec::new(),
    }
    .render()
}
