use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One customer or production order exactly as the upstream API returned it.
pub type Record = serde_json::Map<String, Value>;

pub const MAX_PAGE_SIZE: u32 = 50;
/// Highest 1-based page number a tool accepts.
pub const MAX_PAGE_NUMBER: u32 = 100_000;
pub const DEFAULT_SORT_FIELD: &str = "modificationDate";
/// Sorted listings always come back newest first.
pub const DEFAULT_SORT_ORDER: &str = "desc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderKind {
    CustomerOrder,
    ProductionOrder,
}

impl OrderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomerOrder => "customer-order",
            Self::ProductionOrder => "production-order",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::CustomerOrder => "/api/v2/sales/customerOrders",
            Self::ProductionOrder => "/api/v2/pps/productionOrders/full/search",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::CustomerOrder => "customer orders",
            Self::ProductionOrder => "production orders",
        }
    }

    /// Field holding the order's own number.
    pub fn number_field(self) -> &'static str {
        match self {
            Self::CustomerOrder => "customerOrderNo",
            Self::ProductionOrder => "orderNo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_field: Option<String>,
    pub since: Option<String>,
    pub status: Option<String>,
    pub search_by: Option<String>,
    pub customer_no: Option<String>,
    pub item_no: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: MAX_PAGE_SIZE,
            sort_field: Some(DEFAULT_SORT_FIELD.to_string()),
            since: None,
            status: None,
            search_by: None,
            customer_no: None,
            item_no: None,
        }
    }
}

impl PageRequest {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: clamp_page_size(page_size),
            ..Self::default()
        }
    }

    pub fn at_page(&self, page_index: u32) -> Self {
        Self {
            page_index,
            ..self.clone()
        }
    }

    pub fn with_since(mut self, since: Option<String>) -> Self {
        self.since = since.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status
            .map(|value| value.trim().to_ascii_uppercase())
            .filter(|value| !value.is_empty());
        self
    }

    pub fn with_search(mut self, search_by: Option<String>) -> Self {
        self.search_by = search_by.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_customer(mut self, customer_no: Option<String>) -> Self {
        self.customer_no = customer_no.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_item(mut self, item_no: Option<String>) -> Self {
        self.item_no = item_no.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn unsorted(mut self) -> Self {
        self.sort_field = None;
        self
    }

    /// Query parameters in the upstream API's naming.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page_index.to_string()),
            ("size", self.page_size.to_string()),
        ];
        if let Some(field) = &self.sort_field {
            pairs.push(("sortBy", field.clone()));
            pairs.push(("sortOrder", DEFAULT_SORT_ORDER.to_string()));
        }
        let optional = [
            ("since", &self.since),
            ("status", &self.status),
            ("searchBy", &self.search_by),
            ("customerNo", &self.customer_no),
            ("itemNo", &self.item_no),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs
    }
}

pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default)]
    pub collection: Option<Vec<Record>>,
    #[serde(default)]
    pub records: Option<u64>,
    #[serde(default)]
    pub pages: Option<u64>,
}

impl PageResponse {
    pub fn from_records(records: Vec<Record>, total_records: u64, total_pages: u64) -> Self {
        Self {
            collection: Some(records),
            records: Some(total_records),
            pages: Some(total_pages),
        }
    }

    pub fn len(&self) -> usize {
        self.collection.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_records(&self) -> u64 {
        self.records.unwrap_or(self.len() as u64)
    }

    pub fn total_pages(&self) -> u64 {
        self.pages.unwrap_or(0)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.collection.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCategory {
    Newest,
    Released,
    Completed,
    Other,
}

impl StatusCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "NEWEST",
            Self::Released => "RELEASED",
            Self::Completed => "COMPLETED",
            Self::Other => "OTHER",
        }
    }

    pub fn context(self, kind: OrderKind) -> Option<&'static str> {
        match (self, kind) {
            (Self::Newest, _) => Some("Pre-production"),
            (Self::Released, OrderKind::CustomerOrder) => Some("In production"),
            (Self::Released, OrderKind::ProductionOrder) => Some("In manufacturing"),
            (Self::Completed, OrderKind::CustomerOrder) => Some("Delivered/Invoiced"),
            (Self::Completed, OrderKind::ProductionOrder) => Some("Completed"),
            (Self::Other, _) => None,
        }
    }

    /// Parses a category filter such as `released`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NEWEST" => Some(Self::Newest),
            "RELEASED" => Some(Self::Released),
            "COMPLETED" => Some(Self::Completed),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "INVALID" | "VALID" | "PENDING" => Self::Newest,
            "RELEASED" | "STARTED" | "IN_PROGRESS" => Self::Released,
            "COMPLETED" | "DELIVERED" | "INVOICED" | "FINISHED" => Self::Completed,
            _ => Self::Other,
        }
    }
}

/// Production order status codes as the upstream system reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductionStatus {
    Invalid,
    Valid,
    Pending,
    Released,
    Started,
    InProgress,
    Finished,
    Completed,
    Canceled,
}

impl ProductionStatus {
    pub const ALL: [ProductionStatus; 9] = [
        Self::Invalid,
        Self::Valid,
        Self::Pending,
        Self::Released,
        Self::Started,
        Self::InProgress,
        Self::Finished,
        Self::Completed,
        Self::Canceled,
    ];

    pub fn code(self) -> i64 {
        match self {
            Self::Invalid => 0,
            Self::Valid => 10,
            Self::Pending => 20,
            Self::Released => 30,
            Self::Started => 40,
            Self::InProgress => 60,
            Self::Finished => 90,
            Self::Completed => 95,
            Self::Canceled => 100,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Valid => "VALID",
            Self::Pending => "PENDING",
            Self::Released => "RELEASED",
            Self::Started => "STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|status| status.name() == upper)
    }

    pub fn category(self) -> StatusCategory {
        match self {
            Self::Canceled => StatusCategory::Other,
            other => StatusCategory::from_name(other.name()),
        }
    }
}

const CLOSED_STATUS_NAMES: &[&str] = &[
    "COMPLETED",
    "CANCELED",
    "FINISHED",
    "DELIVERED",
    "INVOICED",
    "CLOSED",
];

/// A status field value, which upstream sends either as a numeric code or as a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusValue {
    Code(i64),
    Name(String),
}

impl StatusValue {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Code),
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<i64>() {
                    Ok(code) => Some(Self::Code(code)),
                    Err(_) => Some(Self::Name(trimmed.to_ascii_uppercase())),
                }
            }
            _ => None,
        }
    }

    pub fn of(record: &Record) -> Option<Self> {
        record.get("status").and_then(Self::from_value)
    }

    pub fn category(&self) -> StatusCategory {
        match self {
            Self::Code(code) => ProductionStatus::from_code(*code)
                .map(ProductionStatus::category)
                .unwrap_or(StatusCategory::Other),
            Self::Name(name) => StatusCategory::from_name(name),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Self::Code(code) => *code == 95 || *code == 100,
            Self::Name(name) => CLOSED_STATUS_NAMES.contains(&name.as_str()),
        }
    }

    /// Display label; unknown numeric codes degrade to `UNKNOWN(code)`.
    pub fn label(&self) -> String {
        match self {
            Self::Code(code) => match ProductionStatus::from_code(*code) {
                Some(status) => format!("{} ({})", code, status.name()),
                None => format!("UNKNOWN({})", code),
            },
            Self::Name(name) => name.clone(),
        }
    }
}

/// Renders a scalar field as text. Null, absent and structured values are treated as missing.
pub fn text_field(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Like [`text_field`] but also drops blank strings.
pub fn present_field(record: &Record, key: &str) -> Option<String> {
    text_field(record, key).filter(|value| !value.trim().is_empty())
}

pub fn number_field(record: &Record, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(value) => value.as_f64(),
        Value::String(value) => value.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn page_request_clamps_size_and_emits_upstream_names() {
        let request = PageRequest::new(500)
            .with_status(Some("completed".to_string()))
            .with_search(Some("2381%".to_string()))
            .with_customer(Some(" ".to_string()))
            .at_page(2);
        assert_eq!(request.page_size, 50);
        let pairs = request.query_pairs();
        assert!(pairs.contains(&("page", "2".to_string())));
        assert!(pairs.contains(&("size", "50".to_string())));
        assert!(pairs.contains(&("sortBy", "modificationDate".to_string())));
        assert!(pairs.contains(&("sortOrder", "desc".to_string())));
        assert!(pairs.contains(&("status", "COMPLETED".to_string())));
        assert!(pairs.contains(&("searchBy", "2381%".to_string())));
        assert!(!pairs.iter().any(|(key, _)| *key == "customerNo"));
        assert_eq!(PageRequest::new(0).page_size, 1);
    }

    #[test]
    fn unsorted_request_omits_sort_params() {
        let pairs = PageRequest::new(10).unsorted().query_pairs();
        assert!(!pairs.iter().any(|(key, _)| *key == "sortBy" || *key == "sortOrder"));
    }

    #[test]
    fn page_response_tolerates_missing_and_null_collection() {
        let missing: PageResponse = serde_json::from_value(json!({"records": 0})).expect("parse");
        assert!(missing.is_empty());
        let null: PageResponse = serde_json::from_value(json!({"collection": null})).expect("parse");
        assert!(null.into_records().is_empty());
        let full: PageResponse =
            serde_json::from_value(json!({"collection": [{"orderNo": "1"}], "records": 7, "pages": 3}))
                .expect("parse");
        assert_eq!(full.len(), 1);
        assert_eq!(full.total_records(), 7);
        assert_eq!(full.total_pages(), 3);
    }

    #[test]
    fn status_labels_degrade_for_unknown_codes() {
        assert_eq!(StatusValue::Code(999).label(), "UNKNOWN(999)");
        assert_eq!(StatusValue::Code(30).label(), "30 (RELEASED)");
        assert_eq!(StatusValue::Code(999).category(), StatusCategory::Other);
        assert_eq!(
            StatusValue::from_value(&json!("60")),
            Some(StatusValue::Code(60))
        );
        assert_eq!(
            StatusValue::from_value(&json!("invoiced")),
            Some(StatusValue::Name("INVOICED".to_string()))
        );
        assert_eq!(StatusValue::from_value(&json!(null)), None);
    }

    #[test]
    fn categorizes_and_closes_statuses() {
        assert_eq!(StatusValue::Code(40).category(), StatusCategory::Released);
        assert_eq!(StatusValue::Code(90).category(), StatusCategory::Completed);
        assert_eq!(StatusValue::Name("PENDING".to_string()).category(), StatusCategory::Newest);
        assert!(StatusValue::Code(95).is_closed());
        assert!(StatusValue::Name("DELIVERED".to_string()).is_closed());
        assert!(!StatusValue::Code(40).is_closed());
    }

    #[test]
    fn parses_category_filter_names() {
        assert_eq!(StatusCategory::parse("newest"), Some(StatusCategory::Newest));
        assert_eq!(StatusCategory::parse(" Completed "), Some(StatusCategory::Completed));
        assert_eq!(StatusCategory::parse("shipped"), None);
    }

    #[test]
    fn field_accessors_render_scalars() {
        let order = record(json!({"orderNo": "A-1", "qty": 12, "blank": " ", "nested": {"a": 1}}));
        assert_eq!(text_field(&order, "qty").as_deref(), Some("12"));
        assert_eq!(present_field(&order, "blank"), None);
        assert_eq!(text_field(&order, "nested"), None);
        assert_eq!(number_field(&order, "qty"), Some(12.0));
        assert_eq!(text_field(&order, "missing"), None);
    }
}
