use crate::client::OrderSource;
use crate::errors::AppResult;
use crate::models::{clamp_page_size, OrderKind, PageRequest, Record};
use crate::quality::filter_quality;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Four pages of fifty: the largest batch a single tool call pulls.
pub const DEFAULT_MAX_PAGES: u32 = 4;
pub const MAX_BULK_PAGES: u32 = 10;
pub const DEFAULT_RECENT_MONTHS: u32 = 12;
pub const DEFAULT_TARGET_RECORDS: u64 = 150;

/// Zero-based page indices needed for `total_desired` records, capped at `max_pages`.
pub fn plan(total_desired: u32, page_size: u32, max_pages: u32) -> Vec<u32> {
    let page_size = clamp_page_size(page_size);
    let needed = total_desired.div_ceil(page_size);
    (0..needed.min(max_pages)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    page_size: u32,
    indices: Vec<u32>,
}

impl PagePlan {
    pub fn new(total_desired: u32, page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size: clamp_page_size(page_size),
            indices: plan(total_desired, page_size, max_pages),
        }
    }

    /// Shifts the plan so it continues from `first_page` instead of page zero.
    pub fn starting_at(mut self, first_page: u32) -> Self {
        self.indices = self
            .indices
            .iter()
            .filter_map(|index| index.checked_add(first_page))
            .collect();
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Concatenates pages in page order and keeps the first `total_desired` items.
pub fn merge_pages<T>(pages: Vec<Vec<T>>, total_desired: usize) -> Vec<T> {
    pages.into_iter().flatten().take(total_desired).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub total_desired: u32,
    pub max_pages: u32,
    pub first_page: u32,
    pub quality_filter: bool,
}

impl CollectOptions {
    /// One page starting at `first_page`.
    pub fn single_page(first_page: u32, page_size: u32, quality_filter: bool) -> Self {
        Self {
            total_desired: clamp_page_size(page_size),
            max_pages: 1,
            first_page,
            quality_filter,
        }
    }

    /// Exactly `num_pages` consecutive pages (capped at [`MAX_BULK_PAGES`]) from `first_page`.
    pub fn bulk(first_page: u32, page_size: u32, num_pages: u32, quality_filter: bool) -> Self {
        let num_pages = num_pages.clamp(1, MAX_BULK_PAGES);
        Self {
            total_desired: clamp_page_size(page_size) * num_pages,
            max_pages: num_pages,
            first_page,
            quality_filter,
        }
    }

    /// Up to [`DEFAULT_MAX_PAGES`] pages starting at `first_page`.
    pub fn auto_paginate(first_page: u32, page_size: u32, quality_filter: bool) -> Self {
        Self {
            total_desired: clamp_page_size(page_size) * DEFAULT_MAX_PAGES,
            max_pages: DEFAULT_MAX_PAGES,
            first_page,
            quality_filter,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectedPages {
    pub records: Vec<Record>,
    pub pages_fetched: u32,
    pub first_page: u32,
    pub total_records: u64,
    pub total_pages: u64,
    pub raw_records_seen: usize,
    pub interrupted: Option<String>,
}

impl CollectedPages {
    /// Zero-based index of the last page actually fetched.
    pub fn last_page(&self) -> u32 {
        self.first_page.saturating_add(self.pages_fetched.saturating_sub(1))
    }

    pub fn has_more_pages(&self) -> bool {
        self.pages_fetched > 0 && self.total_pages > u64::from(self.last_page()) + 1
    }
}

/// Runs a page plan against `source`. Stops as soon as a page comes back short. A failing
/// first page is the call's error; a failing later page keeps what was gathered and
/// records why in `interrupted`.
pub async fn collect_pages(
    source: &dyn OrderSource,
    kind: OrderKind,
    template: &PageRequest,
    options: CollectOptions,
) -> AppResult<CollectedPages> {
    let plan = PagePlan::new(options.total_desired, template.page_size, options.max_pages)
        .starting_at(options.first_page);
    let mut collected = CollectedPages {
        first_page: options.first_page,
        ..CollectedPages::default()
    };
    let mut pages = Vec::with_capacity(plan.indices().len());

    for (position, page_index) in plan.indices().iter().copied().enumerate() {
        let request = template.at_page(page_index);
        let response = match source.fetch_page(kind, &request).await {
            Ok(response) => response,
            Err(error) if position == 0 => return Err(error),
            Err(error) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    page = page_index,
                    error = %error,
                    "pagination cut short by failed page"
                );
                collected.interrupted = Some(format!(
                    "Pagination was cut short at page {}: {}",
                    u64::from(page_index) + 1,
                    error
                ));
                break;
            }
        };

        if position == 0 {
            collected.total_records = response.total_records();
            collected.total_pages = response.total_pages();
        }
        collected.pages_fetched += 1;

        let raw_len = response.len();
        collected.raw_records_seen += raw_len;
        let records = response.into_records();
        let records = if options.quality_filter {
            filter_quality(records)
        } else {
            records
        };
        tracing::debug!(
            kind = kind.as_str(),
            page = page_index,
            raw = raw_len,
            kept = records.len(),
            "fetched page"
        );
        pages.push(records);

        if raw_len < plan.page_size() as usize {
            break;
        }
    }

    collected.records = merge_pages(pages, options.total_desired as usize);
    Ok(collected)
}

/// First day of the month `months_back` months before `now`, in upstream's `since` format.
pub fn default_since(now: NaiveDateTime, months_back: u32) -> String {
    let total_months = now.year() * 12 + now.month0() as i32 - months_back as i32;
    let year = total_months.div_euclid(12);
    let month = total_months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| now.date())
        .format("%Y-%m-%dT00:00:00")
        .to_string()
}

/// First page of the window holding the newest `target_records` records of an
/// oldest-first listing.
pub fn recent_page_window(total_pages: u64, total_records: u64, page_size: u32, target_records: u64) -> u64 {
    if total_pages <= 1 {
        return 0;
    }
    let page_size = u64::from(clamp_page_size(page_size));
    let wanted = target_records.min(total_records);
    let pages_needed = wanted.div_ceil(page_size).max(1);
    total_pages.saturating_sub(pages_needed)
}

/// The "recent window" policy applied to listing tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentFilter {
    pub auto_filter_recent: bool,
    pub since_date: Option<String>,
    pub include_all_data: bool,
}

impl Default for RecentFilter {
    fn default() -> Self {
        Self {
            auto_filter_recent: true,
            since_date: None,
            include_all_data: false,
        }
    }
}

impl RecentFilter {
    pub fn resolve(&self, now: NaiveDateTime) -> Option<String> {
        if self.include_all_data {
            return None;
        }
        match &self.since_date {
            Some(since) if !since.trim().is_empty() => Some(since.trim().to_string()),
            _ if self.auto_filter_recent => Some(default_since(now, DEFAULT_RECENT_MONTHS)),
            _ => None,
        }
    }

    pub fn describe(&self) -> Option<String> {
        if self.include_all_data {
            return Some("All data".to_string());
        }
        match &self.since_date {
            Some(since) if !since.trim().is_empty() => Some(format!("Since: {}", since.trim())),
            _ if self.auto_filter_recent => Some(format!("Recent ({} months)", DEFAULT_RECENT_MONTHS)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::models::PageResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn order(no: &str) -> Record {
        json!({ "orderNo": no }).as_object().cloned().expect("object")
    }

    fn numbers(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .filter_map(|record| record.get("orderNo").and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }

    /// Serves canned pages; `None` entries fail.
    struct ScriptedSource {
        pages: Vec<Option<Vec<Record>>>,
        requested: Mutex<Vec<u32>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Option<Vec<Record>>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl OrderSource for ScriptedSource {
        async fn fetch_page(&self, _kind: OrderKind, request: &PageRequest) -> AppResult<PageResponse> {
            self.requested.lock().expect("lock").push(request.page_index);
            match self.pages.get(request.page_index as usize) {
                Some(Some(records)) => Ok(PageResponse::from_records(records.clone(), 99, self.pages.len() as u64)),
                Some(None) => Err(AppError::Timeout("page timed out".to_string())),
                None => Ok(PageResponse::default()),
            }
        }

        async fn fetch_customer_order(&self, _order_no: &str) -> AppResult<Option<Record>> {
            Ok(None)
        }
    }

    #[test]
    fn plan_length_is_ceiling_capped_by_max_pages() {
        for page_size in 1..=50u32 {
            for total in [0u32, 1, 49, 50, 51, 120, 200, 1_000] {
                let indices = plan(total, page_size, DEFAULT_MAX_PAGES);
                let expected = total.div_ceil(page_size).min(DEFAULT_MAX_PAGES);
                assert_eq!(indices.len() as u32, expected);
                assert!(indices.iter().enumerate().all(|(i, index)| *index == i as u32));
            }
        }
    }

    #[test]
    fn plan_clamps_page_size_to_upstream_maximum() {
        assert_eq!(plan(200, 500, 10), vec![0, 1, 2, 3]);
        assert!(plan(0, 50, 4).is_empty());
    }

    #[test]
    fn plan_can_start_later() {
        let shifted = PagePlan::new(100, 50, 4).starting_at(3);
        assert_eq!(shifted.indices(), &[3, 4]);
    }

    #[test]
    fn plan_near_the_index_ceiling_never_wraps() {
        let shifted = PagePlan::new(200, 50, 4).starting_at(u32::MAX - 1);
        assert_eq!(shifted.indices(), &[u32::MAX - 1, u32::MAX]);
        let collected = CollectedPages {
            first_page: u32::MAX,
            pages_fetched: 3,
            ..CollectedPages::default()
        };
        assert_eq!(collected.last_page(), u32::MAX);
        assert!(!collected.has_more_pages());
    }

    #[test]
    fn bulk_options_cap_page_count() {
        let options = CollectOptions::bulk(4, 50, 25, false);
        assert_eq!(options.max_pages, MAX_BULK_PAGES);
        assert_eq!(options.total_desired, 500);
        assert_eq!(options.first_page, 4);
        assert_eq!(CollectOptions::bulk(0, 20, 0, true).max_pages, 1);
    }

    #[test]
    fn merge_keeps_page_order_and_truncates() {
        let merged = merge_pages(vec![vec!["A", "B"], vec!["C", "D"]], 3);
        assert_eq!(merged, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn short_page_stops_further_fetches() {
        let source = ScriptedSource::new(vec![
            Some(vec![order("1"), order("2")]),
            Some(vec![order("3")]),
            Some(vec![order("4"), order("5")]),
        ]);
        let template = PageRequest::new(2);
        let options = CollectOptions {
            total_desired: 8,
            max_pages: 4,
            first_page: 0,
            quality_filter: false,
        };
        let collected = collect_pages(&source, OrderKind::ProductionOrder, &template, options)
            .await
            .expect("collect");
        assert_eq!(source.requested(), vec![0, 1]);
        assert_eq!(numbers(&collected.records), vec!["1", "2", "3"]);
        assert_eq!(collected.pages_fetched, 2);
        assert!(collected.interrupted.is_none());
    }

    #[tokio::test]
    async fn merges_fetched_pages_truncated_to_total() {
        let source = ScriptedSource::new(vec![
            Some(vec![order("A"), order("B")]),
            Some(vec![order("C"), order("D")]),
        ]);
        let options = CollectOptions {
            total_desired: 3,
            max_pages: 4,
            first_page: 0,
            quality_filter: false,
        };
        let collected = collect_pages(&source, OrderKind::CustomerOrder, &PageRequest::new(2), options)
            .await
            .expect("collect");
        assert_eq!(numbers(&collected.records), vec!["A", "B", "C"]);
        assert_eq!(collected.total_records, 99);
    }

    #[tokio::test]
    async fn early_stop_counts_raw_records_before_quality_filter() {
        let source = ScriptedSource::new(vec![
            Some(vec![order("A"), order("TEST-1")]),
            Some(vec![order("B"), order("C")]),
        ]);
        let options = CollectOptions {
            total_desired: 4,
            max_pages: 4,
            first_page: 0,
            quality_filter: true,
        };
        let collected = collect_pages(&source, OrderKind::ProductionOrder, &PageRequest::new(2), options)
            .await
            .expect("collect");
        assert_eq!(numbers(&collected.records), vec!["A", "B", "C"]);
        assert_eq!(collected.raw_records_seen, 4);
    }

    #[tokio::test]
    async fn first_page_failure_is_the_error() {
        let source = ScriptedSource::new(vec![None, Some(vec![order("B")])]);
        let options = CollectOptions::auto_paginate(0, 2, false);
        let result = collect_pages(&source, OrderKind::ProductionOrder, &PageRequest::new(2), options).await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
        assert_eq!(source.requested(), vec![0]);
    }

    #[tokio::test]
    async fn later_page_failure_keeps_partial_results() {
        let source = ScriptedSource::new(vec![Some(vec![order("A"), order("B")]), None]);
        let options = CollectOptions::auto_paginate(0, 2, false);
        let collected = collect_pages(&source, OrderKind::ProductionOrder, &PageRequest::new(2), options)
            .await
            .expect("partial result");
        assert_eq!(numbers(&collected.records), vec!["A", "B"]);
        let note = collected.interrupted.expect("interruption note");
        assert!(note.contains("cut short at page 2"));
    }

    #[tokio::test]
    async fn reports_remaining_pages() {
        let source = ScriptedSource::new(vec![
            Some(vec![order("A"), order("B")]),
            Some(vec![order("C"), order("D")]),
            Some(vec![order("E"), order("F")]),
        ]);
        let options = CollectOptions::single_page(1, 2, false);
        let collected = collect_pages(&source, OrderKind::CustomerOrder, &PageRequest::new(2), options)
            .await
            .expect("collect");
        assert_eq!(source.requested(), vec![1]);
        assert_eq!(collected.last_page(), 1);
        assert!(collected.has_more_pages());
    }

    #[test]
    fn default_since_rolls_back_across_years() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("date");
        assert_eq!(default_since(now, 12), "2023-03-01T00:00:00");
        assert_eq!(default_since(now, 3), "2023-12-01T00:00:00");
        assert_eq!(default_since(now, 0), "2024-03-01T00:00:00");
    }

    #[test]
    fn recent_window_points_at_trailing_pages() {
        assert_eq!(recent_page_window(1, 30, 50, 150), 0);
        assert_eq!(recent_page_window(10, 500, 50, 150), 7);
        assert_eq!(recent_page_window(3, 120, 50, 150), 0);
    }

    #[test]
    fn recent_filter_precedence() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("date");
        assert_eq!(RecentFilter::default().resolve(now).as_deref(), Some("2023-03-01T00:00:00"));
        let explicit = RecentFilter {
            since_date: Some("2024-01-01T00:00:00".to_string()),
            ..RecentFilter::default()
        };
        assert_eq!(explicit.resolve(now).as_deref(), Some("2024-01-01T00:00:00"));
        let everything = RecentFilter {
            include_all_data: true,
            ..explicit
        };
        assert_eq!(everything.resolve(now), None);
        let off = RecentFilter {
            auto_filter_recent: false,
            ..RecentFilter::default()
        };
        assert_eq!(off.resolve(now), None);
        assert_eq!(off.describe(), None);
    }
}
