//! Calendar-day iteration.
//!
//! One snapshot request per day from `from` to `to` inclusive. Days where
//! the resource did not exist are kept as `exists == false` entries.

use std::future::Future;

use assetctl_core::{ApiError, CoreError, DayEntry, FetchResult, Page, ResponseMeta};
use chrono::{DateTime, Days, Utc};
use tracing::instrument;

use super::PagedFetch;

// ============================================================================
// Day Range
// ============================================================================

/// A validated inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DayRange {
    /// Validates a range against the configured window cap.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `from` is after `to` or the
    /// range spans more than `max_days` days.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>, max_days: u32) -> Result<Self, CoreError> {
        if from > to {
            return Err(CoreError::InvalidInput(format!(
                "start {} is after end {}",
                from.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            )));
        }

        let range = Self { from, to };
        let days = range.len();
        if days > u64::from(max_days) {
            return Err(CoreError::InvalidInput(format!(
                "range spans {days} days, at most {max_days} allowed"
            )));
        }
        Ok(range)
    }

    /// First day of the range.
    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// Last day of the range.
    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Number of days in the range (at least one).
    pub fn len(&self) -> u64 {
        u64::try_from((self.to - self.from).num_days()).unwrap_or(0) + 1
    }

    /// Always false: a valid range holds at least one day.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The day after `day`, if it is still inside the range.
    fn next_day(&self, day: DateTime<Utc>) -> Option<DateTime<Utc>> {
        day.checked_add_days(Days::new(1))
            .filter(|next| *next <= self.to)
    }

    /// Every day of the range, ascending.
    pub fn days(&self) -> Vec<DateTime<Utc>> {
        std::iter::successors(Some(self.from), |day| self.next_day(*day)).collect()
    }
}

// ============================================================================
// Fetch
// ============================================================================

impl<U> PagedFetch<'_, DayEntry<U>> {
    /// Requests one snapshot per day of `range`, oldest first.
    ///
    /// `call` returns the snapshot (or `None` when nothing meaningful
    /// existed that day) and the metadata of the request.
    #[instrument(skip(self, call), fields(label = %self.label, days = range.len()))]
    pub async fn fetch_days<F, Fut>(
        &self,
        range: DayRange,
        mut call: F,
    ) -> Result<FetchResult<DayEntry<U>>, ApiError>
    where
        F: FnMut(DateTime<Utc>) -> Fut,
        Fut: Future<Output = anyhow::Result<(Option<U>, ResponseMeta)>>,
    {
        let label = self.label.clone();
        let total_days = range.len();

        self.run_with(
            range.from(),
            move |day, page, _| {
                format!(
                    "Fetching {label} as of {} (day {page}/{total_days})",
                    day.format("%Y-%m-%d")
                )
            },
            |day| {
                let pending = call(day);
                async move {
                    let (data, meta) = pending.await?;
                    Ok(Page::new(vec![DayEntry::new(day, data)], meta))
                }
            },
            |day, _| range.next_day(*day),
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchContext;
    use crate::retry::RetryExecutor;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn meta() -> ResponseMeta {
        ResponseMeta::new("GET", "https://api.test/hosts/10.0.0.1", 200)
    }

    #[test]
    fn test_range_length() {
        assert_eq!(DayRange::new(day(1), day(1), 10).unwrap().len(), 1);
        assert_eq!(DayRange::new(day(1), day(3), 10).unwrap().len(), 3);
        assert_eq!(
            DayRange::new(day(1), day(3), 10).unwrap().days(),
            vec![day(1), day(2), day(3)]
        );
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = DayRange::new(day(3), day(1), 10).unwrap_err();
        assert!(err.to_string().contains("after"));
    }

    #[test]
    fn test_range_rejects_oversized_window() {
        assert!(DayRange::new(day(1), day(10), 10).is_ok());
        let err = DayRange::new(day(1), day(11), 10).unwrap_err();
        assert!(err.to_string().contains("11 days"));
    }

    #[tokio::test]
    async fn test_one_entry_per_day_ascending() {
        let ctx = FetchContext::new();
        let executor = RetryExecutor::default();
        let fetch = PagedFetch::new(&ctx, &executor).with_label("host");
        let range = DayRange::new(day(1), day(3), 366).unwrap();

        let result = fetch
            .fetch_days(range, |at| async move { Ok((Some(at.format("%d").to_string()), meta())) })
            .await
            .unwrap();

        let days: Vec<_> = result.items.iter().map(|entry| entry.at).collect();
        assert_eq!(days, vec![day(1), day(2), day(3)]);
        assert!(result.items.iter().all(|entry| entry.exists));
        assert_eq!(result.items[2].data.as_deref(), Some("03"));
        assert_eq!(result.meta.page_count, 3);
    }

    #[tokio::test]
    async fn test_missing_day_is_kept() {
        let ctx = FetchContext::new();
        let executor = RetryExecutor::default();
        let fetch = PagedFetch::new(&ctx, &executor);
        let range = DayRange::new(day(1), day(3), 366).unwrap();

        let result = fetch
            .fetch_days(range, |at| async move {
                let data = (at != day(2)).then_some(1u8);
                Ok((data, meta()))
            })
            .await
            .unwrap();

        assert_eq!(result.items.len(), 3);
        assert!(!result.items[1].exists);
        assert_eq!(result.items[1].data, None);
        assert_eq!(result.items[1].at, day(2));
    }
}
