//! Bounded concurrency scheduler
//!
//! Runs an async unit of work over an ordered list with at most `limit`
//! invocations in flight. Completion order is free; the result vector is
//! index-addressed so `results[i]` always belongs to `items[i]`.
//!
//! `work` is only called when a slot frees up, so nothing starts before it is
//! admitted. Per-item failures must be encoded in `R` by the caller.

use futures::stream::{self, StreamExt};
use std::future::Future;

use crate::types::{RepodocError, Result};

/// Run `work(item, index)` over `items` with bounded parallelism
pub async fn run_bounded<I, R, F, Fut>(limit: usize, items: Vec<I>, work: F) -> Result<Vec<R>>
where
    F: Fn(I, usize) -> Fut,
    Fut: Future<Output = R>,
{
    if limit == 0 {
        return Err(RepodocError::Config(
            "concurrency limit must be at least 1".to_string(),
        ));
    }

    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut in_flight = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let fut = work(item, idx);
            async move { (idx, fut.await) }
        })
        .buffer_unordered(limit.min(total));

    while let Some((idx, result)) = in_flight.next().await {
        slots[idx] = Some(result);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.ok_or_else(|| RepodocError::Scheduler(format!("no result for item {}", idx)))
        })
        .collect()
}
