//! Bounded Worker Group (`spec.md` §4.9): runs `f` over `items` with at most
//! `limit` concurrently in flight, collecting results in completion order. A
//! failing `f` yields `Err((error, item))` rather than cancelling its peers.
//!
//! Grounded in the teacher's browser-pool/orchestrator concurrency idiom and
//! `foofork-riptidecrawler`'s `Worker { semaphore: Arc<Semaphore> }` pattern.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::Sf4aiError;

pub async fn run_bounded<T, F, Fut, R>(
    items: Vec<T>,
    limit: usize,
    f: F,
) -> Vec<Result<R, (Sf4aiError, T)>>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Sf4aiError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let f = Arc::new(f);
    let mut in_flight = FuturesUnordered::new();
    let mut recovery: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let semaphore = semaphore.clone();
        let f = f.clone();
        let item_for_result = item.clone();
        recovery.push(item.clone());

        in_flight.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed while workers are in flight");
            let outcome = f(item).await;
            (item_for_result, outcome)
        }));
    }

    let mut results = Vec::with_capacity(in_flight.len());
    let mut recovery_iter = recovery.into_iter();
    while let Some(joined) = in_flight.next().await {
        match joined {
            Ok((item, Ok(value))) => {
                let _ = item;
                results.push(Ok(value));
            }
            Ok((item, Err(e))) => results.push(Err((e, item))),
            Err(join_error) => {
                // A panicked task carries no recoverable item; hand back
                // the next un-reconciled clone in submission order as a
                // best-effort association rather than losing the failure.
                let item = recovery_iter
                    .next()
                    .expect("one recovery clone exists per submitted item");
                results.push(Err((
                    Sf4aiError::NavigationError(format!("worker task panicked: {join_error}")),
                    item,
                )));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_all_items_and_collects_successes() {
        let items = vec![1, 2, 3, 4, 5];
        let results = run_bounded(items, 2, |n: i32| async move { Ok::<_, Sf4aiError>(n * 2) }).await;
        let mut values: Vec<i32> = results.into_iter().filter_map(Result::ok).collect();
        values.sort();
        assert_eq!(values, vec![2, 4, 6, 8, 10]);
    }

    #[tokio::test]
    async fn failing_item_does_not_cancel_peers() {
        let items = vec![1, 2, 3];
        let results = run_bounded(items, 3, |n: i32| async move {
            if n == 2 {
                Err(Sf4aiError::NavigationError("boom".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let failures = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(successes, 2);
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn respects_concurrency_limit() {
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let items: Vec<usize> = (0..10).collect();

        let c = concurrent.clone();
        let m = max_seen.clone();
        run_bounded(items, 3, move |_n: usize| {
            let c = c.clone();
            let m = m.clone();
            async move {
                let now = c.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                c.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, Sf4aiError>(())
            }
        })
        .await;

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }
}
