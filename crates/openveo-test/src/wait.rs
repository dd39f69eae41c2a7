//! Bounded waits on page conditions.
//!
//! A wait polls its condition until it holds or the timeout expires. A timeout
//! is a hard failure carrying the static message given by the caller; nothing
//! retries it.

use crate::locator::Finder;
use crate::result::{VeoError, VeoResult};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Condition awaited on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Element present and displayed
    Visible(Finder),
    /// Element absent or not displayed
    Invisible(Finder),
    /// Element present in the document
    Present(Finder),
    /// Element gone from the document
    Absent(Finder),
    /// Element displayed and enabled
    Clickable(Finder),
    /// Every expectation holds
    All(Vec<Expectation>),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible(finder) => write!(f, "visibilityOf({finder})"),
            Self::Invisible(finder) => write!(f, "invisibilityOf({finder})"),
            Self::Present(finder) => write!(f, "presenceOf({finder})"),
            Self::Absent(finder) => write!(f, "stalenessOf({finder})"),
            Self::Clickable(finder) => write!(f, "elementToBeClickable({finder})"),
            Self::All(all) => {
                f.write_str("and(")?;
                for (i, e) in all.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Poll `check` every `poll_ms` until it returns `true` or `timeout_ms` expires.
///
/// Errors returned by `check` abort the wait.
pub async fn poll_until<F, Fut>(
    timeout_ms: u64,
    poll_ms: u64,
    message: &str,
    mut check: F,
) -> VeoResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = VeoResult<bool>>,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if check().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(VeoError::timeout(message, timeout_ms));
        }
        tokio::time::sleep(Duration::from_millis(poll_ms.max(1))).await;
    }
}

/// Outcome of a wait whose timeout is expected: `false` on timeout, other
/// errors propagate
pub fn held(outcome: VeoResult<()>) -> VeoResult<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(VeoError::Timeout { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    mod poll_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_once_condition_holds() {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = calls.clone();
            poll_until(1000, 50, "never", move || {
                let counter = counter.clone();
                async move { Ok(counter.fetch_add(1, Ordering::SeqCst) >= 3) }
            })
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 4);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_carries_message() {
            let err = poll_until(1000, 50, "Missing add form", || async { Ok(false) })
                .await
                .unwrap_err();
            match err {
                VeoError::Timeout { message, ms } => {
                    assert_eq!(message, "Missing add form");
                    assert_eq!(ms, 1000);
                }
                other => panic!("unexpected error {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_errors_abort_wait() {
            let err = poll_until(1000, 50, "x", || async {
                Err(VeoError::Driver {
                    message: "session lost".to_string(),
                })
            })
            .await
            .unwrap_err();
            assert!(matches!(err, VeoError::Driver { .. }));
        }
    }

    mod held_tests {
        use super::*;

        #[test]
        fn test_only_timeouts_are_tolerated() {
            assert!(held(Ok(())).unwrap());
            assert!(!held(Err(VeoError::timeout("Missing suggestions", 1000))).unwrap());
            let err = held(Err(VeoError::StaleElement {
                id: "doc:1".to_string(),
            }))
            .unwrap_err();
            assert!(matches!(err, VeoError::StaleElement { .. }));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_nested_display() {
            let e = Expectation::All(vec![
                Expectation::Visible(Finder::css(".a")),
                Expectation::Absent(Finder::css(".b")),
            ]);
            assert_eq!(
                e.to_string(),
                "and(visibilityOf(element.all(by.css(\".a\"))), stalenessOf(element.all(by.css(\".b\"))))"
            );
        }
    }
}
