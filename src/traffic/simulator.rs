//! Randomized per-visit interaction driving
//!
//! The simulator never fails outward: navigation timeouts, navigation errors,
//! and element-level interaction errors are all absorbed into a degraded
//! visit record so a bad page can never take down a worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::Page;
use futures::StreamExt;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::browser::{BrowserError, BrowserSession};
use crate::storage::VisitRecord;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const SETTLE_DELAY: Duration = Duration::from_millis(1000);
const SCROLL_INTO_VIEW_TIMEOUT: Duration = Duration::from_secs(2);
const CLICK_TIMEOUT: Duration = Duration::from_secs(3);

/// Drives one simulated visit against a session.
///
/// `simulate` must always return a record — failure paths degrade the record
/// (status_code -1, whatever interaction count was reached) instead of
/// propagating.
#[async_trait]
pub trait Simulator<S>: Send + Sync {
    async fn simulate(&self, session: &mut S, url: &str, max_interactions: u32) -> VisitRecord;
}

/// Chrome-backed simulator: navigate, settle, randomized scrolls, then
/// randomized clicks up to the interaction budget.
pub struct ActionSimulator;

impl ActionSimulator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ActionSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Simulator<BrowserSession> for ActionSimulator {
    async fn simulate(
        &self,
        session: &mut BrowserSession,
        url: &str,
        max_interactions: u32,
    ) -> VisitRecord {
        let start = Instant::now();
        let mut interactions: u32 = 0;
        let mut status_code: Option<i64> = None;

        match navigate(session, url).await {
            Ok(status) => {
                status_code = status;
                interactions += 1;
                tokio::time::sleep(SETTLE_DELAY).await;

                // StdRng: thread_rng is not Send across await points
                let mut rng = StdRng::from_entropy();
                match scroll_phase(session, max_interactions, &mut interactions, &mut rng).await {
                    Ok(()) => {
                        click_phase(session, url, max_interactions, &mut interactions, &mut rng)
                            .await;
                    }
                    Err(e) => {
                        warn!("Interaction error on {}: {}", url, e);
                    }
                }
            }
            Err(BrowserError::Timeout(e)) => {
                warn!("Timeout while loading {}: {}", url, e);
            }
            Err(e) => {
                warn!("Navigation error on {}: {}", url, e);
            }
        }

        VisitRecord::new(url, status_code, start.elapsed(), interactions)
    }
}

/// Navigate to the URL under the navigation timeout and return the HTTP
/// status of the main document, if one was observed.
async fn navigate(session: &BrowserSession, url: &str) -> Result<Option<i64>, BrowserError> {
    let page = &session.page;

    // The main-document status arrives as a network event; the Network
    // domain must be enabled and the listener installed before navigation
    // starts.
    page.execute(EnableParams::default())
        .await
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;

    let status_slot: Arc<Mutex<Option<i64>>> = Arc::new(Mutex::new(None));
    let slot = status_slot.clone();
    let listener_task = tokio::spawn(async move {
        while let Some(event) = responses.next().await {
            if event.r#type == ResourceType::Document {
                *slot.lock() = Some(event.response.status);
                break;
            }
        }
    });

    let navigation = async {
        page.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        Ok::<(), BrowserError>(())
    };

    let result = match timeout(NAVIGATION_TIMEOUT, navigation).await {
        Ok(Ok(())) => Ok(*status_slot.lock()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(BrowserError::Timeout(format!(
            "navigation did not settle within {}s",
            NAVIGATION_TIMEOUT.as_secs()
        ))),
    };

    listener_task.abort();
    result
}

/// Perform `floor(max_interactions / 2)` (at least one) randomized scroll
/// steps. Not capped by the remaining budget beyond its own computed count.
async fn scroll_phase(
    session: &BrowserSession,
    max_interactions: u32,
    interactions: &mut u32,
    rng: &mut StdRng,
) -> Result<(), BrowserError> {
    let steps = (max_interactions / 2).max(1);
    for _ in 0..steps {
        let delta_y = rng.gen_range(200..=800) as f64;
        scroll_wheel(&session.page, delta_y).await?;
        *interactions += 1;
        tokio::time::sleep(Duration::from_millis(rng.gen_range(300..=700))).await;
    }
    debug!("Session {}: scrolled {} times", session.id, steps);
    Ok(())
}

/// Click randomly-ordered links and buttons until the enumerated set is
/// exhausted or the interaction budget is reached. Element-level errors are
/// swallowed; the loop moves on to the next candidate.
async fn click_phase(
    session: &BrowserSession,
    url: &str,
    max_interactions: u32,
    interactions: &mut u32,
    rng: &mut StdRng,
) {
    let mut elements = match session.page.find_elements("a, button").await {
        Ok(elements) => elements,
        Err(e) => {
            debug!("Error enumerating clickable elements on {}: {}", url, e);
            return;
        }
    };
    elements.shuffle(rng);

    for element in &elements {
        if *interactions >= max_interactions {
            break;
        }

        let clicked = async {
            timeout(SCROLL_INTO_VIEW_TIMEOUT, element.scroll_into_view())
                .await
                .map_err(|_| BrowserError::Timeout("scroll into view".into()))?
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
            timeout(CLICK_TIMEOUT, element.click())
                .await
                .map_err(|_| BrowserError::Timeout("click".into()))?
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
            Ok::<(), BrowserError>(())
        }
        .await;

        match clicked {
            Ok(()) => {
                *interactions += 1;
                tokio::time::sleep(Duration::from_millis(rng.gen_range(300..=800))).await;
            }
            Err(e) => {
                debug!("Session {}: click skipped on {}: {}", session.id, url, e);
            }
        }
    }
}

/// Scroll the page using a CDP mouse wheel event
async fn scroll_wheel(page: &Page, delta_y: f64) -> Result<(), BrowserError> {
    let params = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MouseWheel)
        .x(400.0)
        .y(300.0)
        .button(MouseButton::None)
        .delta_x(0.0)
        .delta_y(delta_y)
        .build()
        .map_err(BrowserError::Protocol)?;

    page.execute(params)
        .await
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;
    Ok(())
}

// Exercising the full simulate path requires a running Chrome instance; the
// scheduling-level behavior is covered with stub simulators in
// `traffic::manager` tests.
