//! Timed "spinning" reveal of a randomly drawn gift.
//!
//! The reveal plays a precomputed [`RevealPlan`] on a background task: one
//! interim pick per tick, then the final pick. The handle cancels the task
//! when cancelled explicitly or when dropped, so no tick fires after the
//! dialog that owns it is gone.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::models::{GiftCandidate, SelectedGift};

/// Reveal timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Interim picks shown before the final one
    pub spins: u32,

    /// Interval between picks, in milliseconds
    pub tick_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            spins: 12,
            tick_ms: 120,
        }
    }
}

impl RevealConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// A reveal decided ahead of time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealPlan {
    /// Cosmetic picks, uniform over the candidates
    pub interim: Vec<GiftCandidate>,

    /// The weighted draw; the only pick attached to the order
    pub final_pick: SelectedGift,
}

/// One tick of a running reveal.
#[derive(Debug, Clone, PartialEq)]
pub enum RevealEvent {
    Spin(GiftCandidate),
    Settled(SelectedGift),
}

/// Owner of a running reveal.
#[derive(Debug)]
pub struct RevealHandle {
    final_pick: SelectedGift,
    events: mpsc::Receiver<RevealEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RevealHandle {
    /// The authoritative pick, known before the animation ends.
    pub fn final_pick(&self) -> &SelectedGift {
        &self.final_pick
    }

    /// Next tick, or `None` once the reveal finished or was cancelled.
    pub async fn next_event(&mut self) -> Option<RevealEvent> {
        self.events.recv().await
    }

    /// Stops the reveal; pending ticks never fire.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// A token that observes this reveal's cancellation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Plays `plan` on a spawned task, one event every `tick`.
pub(crate) fn spawn_reveal(plan: RevealPlan, tick: Duration) -> RevealHandle {
    let (tx, rx) = mpsc::channel(plan.interim.len() + 1);
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let final_pick = plan.final_pick.clone();

    let task = tokio::spawn(async move {
        let events = plan
            .interim
            .into_iter()
            .map(RevealEvent::Spin)
            .chain(std::iter::once(RevealEvent::Settled(plan.final_pick)));

        for event in events {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::debug!("gift reveal cancelled");
                    return;
                }
                () = tokio::time::sleep(tick) => {}
            }
            if tx.send(event).await.is_err() {
                return;
            }
        }
    });

    RevealHandle {
        final_pick,
        events: rx,
        cancel,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gift::models::GiftMode;
    use rust_decimal::Decimal;

    fn candidate(id: &str) -> GiftCandidate {
        GiftCandidate {
            id: id.into(),
            name: id.into(),
            price: Decimal::from(20),
            weight: None,
        }
    }

    fn plan() -> RevealPlan {
        RevealPlan {
            interim: vec![candidate("a"), candidate("b"), candidate("a")],
            final_pick: SelectedGift {
                promotion_id: "p".into(),
                minimum_amount: Decimal::from(150),
                mode: GiftMode::Random,
                candidate: candidate("b"),
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_plays_spins_then_settles_on_final_pick() {
        let mut handle = spawn_reveal(plan(), Duration::from_millis(100));
        let expected = handle.final_pick().clone();

        let mut spins = 0;
        let mut settled = None;
        while let Some(event) = handle.next_event().await {
            match event {
                RevealEvent::Spin(_) => spins += 1,
                RevealEvent::Settled(gift) => settled = Some(gift),
            }
        }

        assert_eq!(spins, 3);
        assert_eq!(settled, Some(expected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_pending_ticks() {
        let mut handle = spawn_reveal(plan(), Duration::from_millis(100));
        assert!(matches!(handle.next_event().await, Some(RevealEvent::Spin(_))));

        handle.cancel();
        let mut later = Vec::new();
        while let Some(event) = handle.next_event().await {
            later.push(event);
        }

        assert!(handle.is_cancelled());
        assert!(later.iter().all(|e| !matches!(e, RevealEvent::Settled(_))));
        assert!(later.len() < 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_task() {
        let handle = spawn_reveal(plan(), Duration::from_millis(100));
        let token = handle.cancellation_token();
        drop(handle);
        assert!(token.is_cancelled());
    }
}
