//! Draw engine: picks outcomes and lays out the reveal schedule

use rp_core::{RpError, Slot, ValidationError};
use rp_state::IntentError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::{DrawId, DrawOutcome, DrawPlan, ReelReveal};
use crate::rng::{DrawRng, SeededRng};
use crate::timing::{TimingConfig, TimingProfile};

/// Draw failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    /// A slot with no items reached the engine
    #[error("Slot {slot_index} has no items to draw from")]
    EmptySlot { slot_index: usize },

    #[error("A draw is already in flight")]
    AlreadyInFlight,

    #[error("No Tokio runtime is available to drive the draw")]
    NoRuntime,

    #[error(transparent)]
    Rejected(#[from] IntentError),
}

impl From<DrawError> for RpError {
    fn from(err: DrawError) -> Self {
        match err {
            DrawError::Rejected(rejected) => rejected.into(),
            DrawError::AlreadyInFlight => RpError::Validation(ValidationError::WrongPhase {
                phase: "playing".to_string(),
            }),
            other => RpError::EngineContract(other.to_string()),
        }
    }
}

/// Per-engine counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawStats {
    pub draws_planned: u64,
    pub reels_planned: u64,
    pub draws_completed: u64,
    pub draws_cancelled: u64,
    /// Plans where a reel stops before a lower-indexed one
    pub out_of_order_plans: u64,
}

/// Uniform per-slot draw engine
pub struct DrawEngine<R: DrawRng = SeededRng> {
    rng: R,
    timing: TimingConfig,
    next_draw_id: DrawId,
    stats: DrawStats,
}

impl DrawEngine<SeededRng> {
    /// Reproducible engine with normal timing
    pub fn seeded(seed: u64) -> Self {
        Self::new(SeededRng::seeded(seed))
    }

    /// Engine seeded from entropy
    pub fn from_entropy() -> Self {
        Self::new(SeededRng::from_entropy())
    }
}

impl<R: DrawRng> DrawEngine<R> {
    pub fn new(rng: R) -> Self {
        Self::with_timing(rng, TimingConfig::default())
    }

    pub fn with_timing(rng: R, timing: TimingConfig) -> Self {
        Self {
            rng,
            timing,
            next_draw_id: 1,
            stats: DrawStats::default(),
        }
    }

    /// Switch timing profile
    pub fn set_timing(&mut self, profile: TimingProfile) {
        self.timing = TimingConfig::from_profile(profile);
    }

    pub fn timing_config(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn stats(&self) -> &DrawStats {
        &self.stats
    }

    pub(crate) fn record_completed(&mut self) {
        self.stats.draws_completed += 1;
    }

    pub(crate) fn record_cancelled(&mut self) {
        self.stats.draws_cancelled += 1;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLANNING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Draw one item per slot and schedule its reveal.
    ///
    /// Every slot must hold at least one item; otherwise nothing is drawn
    /// and no randomness is consumed.
    pub fn plan(&mut self, slots: &[Slot]) -> Result<DrawPlan, DrawError> {
        if let Some(slot_index) = slots.iter().position(|slot| slot.items.is_empty()) {
            let err = DrawError::EmptySlot { slot_index };
            log::error!("[DrawEngine] Contract violation: {}", err);
            return Err(err);
        }

        let reveals: Vec<ReelReveal> = slots
            .iter()
            .enumerate()
            .map(|(slot_index, slot)| {
                let item_index = self.rng.pick_index(slot.items.len());
                let jitter_ms = self.rng.jitter_ms(self.timing.jitter_ms);
                ReelReveal {
                    outcome: DrawOutcome {
                        slot_index,
                        item_index,
                        item: slot.items[item_index].clone(),
                    },
                    offset_ms: self.timing.reveal_offset_ms(slot_index, jitter_ms),
                    jitter_ms,
                }
            })
            .collect();

        let plan = DrawPlan {
            draw_id: self.next_draw_id,
            reveals,
            settle_ms: self.timing.settle_ms,
        };
        self.next_draw_id += 1;

        self.stats.draws_planned += 1;
        self.stats.reels_planned += plan.reel_count() as u64;
        if plan.is_out_of_order() {
            self.stats.out_of_order_plans += 1;
        }

        log::debug!(
            "[DrawEngine] Planned draw {} over {} reels ({:.0} ms)",
            plan.draw_id,
            plan.reel_count(),
            plan.total_duration_ms()
        );
        Ok(plan)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export timing as JSON
    pub fn export_timing(&self) -> String {
        serde_json::to_string_pretty(&self.timing).unwrap_or_default()
    }

    /// Import timing from JSON; the current timing is kept on error
    pub fn import_timing(&mut self, json: &str) -> Result<(), String> {
        let timing: TimingConfig =
            serde_json::from_str(json).map_err(|e| format!("Invalid timing: {}", e))?;
        timing.validate()?;
        self.timing = timing;
        Ok(())
    }
}

impl Default for DrawEngine<SeededRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::Item;
    use std::collections::HashMap;

    fn slot(id: usize, texts: &[&str]) -> Slot {
        Slot {
            id,
            item_count: texts.len(),
            items: texts
                .iter()
                .enumerate()
                .map(|(i, text)| Item::with_text(i, *text))
                .collect(),
        }
    }

    fn lunch_picker() -> Vec<Slot> {
        vec![slot(0, &["A", "B"]), slot(1, &["C", "D"])]
    }

    #[test]
    fn test_plan_picks_from_each_slot() {
        let mut engine = DrawEngine::seeded(42);
        let slots = lunch_picker();

        for _ in 0..50 {
            let plan = engine.plan(&slots).unwrap();
            assert_eq!(plan.reel_count(), 2);
            for (i, item) in plan.result().iter().enumerate() {
                assert!(slots[i].items.contains(item));
            }
        }
        assert_eq!(engine.stats().draws_planned, 50);
        assert_eq!(engine.stats().reels_planned, 100);
    }

    #[test]
    fn test_offsets_follow_schedule() {
        let mut engine = DrawEngine::seeded(7);
        let plan = engine.plan(&lunch_picker()).unwrap();

        for reveal in &plan.reveals {
            let base = 1500.0 + reveal.outcome.slot_index as f64 * 800.0;
            assert!(reveal.offset_ms >= base);
            assert!(reveal.offset_ms < base + 500.0);
            assert_eq!(reveal.offset_ms, base + reveal.jitter_ms);
        }
        assert_eq!(plan.settle_ms, 500.0);
    }

    #[test]
    fn test_lunch_picker_is_uniform() {
        let mut engine = DrawEngine::seeded(2024);
        let slots = lunch_picker();
        let trials = 8000;
        let mut counts: HashMap<(String, String), usize> = HashMap::new();

        for _ in 0..trials {
            let result = engine.plan(&slots).unwrap().result();
            *counts
                .entry((result[0].text.clone(), result[1].text.clone()))
                .or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        for (pair, count) in counts {
            let share = count as f64 / trials as f64;
            assert!(
                (share - 0.25).abs() < 0.03,
                "{:?} drawn {:.3} of the time",
                pair,
                share
            );
        }
    }

    #[test]
    fn test_empty_slot_is_rejected() {
        let mut engine = DrawEngine::seeded(1);
        let slots = vec![slot(0, &["A"]), Slot::empty(1)];

        assert_eq!(
            engine.plan(&slots),
            Err(DrawError::EmptySlot { slot_index: 1 })
        );
        assert_eq!(engine.stats().draws_planned, 0);
    }

    #[test]
    fn test_single_item_slot() {
        let mut engine = DrawEngine::seeded(3);
        let plan = engine.plan(&[slot(0, &["Only"])]).unwrap();
        assert_eq!(plan.reveals[0].outcome.item_index, 0);
        assert!(plan.reveals[0].offset_ms >= 1500.0);
    }

    #[test]
    fn test_zero_slots() {
        let mut engine = DrawEngine::seeded(3);
        let plan = engine.plan(&[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.total_duration_ms(), 0.0);
    }

    #[test]
    fn test_draw_ids_increase() {
        let mut engine = DrawEngine::seeded(5);
        let first = engine.plan(&lunch_picker()).unwrap().draw_id;
        let second = engine.plan(&lunch_picker()).unwrap().draw_id;
        assert!(second > first);
    }

    #[test]
    fn test_draw_error_into_rp_error() {
        let err = RpError::from(DrawError::EmptySlot { slot_index: 2 });
        assert!(matches!(err, RpError::EngineContract(_)));
        assert!(matches!(
            RpError::from(DrawError::AlreadyInFlight),
            RpError::Validation(ValidationError::WrongPhase { .. })
        ));
    }

    #[test]
    fn test_timing_export_import() {
        let mut engine = DrawEngine::seeded(5);
        engine.set_timing(TimingProfile::Turbo);
        let json = engine.export_timing();

        let mut other = DrawEngine::seeded(6);
        other.import_timing(&json).unwrap();
        assert_eq!(other.timing_config(), &TimingConfig::turbo());
        assert!(other.import_timing("{").is_err());
    }

    #[test]
    fn test_import_rejects_negative_delays() {
        let mut engine = DrawEngine::seeded(5);
        let json = r#"{"profile":"custom","base_delay_ms":-100.0,"reel_interval_ms":800.0,"jitter_ms":500.0,"settle_ms":500.0}"#;
        let err = engine.import_timing(json).unwrap_err();
        assert!(err.contains("base_delay_ms"));
        assert_eq!(engine.timing_config(), &TimingConfig::normal());
    }

    #[test]
    fn test_unbounded_timing_still_plans() {
        let mut engine =
            DrawEngine::with_timing(SeededRng::seeded(4), TimingConfig::normal().scaled(f64::INFINITY));
        let plan = engine.plan(&lunch_picker()).unwrap();

        assert_eq!(plan.reel_count(), 2);
        assert!(plan.reveals.iter().all(|reveal| reveal.jitter_ms == 0.0));
        assert_eq!(plan.reveals[1].delay(), std::time::Duration::MAX);
        assert_eq!(plan.settle_delay(), std::time::Duration::MAX);
        assert!(plan.total_duration_ms().is_infinite());
    }
}
