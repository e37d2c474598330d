//! Slot machine: drives draws against the session store

use std::sync::Arc;

use parking_lot::Mutex;
use rp_core::Item;
use rp_state::{Intent, Phase, SaveOutcome, Session, SessionStore, SnapshotStore};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::barrier::RevealBarrier;
use crate::engine::{DrawEngine, DrawError, DrawStats};
use crate::events::DrawEvent;
use crate::outcome::{DrawId, DrawPlan, ReelReveal};
use crate::rng::{DrawRng, SeededRng};
use crate::timer::{ReelTimer, TokioTimer};
use crate::timing::TimingConfig;

/// Default broadcast capacity for draw events
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Machine setup
#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub timing: TimingConfig,
    /// Broadcast buffer per subscriber
    pub event_capacity: usize,
    /// Fixed RNG seed; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            seed: None,
        }
    }
}

/// How a draw ended
#[derive(Debug, Clone, PartialEq)]
pub enum DrawStatus {
    /// Result committed to the session (slot order)
    Completed(Vec<Item>),
    /// Superseded or aborted; nothing was committed
    Cancelled,
}

impl DrawStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Handle to a running draw
pub struct DrawHandle {
    draw_id: DrawId,
    join: JoinHandle<DrawStatus>,
}

impl DrawHandle {
    pub fn id(&self) -> DrawId {
        self.draw_id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the draw to settle
    pub async fn wait(self) -> DrawStatus {
        match self.join.await {
            Ok(status) => status,
            Err(e) => {
                log::error!("[SlotMachine] Draw {} task failed: {}", self.draw_id, e);
                DrawStatus::Cancelled
            }
        }
    }
}

struct ActiveDraw {
    id: DrawId,
    token: CancellationToken,
}

struct Inner<R: DrawRng, T: ReelTimer> {
    store: SessionStore,
    engine: Mutex<DrawEngine<R>>,
    timer: T,
    /// Lock order: `active`, then the store, then `engine`
    active: Mutex<Option<ActiveDraw>>,
    event_tx: broadcast::Sender<DrawEvent>,
}

/// Owns the session store and runs at most one draw at a time.
///
/// Every session change goes through [`SlotMachine::dispatch`] so that
/// intents leaving the `Playing` phase cancel the draw in flight. Draws run
/// as tokio tasks; [`SlotMachine::start_draw`] must be called from within a
/// runtime.
pub struct SlotMachine<R: DrawRng = SeededRng, T: ReelTimer = TokioTimer> {
    inner: Arc<Inner<R, T>>,
}

impl<R: DrawRng, T: ReelTimer> Clone for SlotMachine<R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SlotMachine<SeededRng, TokioTimer> {
    /// Machine on the tokio clock with a seeded or entropy RNG
    pub fn from_config(store: SessionStore, config: MachineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SeededRng::seeded(seed),
            None => SeededRng::from_entropy(),
        };
        let engine = DrawEngine::with_timing(rng, config.timing);
        Self::with_capacity(store, engine, TokioTimer, config.event_capacity)
    }
}

impl<R: DrawRng + 'static, T: ReelTimer> SlotMachine<R, T> {
    pub fn new(store: SessionStore, engine: DrawEngine<R>, timer: T) -> Self {
        Self::with_capacity(store, engine, timer, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(
        store: SessionStore,
        engine: DrawEngine<R>,
        timer: T,
        event_capacity: usize,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                store,
                engine: Mutex::new(engine),
                timer,
                active: Mutex::new(None),
                event_tx,
            }),
        }
    }

    /// Copy of the current session
    pub fn session(&self) -> Session {
        self.inner.store.session()
    }

    pub fn phase(&self) -> Phase {
        self.inner.store.phase()
    }

    /// Read the session without copying it
    pub fn read<U>(&self, f: impl FnOnce(&Session) -> U) -> U {
        self.inner.store.read(f)
    }

    /// Write the current session to the snapshot store, if one is attached
    pub fn save(&self) -> Option<SaveOutcome> {
        self.inner.store.save()
    }

    pub fn snapshots(&self) -> Option<&SnapshotStore> {
        self.inner.store.snapshots()
    }

    /// Subscribe to draw events
    pub fn subscribe(&self) -> broadcast::Receiver<DrawEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn stats(&self) -> DrawStats {
        self.inner.engine.lock().stats().clone()
    }

    pub fn timing_config(&self) -> TimingConfig {
        self.inner.engine.lock().timing_config().clone()
    }

    /// Id of the draw in flight, if any
    pub fn active_draw(&self) -> Option<DrawId> {
        self.inner.active.lock().as_ref().map(|draw| draw.id)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTENTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply an intent.
    ///
    /// `StartDraw` launches a detached draw (see [`SlotMachine::start_draw`]
    /// for a handle). Accepted intents that leave `Playing` cancel the draw
    /// in flight.
    pub fn dispatch(&self, intent: Intent) -> Result<Session, DrawError> {
        if matches!(intent, Intent::StartDraw) {
            self.start_draw()?;
            return Ok(self.session());
        }

        let supersedes = supersedes_draw(&intent);
        let mut active = self.inner.active.lock();
        let next = self.inner.store.dispatch(intent)?;
        if supersedes {
            if let Some(draw) = active.take() {
                self.cancel(draw);
            }
        }
        Ok(next)
    }

    /// Start a draw over the current slots.
    ///
    /// Rejected while a draw is in flight or outside `Ready`/`Result`; a slot
    /// without items fails with [`DrawError::EmptySlot`] and leaves the
    /// session untouched.
    pub fn start_draw(&self) -> Result<DrawHandle, DrawError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DrawError::NoRuntime)?;

        let mut active = self.inner.active.lock();
        let session = self.inner.store.session();
        if session.phase() == Phase::Playing {
            log::warn!("[SlotMachine] Draw requested while another is in flight");
            return Err(DrawError::AlreadyInFlight);
        }

        // Dry run first so a rejected intent consumes no randomness
        session.apply(Intent::StartDraw)?;
        let plan = self.inner.engine.lock().plan(session.slots())?;
        self.inner.store.dispatch(Intent::StartDraw)?;

        if let Some(stale) = active.take() {
            self.cancel(stale);
        }

        let draw_id = plan.draw_id;
        let token = CancellationToken::new();
        *active = Some(ActiveDraw {
            id: draw_id,
            token: token.clone(),
        });
        drop(active);

        log::info!(
            "[SlotMachine] Draw {} started over {} slots",
            draw_id,
            plan.reel_count()
        );
        self.emit(DrawEvent::Started {
            draw_id,
            slot_count: plan.reel_count(),
        });

        let machine = self.clone();
        let join = runtime.spawn(async move { machine.run_draw(plan, token).await });
        Ok(DrawHandle { draw_id, join })
    }

    /// Cancel the draw in flight and return to `Ready`
    pub fn cancel_draw(&self) -> bool {
        let mut active = self.inner.active.lock();
        let Some(draw) = active.take() else {
            return false;
        };
        self.cancel(draw);
        if self.inner.store.phase() == Phase::Playing {
            if let Err(e) = self.inner.store.dispatch(Intent::SetPhase {
                phase: Phase::Ready,
            }) {
                log::error!("[SlotMachine] Could not leave Playing: {}", e);
            }
        }
        true
    }

    /// Back to the initial session, cancelling any draw
    pub fn reset(&self) -> Result<Session, DrawError> {
        self.dispatch(Intent::Reset)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DRAW DRIVER
    // ═══════════════════════════════════════════════════════════════════════════

    async fn run_draw(self, plan: DrawPlan, token: CancellationToken) -> DrawStatus {
        let draw_id = plan.draw_id;
        let mut barrier = RevealBarrier::new(plan.reel_count());
        let mut reveals: JoinSet<Option<ReelReveal>> = JoinSet::new();

        for reveal in plan.reveals.iter().cloned() {
            let timer = self.inner.timer.clone();
            let token = token.clone();
            reveals.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => None,
                    _ = timer.sleep(reveal.delay()) => Some(reveal),
                }
            });
        }

        while let Some(joined) = reveals.join_next().await {
            match joined {
                Ok(Some(reveal)) if !token.is_cancelled() => {
                    log::debug!(
                        "[SlotMachine] Draw {} reel {} stopped on '{}'",
                        draw_id,
                        reveal.outcome.slot_index,
                        reveal.outcome.item.label()
                    );
                    barrier.arrive(reveal.outcome.slot_index);
                    self.emit(DrawEvent::ReelStopped {
                        draw_id,
                        outcome: reveal.outcome,
                        offset_ms: reveal.offset_ms,
                    });
                }
                Ok(_) => break,
                Err(e) => {
                    log::error!("[SlotMachine] Reveal task failed: {}", e);
                    break;
                }
            }
        }
        // Dropping the set aborts any reveal still pending
        drop(reveals);

        if token.is_cancelled() || !barrier.is_complete() {
            return self.abandon(draw_id);
        }

        if !plan.is_empty() {
            tokio::select! {
                _ = token.cancelled() => return self.abandon(draw_id),
                _ = self.inner.timer.sleep(plan.settle_delay()) => {}
            }
        }

        self.commit(&plan, &token)
    }

    fn commit(&self, plan: &DrawPlan, token: &CancellationToken) -> DrawStatus {
        let draw_id = plan.draw_id;
        let mut active = self.inner.active.lock();
        let is_current =
            !token.is_cancelled() && active.as_ref().is_some_and(|draw| draw.id == draw_id);
        if !is_current {
            drop(active);
            log::debug!("[SlotMachine] Draw {} superseded before commit", draw_id);
            self.emit(DrawEvent::Cancelled { draw_id });
            return DrawStatus::Cancelled;
        }

        // The result must still describe the session it is written into
        let session = self.inner.store.session();
        if session.phase() != Phase::Playing || !plan.matches_slots(session.slots()) {
            active.take();
            log::warn!(
                "[SlotMachine] Draw {} no longer matches the session ({}), discarding",
                draw_id,
                session.phase()
            );
            self.leave_playing();
            self.inner.engine.lock().record_cancelled();
            drop(active);
            self.emit(DrawEvent::Cancelled { draw_id });
            return DrawStatus::Cancelled;
        }

        let result = plan.result();
        let committed = self
            .inner
            .store
            .dispatch(Intent::SetResult {
                items: result.clone(),
            })
            .and_then(|_| {
                self.inner.store.dispatch(Intent::SetPhase {
                    phase: Phase::Result,
                })
            });
        active.take();

        match committed {
            Ok(_) => {
                self.inner.engine.lock().record_completed();
                drop(active);
                log::info!("[SlotMachine] Draw {} completed", draw_id);
                self.emit(DrawEvent::Completed {
                    draw_id,
                    result: result.clone(),
                });
                DrawStatus::Completed(result)
            }
            Err(e) => {
                log::error!("[SlotMachine] Draw {} result rejected: {}", draw_id, e);
                self.leave_playing();
                self.inner.engine.lock().record_cancelled();
                drop(active);
                self.emit(DrawEvent::Cancelled { draw_id });
                DrawStatus::Cancelled
            }
        }
    }

    /// Finish a draw that will not commit
    fn abandon(&self, draw_id: DrawId) -> DrawStatus {
        let mut active = self.inner.active.lock();
        // Still registered means nobody cancelled it: the driver gave up
        if active.as_ref().is_some_and(|draw| draw.id == draw_id) {
            active.take();
            self.leave_playing();
            self.inner.engine.lock().record_cancelled();
        }
        drop(active);

        log::info!("[SlotMachine] Draw {} cancelled", draw_id);
        self.emit(DrawEvent::Cancelled { draw_id });
        DrawStatus::Cancelled
    }

    fn cancel(&self, draw: ActiveDraw) {
        log::debug!("[SlotMachine] Cancelling draw {}", draw.id);
        draw.token.cancel();
        self.inner.engine.lock().record_cancelled();
    }

    fn leave_playing(&self) {
        if self.inner.store.phase() != Phase::Playing {
            return;
        }
        if let Err(e) = self.inner.store.dispatch(Intent::SetPhase {
            phase: Phase::Ready,
        }) {
            log::error!("[SlotMachine] Could not leave Playing: {}", e);
        }
    }

    fn emit(&self, event: DrawEvent) {
        // No subscribers is fine
        let _ = self.inner.event_tx.send(event);
    }
}

/// Intents that invalidate a draw in flight
fn supersedes_draw(intent: &Intent) -> bool {
    match intent {
        Intent::Reset
        | Intent::EditSlots
        | Intent::SetSlotCount { .. }
        | Intent::SetTitle { .. } => true,
        Intent::SetPhase { phase } => *phase != Phase::Playing,
        _ => false,
    }
}
