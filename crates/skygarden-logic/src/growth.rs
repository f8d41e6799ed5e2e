//! Per-plant growth simulator.
//!
//! States: `Growing → FullyGrown → Charging ⇄ FullyGrown → Cooldown → Growing`,
//! plus `Dull`, entered from a resume after a long absence and left for
//! `Growing` once its delay elapses.
//!
//! Growth and charge are two independent resumable sequences advanced once per
//! tick by [`GrowthSimulator::tick`]. Starting a sequence replaces whatever was
//! in flight for that plant; [`GrowthSimulator::cancel`] makes both inert.
//! Speed multipliers arrive through [`GrowthContext`], never from global state.

use serde::{Deserialize, Serialize};

use crate::config::GrowthConfig;

/// Growth within this distance of the maximum snaps to the maximum.
const GROWTH_EPSILON: f32 = 1e-4;

/// Per-tick inputs supplied by the owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthContext {
    /// Current mode's growth speed multiplier
    pub speed_multiplier: f32,
    /// Simulated seconds covered by one tick
    pub tick_interval: f32,
    /// Multiplier applied to offline catch-up
    pub away_multiplier: f32,
}

impl Default for GrowthContext {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            tick_interval: 0.1,
            away_multiplier: 1.0,
        }
    }
}

/// Growth sequence state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GrowthState {
    /// Not yet started, or cancelled
    Inactive,
    /// Visual-only delay after a long absence
    Dull { remaining: f32 },
    Growing,
    FullyGrown,
    Charging,
    /// Post-harvest rest before regrowing
    Cooldown { remaining: f32 },
}

/// Charge sequence state. At most one is active per plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeSequence {
    Idle,
    Up,
    Down,
}

/// Result of one step of a resumable sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

/// Edge-triggered events, drained by the owner after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthEvent {
    /// Reached max growth (once per growth cycle)
    Ready,
    ChargingUp,
    ChargingDown,
    GlowingBeforeSeedSpawn,
    /// Charge completed: the plant released seeds
    SeedSpawned,
    /// Dull delay finished and active growth resumed
    DullEnded,
    /// Cooldown finished and a new growth cycle began
    Regrowing,
}

/// Growth state machine for one plant.
#[derive(Debug, Clone)]
pub struct GrowthSimulator {
    config: GrowthConfig,
    growth: f32,
    state: GrowthState,
    charge: f32,
    charge_sequence: ChargeSequence,
    ready_raised: bool,
    events: Vec<GrowthEvent>,
}

impl GrowthSimulator {
    pub fn new(config: GrowthConfig) -> Self {
        Self {
            growth: config.min_growth,
            config,
            state: GrowthState::Inactive,
            charge: 0.0,
            charge_sequence: ChargeSequence::Idle,
            ready_raised: false,
            events: Vec::new(),
        }
    }

    pub fn growth(&self) -> f32 {
        self.growth
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    pub fn charge_sequence(&self) -> ChargeSequence {
        self.charge_sequence
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn is_fully_grown(&self) -> bool {
        matches!(self.state, GrowthState::FullyGrown | GrowthState::Charging)
    }

    /// Begin a fresh growth cycle at minimum growth.
    pub fn start_growing(&mut self) {
        self.reset_charge();
        self.growth = self.config.min_growth;
        self.ready_raised = false;
        self.state = GrowthState::Growing;
    }

    /// Resume from a persisted growth value, catching up on time spent offline.
    ///
    /// A missing or negative duration counts as no time passed. The result
    /// depends only on the arguments, so repeated calls are idempotent.
    pub fn resume_growing(
        &mut self,
        last_growth: f32,
        elapsed_offline_seconds: Option<f64>,
        ctx: &GrowthContext,
    ) {
        self.reset_charge();
        let elapsed = elapsed_offline_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(0.0);

        self.growth = self.offline_growth(last_growth, elapsed, ctx.away_multiplier);
        self.ready_raised = false;
        self.state = if elapsed >= self.config.dull_threshold_seconds {
            GrowthState::Dull {
                remaining: self.config.dull_duration_seconds,
            }
        } else {
            GrowthState::Growing
        };
    }

    /// Growth after `elapsed` offline seconds, clamped to the growth range.
    pub fn offline_growth(&self, last_growth: f32, elapsed: f64, away_multiplier: f32) -> f32 {
        let life_span = self.config.life_span_seconds.max(f64::EPSILON);
        let delta = (elapsed / life_span) * away_multiplier as f64;
        let grown = (last_growth as f64 + delta).min(self.config.max_growth as f64) as f32;
        self.snap(grown.max(self.config.min_growth))
    }

    /// Advance both sequences by one tick.
    pub fn tick(&mut self, ctx: &GrowthContext) {
        self.step_growth(ctx);

        let dt = ctx.tick_interval;
        match self.charge_sequence {
            ChargeSequence::Idle => {}
            ChargeSequence::Up => {
                if self.charge_for_harvest(dt) == Step::Done {
                    self.charge_sequence = ChargeSequence::Idle;
                }
            }
            ChargeSequence::Down => {
                if self.cancel_charge(dt) == Step::Done {
                    self.charge_sequence = ChargeSequence::Idle;
                }
            }
        }
    }

    /// Request charging. Returns false (no-op) while a charge is already
    /// running or the plant is not fully grown.
    pub fn begin_charge(&mut self) -> bool {
        if self.charge_sequence == ChargeSequence::Up || !self.is_fully_grown() {
            return false;
        }
        self.charge_sequence = ChargeSequence::Up;
        self.state = GrowthState::Charging;
        self.events.push(GrowthEvent::ChargingUp);
        true
    }

    /// Stop charging; the accumulated charge decays over later ticks.
    pub fn end_charge(&mut self) {
        if self.charge_sequence != ChargeSequence::Up {
            return;
        }
        self.charge_sequence = ChargeSequence::Down;
        if self.state == GrowthState::Charging {
            self.state = GrowthState::FullyGrown;
        }
        self.events.push(GrowthEvent::ChargingDown);
    }

    /// Charge step: accumulates `charge_speed * dt`. Completing the charge
    /// releases seeds and enters cooldown.
    pub fn charge_for_harvest(&mut self, dt: f32) -> Step {
        if !self.is_fully_grown() {
            return Step::Done;
        }
        self.state = GrowthState::Charging;
        self.charge = (self.charge + self.config.charge_speed * dt).clamp(0.0, 1.0);
        if self.charge < 1.0 {
            return Step::Continue;
        }

        self.events.push(GrowthEvent::GlowingBeforeSeedSpawn);
        self.events.push(GrowthEvent::SeedSpawned);
        self.charge = 0.0;
        self.state = GrowthState::Cooldown {
            remaining: self.config.harvest_cooldown_seconds,
        };
        Step::Done
    }

    /// Decay step: lowers the charge by `cancel_charge_speed * dt`.
    pub fn cancel_charge(&mut self, dt: f32) -> Step {
        if self.charge <= 0.0 {
            self.charge = 0.0;
            return Step::Done;
        }
        self.charge = (self.charge - self.config.cancel_charge_speed * dt).clamp(0.0, 1.0);
        if self.charge <= 0.0 {
            Step::Done
        } else {
            Step::Continue
        }
    }

    /// Make both sequences inert. Used when the owning entity goes away.
    pub fn cancel(&mut self) {
        self.reset_charge();
        self.state = GrowthState::Inactive;
    }

    /// Take all events raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<GrowthEvent> {
        std::mem::take(&mut self.events)
    }

    fn step_growth(&mut self, ctx: &GrowthContext) -> Step {
        match self.state {
            GrowthState::Inactive => Step::Done,
            GrowthState::FullyGrown | GrowthState::Charging => Step::Continue,
            GrowthState::Dull { remaining } => {
                let remaining = remaining - ctx.tick_interval;
                if remaining <= 0.0 {
                    self.state = GrowthState::Growing;
                    self.events.push(GrowthEvent::DullEnded);
                    // Already-complete catch-up still needs its ready edge
                    self.check_fully_grown();
                } else {
                    self.state = GrowthState::Dull { remaining };
                }
                Step::Continue
            }
            GrowthState::Growing => {
                let life_span = self.config.life_span_seconds.max(f64::EPSILON) as f32;
                let increment = (ctx.tick_interval / life_span) * ctx.speed_multiplier.max(0.0);
                let grown = (self.growth + increment).clamp(self.config.min_growth, self.config.max_growth);
                self.growth = self.snap(grown);
                self.check_fully_grown();
                Step::Continue
            }
            GrowthState::Cooldown { remaining } => {
                let remaining = remaining - ctx.tick_interval;
                if remaining <= 0.0 {
                    self.start_growing();
                    self.events.push(GrowthEvent::Regrowing);
                } else {
                    self.state = GrowthState::Cooldown { remaining };
                }
                Step::Continue
            }
        }
    }

    fn check_fully_grown(&mut self) {
        if self.growth >= self.config.max_growth {
            self.state = GrowthState::FullyGrown;
            if !self.ready_raised {
                self.ready_raised = true;
                self.events.push(GrowthEvent::Ready);
            }
        }
    }

    fn snap(&self, growth: f32) -> f32 {
        if (self.config.max_growth - growth).abs() < GROWTH_EPSILON {
            self.config.max_growth
        } else {
            growth
        }
    }

    fn reset_charge(&mut self) {
        self.charge = 0.0;
        self.charge_sequence = ChargeSequence::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GrowthConfig {
        GrowthConfig {
            life_span_seconds: 5.0,
            min_growth: 0.0,
            max_growth: 1.0,
            dull_threshold_seconds: 3600.0,
            dull_duration_seconds: 0.5,
            charge_speed: 1.0,
            cancel_charge_speed: 2.0,
            harvest_cooldown_seconds: 1.0,
        }
    }

    fn ctx() -> GrowthContext {
        GrowthContext {
            speed_multiplier: 1.0,
            tick_interval: 0.1,
            away_multiplier: 0.25,
        }
    }

    fn grow_to_full(sim: &mut GrowthSimulator) {
        sim.start_growing();
        for _ in 0..50 {
            sim.tick(&ctx());
        }
        sim.drain_events();
    }

    #[test]
    fn fifty_ticks_reach_max_with_one_ready() {
        let mut sim = GrowthSimulator::new(config());
        sim.start_growing();
        assert_eq!(sim.growth(), 0.0);

        let mut events = Vec::new();
        for _ in 0..50 {
            sim.tick(&ctx());
            events.extend(sim.drain_events());
        }
        assert_eq!(sim.growth(), 1.0);
        assert_eq!(sim.state(), GrowthState::FullyGrown);

        // Ready stays edge-triggered
        for _ in 0..20 {
            sim.tick(&ctx());
            events.extend(sim.drain_events());
        }
        let ready = events.iter().filter(|e| **e == GrowthEvent::Ready).count();
        assert_eq!(ready, 1);
    }

    #[test]
    fn growth_is_monotonic_and_bounded() {
        let mut sim = GrowthSimulator::new(config());
        sim.start_growing();
        let mut last = sim.growth();
        for i in 0..200 {
            let c = GrowthContext {
                speed_multiplier: (i % 4) as f32,
                ..ctx()
            };
            sim.tick(&c);
            assert!(sim.growth() >= last);
            assert!(sim.growth() <= 1.0 && sim.growth() >= 0.0);
            last = sim.growth();
        }
    }

    #[test]
    fn speed_multiplier_scales_increment() {
        let mut sim = GrowthSimulator::new(config());
        sim.start_growing();
        let fast = GrowthContext {
            speed_multiplier: 2.0,
            ..ctx()
        };
        sim.tick(&fast);
        assert!((sim.growth() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn resume_is_pure_in_its_inputs() {
        let mut sim = GrowthSimulator::new(config());
        sim.resume_growing(0.4, Some(1.0), &ctx());
        let first = sim.growth();
        sim.resume_growing(0.4, Some(1.0), &ctx());
        assert_eq!(sim.growth(), first);
        assert!((first - 0.45).abs() < 1e-6);
    }

    #[test]
    fn resume_clamps_at_max_and_goes_dull_after_long_absence() {
        let mut sim = GrowthSimulator::new(config());
        sim.resume_growing(0.4, Some(7200.0), &ctx());
        assert_eq!(sim.growth(), 1.0);
        assert!(matches!(sim.state(), GrowthState::Dull { .. }));

        for _ in 0..6 {
            sim.tick(&ctx());
        }
        let events = sim.drain_events();
        assert!(events.contains(&GrowthEvent::DullEnded));
        assert!(events.contains(&GrowthEvent::Ready));
        assert_eq!(sim.state(), GrowthState::FullyGrown);
    }

    #[test]
    fn negative_or_missing_elapsed_is_fresh_resume() {
        let mut sim = GrowthSimulator::new(config());
        sim.resume_growing(0.3, Some(-50.0), &ctx());
        assert_eq!(sim.growth(), 0.3);
        assert_eq!(sim.state(), GrowthState::Growing);

        sim.resume_growing(0.3, None, &ctx());
        assert_eq!(sim.growth(), 0.3);
    }

    #[test]
    fn charge_only_from_fully_grown() {
        let mut sim = GrowthSimulator::new(config());
        sim.start_growing();
        assert!(!sim.begin_charge());

        grow_to_full(&mut sim);
        assert!(sim.begin_charge());
        // Second request is a no-op while the first is running
        assert!(!sim.begin_charge());
        assert_eq!(sim.drain_events(), vec![GrowthEvent::ChargingUp]);
    }

    #[test]
    fn full_charge_spawns_seeds_then_regrows_after_cooldown() {
        let mut sim = GrowthSimulator::new(config());
        grow_to_full(&mut sim);
        sim.begin_charge();

        let mut events = Vec::new();
        for _ in 0..12 {
            sim.tick(&ctx());
            events.extend(sim.drain_events());
        }
        assert!(events.contains(&GrowthEvent::GlowingBeforeSeedSpawn));
        assert!(events.contains(&GrowthEvent::SeedSpawned));
        assert!(matches!(sim.state(), GrowthState::Cooldown { .. }));
        assert_eq!(sim.charge_sequence(), ChargeSequence::Idle);

        for _ in 0..11 {
            sim.tick(&ctx());
            events.extend(sim.drain_events());
        }
        assert!(events.contains(&GrowthEvent::Regrowing));
        assert_eq!(sim.state(), GrowthState::Growing);
        assert!(sim.growth() < 0.1);
    }

    #[test]
    fn cancelled_charge_decays_to_zero() {
        let mut sim = GrowthSimulator::new(config());
        grow_to_full(&mut sim);
        sim.begin_charge();
        for _ in 0..5 {
            sim.tick(&ctx());
        }
        assert!((sim.charge() - 0.5).abs() < 1e-5);

        sim.end_charge();
        assert_eq!(sim.state(), GrowthState::FullyGrown);
        for _ in 0..3 {
            sim.tick(&ctx());
        }
        assert_eq!(sim.charge(), 0.0);
        assert_eq!(sim.charge_sequence(), ChargeSequence::Idle);
        // From zero with nothing active, decay is a no-op
        assert_eq!(sim.cancel_charge(0.1), Step::Done);
    }

    #[test]
    fn cancel_makes_sequences_inert() {
        let mut sim = GrowthSimulator::new(config());
        grow_to_full(&mut sim);
        sim.begin_charge();
        sim.cancel();
        let growth = sim.growth();
        for _ in 0..20 {
            sim.tick(&ctx());
        }
        assert_eq!(sim.state(), GrowthState::Inactive);
        assert_eq!(sim.growth(), growth);
        assert_eq!(sim.charge(), 0.0);
    }
}
