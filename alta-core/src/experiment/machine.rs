//! Phase machine for one trial
//!
//! One machine handles both profiles. The profile only decides how the
//! fast cool ends, what the control target is and how the trial is
//! classified.

use super::classify::{classify, Conclusion};
use super::context::{PhaseContext, Sample};
use crate::config::{ExperimentConfig, ThresholdConfig, TimingConfig};
use crate::control::{ControlLaw, ControlOutput};
use crate::detect::FreezeDetector;
use crate::profile::Profile;
use crate::safety::WarmFaultGuard;
use crate::stage::ActuatorCommand;
use crate::state::{Phase, PhaseEvent};

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Command to apply to the stage this tick
    pub command: ActuatorCommand,
    /// `(from, to)` if the phase changed this tick
    pub transition: Option<(Phase, Phase)>,
    /// Control law output, on ticks where the law ran
    pub control: Option<ControlOutput>,
    /// Set on the tick the cooling part of the trial ended
    pub conclusion: Option<Conclusion>,
    /// Set once melt recovery is complete
    pub finished: bool,
}

impl Step {
    fn hold(command: ActuatorCommand) -> Self {
        Self {
            command,
            transition: None,
            control: None,
            conclusion: None,
            finished: false,
        }
    }
}

/// Trial phase machine
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    profile: Profile,
    thresholds: ThresholdConfig,
    timing: TimingConfig,
    law: ControlLaw,
    detector: FreezeDetector,
    warm: WarmFaultGuard,
    context: PhaseContext,
    conclusion: Option<Conclusion>,
}

impl PhaseMachine {
    /// Build a machine for one trial
    ///
    /// The feed-forward offset and overshoot margin are evaluated once here.
    pub fn new(config: &ExperimentConfig, profile: Profile) -> Self {
        let thresholds = config.thresholds;
        let setpoint = profile.feed_forward_point(&thresholds);
        let feed_forward = config.feed_forward.evaluate(setpoint);
        let margin = match profile {
            Profile::Isothermal { setpoint } => config.overshoot.margin(setpoint),
            Profile::Linear { .. } => 0.0,
        };

        Self {
            profile,
            thresholds,
            timing: config.timing,
            law: ControlLaw::new(
                config.controller,
                config.timing.delta_t(),
                setpoint,
                feed_forward,
            ),
            detector: FreezeDetector::new(&config.detector),
            warm: WarmFaultGuard::new(&thresholds),
            context: PhaseContext::new(0.0, margin),
            conclusion: None,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn phase(&self) -> Phase {
        self.context.phase
    }

    pub fn context(&self) -> &PhaseContext {
        &self.context
    }

    /// Label for logs and display
    pub fn label(&self) -> &'static str {
        self.context.label()
    }

    pub fn law(&self) -> &ControlLaw {
        &self.law
    }

    /// Conclusion of the trial, once the cooling part has ended
    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    /// Start the trial: capture the clear baseline and begin the fast cool
    pub fn start(&mut self, clear_baseline: f32) -> Step {
        self.context = PhaseContext::new(clear_baseline, self.context.overshoot_margin);
        self.conclusion = None;
        self.detector.begin_trial(clear_baseline);
        self.law.reset();

        let from = self.context.phase;
        self.context.phase = from.transition(PhaseEvent::Start);
        info!(
            "phase: {} -> {} (baseline {})",
            from.label(),
            self.context.phase.label(),
            clear_baseline
        );

        Step {
            transition: Some((from, self.context.phase)),
            ..Step::hold(ActuatorCommand::cool(100))
        }
    }

    /// Run one tick
    pub fn step(&mut self, sample: &Sample) -> Step {
        self.context.elapsed_ms = sample.elapsed_ms;

        match self.context.phase {
            Phase::Idle => Step {
                finished: true,
                ..Step::hold(ActuatorCommand::idle())
            },
            Phase::FastCool | Phase::Approaching | Phase::ActiveHold | Phase::Ramp => {
                self.step_cooling(sample)
            }
            Phase::Frozen => {
                // Outputs were off for the detection tick; start melting
                let transition = self.apply(PhaseEvent::Recover);
                Step {
                    transition,
                    ..Step::hold(ActuatorCommand::heat(100))
                }
            }
            Phase::MeltRecovery => self.step_melt(sample),
        }
    }

    fn step_cooling(&mut self, sample: &Sample) -> Step {
        let phase = self.context.phase;
        let t = sample.primary;

        let event = if self.detector.observe(phase, t, sample.optical) {
            Some(PhaseEvent::FreezeDetected)
        } else if self.warm.during_control(phase, t) {
            Some(PhaseEvent::WarmFault)
        } else if self.timed_out() {
            Some(PhaseEvent::TimedOut)
        } else {
            self.progress_event(phase, t)
        };

        if let Some(event) = event {
            if event.is_terminal() {
                return self.conclude(event, t);
            }
            let transition = self.apply(event);
            if self.context.phase.is_controlled() {
                // Fresh integral for the new target; the law first runs next tick
                self.law.reset();
                self.context.hold_start_ms = Some(sample.elapsed_ms);
                if let Profile::Linear { .. } = self.profile {
                    self.law.set_setpoint(self.thresholds.ramp_start);
                }
            }
            return Step {
                transition,
                ..Step::hold(ActuatorCommand::cool(100))
            };
        }

        match phase {
            Phase::ActiveHold | Phase::Ramp => {
                let target = self
                    .profile
                    .target_at(self.thresholds.ramp_start, self.context.since_hold_ms());
                self.law.set_setpoint(target);
                let output = self.law.update(t);
                Step {
                    control: Some(output),
                    ..Step::hold(ActuatorCommand::cool(output.duty))
                }
            }
            _ => Step::hold(ActuatorCommand::cool(100)),
        }
    }

    /// Non-terminal progress through the cooling phases
    fn progress_event(&self, phase: Phase, t: f32) -> Option<PhaseEvent> {
        match (phase, self.profile) {
            (Phase::FastCool, Profile::Isothermal { .. }) if t < self.thresholds.cold => {
                Some(PhaseEvent::ColdReached)
            }
            (Phase::FastCool, Profile::Linear { .. }) if t < self.thresholds.ramp_start => {
                Some(PhaseEvent::RampStartReached)
            }
            (Phase::Approaching, Profile::Isothermal { setpoint })
                if t < setpoint - self.context.overshoot_margin =>
            {
                Some(PhaseEvent::HoldReached)
            }
            (Phase::Ramp, _) if t <= self.thresholds.ramp_floor => {
                Some(PhaseEvent::RampFloorReached)
            }
            _ => None,
        }
    }

    /// Isothermal trials time out `max_wait` after the trial started; linear
    /// ramps get the expected ramp duration on top, counted from ramp entry
    fn timed_out(&self) -> bool {
        let max_wait = self.timing.max_wait_ms;
        match (self.profile, self.context.hold_start_ms) {
            (Profile::Linear { .. }, Some(_)) => {
                let limit = self
                    .profile
                    .ramp_duration_ms(&self.thresholds)
                    .saturating_add(max_wait);
                self.context.since_hold_ms() >= limit
            }
            _ => self.context.elapsed_ms >= max_wait,
        }
    }

    fn conclude(&mut self, event: PhaseEvent, t: f32) -> Step {
        let conclusion = classify(self.profile.kind(), event, &self.context, t, &self.warm);
        let transition = self.apply(event);
        self.context.timed_out = event == PhaseEvent::TimedOut;
        info!(
            "trial: {:?} ({:?}) at {} ms, {} C",
            conclusion.outcome,
            event,
            self.context.elapsed_ms,
            t
        );
        self.conclusion = Some(conclusion);
        Step {
            transition,
            conclusion: Some(conclusion),
            ..Step::hold(ActuatorCommand::idle())
        }
    }

    fn step_melt(&mut self, sample: &Sample) -> Step {
        self.context.timed_out = false;
        match self.context.melted_at_ms {
            None if sample.primary > self.thresholds.melt => {
                debug!("melt: reached {} C, soaking", sample.primary);
                self.context.melted_at_ms = Some(sample.elapsed_ms);
                Step::hold(ActuatorCommand::idle())
            }
            None => Step::hold(ActuatorCommand::heat(100)),
            Some(at) if sample.elapsed_ms.saturating_sub(at) >= self.timing.melt_soak_ms => {
                let transition = self.apply(PhaseEvent::SoakComplete);
                Step {
                    transition,
                    finished: true,
                    ..Step::hold(ActuatorCommand::idle())
                }
            }
            Some(_) => Step::hold(ActuatorCommand::idle()),
        }
    }

    fn apply(&mut self, event: PhaseEvent) -> Option<(Phase, Phase)> {
        let from = self.context.phase;
        let to = from.transition(event);
        if to == from {
            return None;
        }
        self.context.phase = to;
        info!("phase: {} -> {} at {} ms", from.label(), to.label(), self.context.elapsed_ms);
        Some((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectorConfig;
    use crate::experiment::{Outcome, TerminalMetric};
    use crate::stage::Direction;

    const CLEAR: f32 = 3000.0;

    fn sample(elapsed_ms: u32, primary: f32) -> Sample {
        Sample {
            elapsed_ms,
            primary,
            secondary: None,
            optical: CLEAR,
        }
    }

    fn isothermal(setpoint: f32) -> PhaseMachine {
        let mut m = PhaseMachine::new(&ExperimentConfig::default(), Profile::Isothermal { setpoint });
        m.start(CLEAR);
        m
    }

    #[test]
    fn test_start_enters_fast_cool() {
        let mut m = PhaseMachine::new(
            &ExperimentConfig::default(),
            Profile::Isothermal { setpoint: -15.0 },
        );
        let step = m.start(CLEAR);
        assert_eq!(step.transition, Some((Phase::Idle, Phase::FastCool)));
        assert_eq!(step.command, ActuatorCommand::cool(100));
    }

    #[test]
    fn test_isothermal_transitions_and_zero_integral() {
        let mut m = isothermal(-15.0);
        assert_eq!(m.context().overshoot_margin, 0.5);

        assert_eq!(m.step(&sample(200, 0.5)).transition, None);
        assert_eq!(
            m.step(&sample(400, -0.1)).transition,
            Some((Phase::FastCool, Phase::Approaching))
        );
        // Boundary is setpoint - margin = -15.5, strict
        assert_eq!(m.step(&sample(600, -15.5)).transition, None);

        let step = m.step(&sample(800, -15.6));
        assert_eq!(step.transition, Some((Phase::Approaching, Phase::ActiveHold)));
        assert_eq!(m.law().integral(), 0.0);
        assert_eq!(m.context().hold_start_ms, Some(800));
        assert_eq!(step.command, ActuatorCommand::cool(100));
        assert!(step.control.is_none());

        let step = m.step(&sample(1000, -15.0));
        assert!(step.control.is_some());
        assert_eq!(step.command.direction, Direction::Cool);
    }

    #[test]
    fn test_hold_at_setpoint_gives_feed_forward() {
        let mut m = isothermal(-15.0);
        m.step(&sample(200, -1.0));
        m.step(&sample(400, -16.0));
        assert_eq!(m.phase(), Phase::ActiveHold);

        let step = m.step(&sample(600, -15.0));
        // 32.913 + 24.345 + 3.15 = 60.408, truncated
        assert_eq!(step.command, ActuatorCommand::cool(60));
    }

    #[test]
    fn test_optical_freeze_during_hold() {
        let mut m = isothermal(-15.0);
        m.step(&sample(200, -1.0));
        m.step(&sample(20_000, -16.0));
        assert_eq!(m.context().hold_start_ms, Some(20_000));
        m.step(&sample(20_200, -15.0));

        let mut frozen = sample(35_000, -15.1);
        frozen.optical = 2800.0;
        let step = m.step(&frozen);
        assert_eq!(step.transition, Some((Phase::ActiveHold, Phase::Frozen)));
        assert_eq!(step.command.effective_duty(), 0);
        let conclusion = step.conclusion.unwrap();
        assert_eq!(conclusion.outcome, Outcome::Frozen);
        // Lag time counts from trial start, not from hold entry
        assert_eq!(conclusion.metric, TerminalMetric::ElapsedMs(35_000));
    }

    #[test]
    fn test_optical_freeze_while_approaching_is_early() {
        let mut m = isothermal(-15.0);
        m.step(&sample(200, -1.0));
        let mut frozen = sample(400, -9.0);
        frozen.optical = 2000.0;
        let step = m.step(&frozen);
        assert_eq!(step.conclusion.unwrap().outcome, Outcome::Early);
    }

    #[test]
    fn test_optical_drop_during_fast_cool_is_ignored() {
        let mut m = isothermal(-15.0);
        let mut dark = sample(200, 5.0);
        dark.optical = 0.0;
        let step = m.step(&dark);
        assert!(step.conclusion.is_none());
        assert_eq!(m.phase(), Phase::FastCool);
    }

    #[test]
    fn test_timeout_is_liquid() {
        let mut m = isothermal(-15.0);
        m.step(&sample(200, -1.0));
        m.step(&sample(400, -16.0));
        let step = m.step(&sample(150_000, -15.0));
        assert_eq!(step.transition, Some((Phase::ActiveHold, Phase::MeltRecovery)));
        let conclusion = step.conclusion.unwrap();
        assert_eq!(conclusion.outcome, Outcome::Liquid);
        assert_eq!(conclusion.metric, TerminalMetric::ElapsedMs(150_000));
        assert_eq!(m.label(), "Warm");

        assert_eq!(m.step(&sample(150_200, -14.0)).command, ActuatorCommand::heat(100));
        assert_eq!(m.label(), "Heat");
    }

    #[test]
    fn test_melt_recovery_heats_then_soaks() {
        let mut m = isothermal(-15.0);
        m.step(&sample(200, -1.0));
        m.step(&sample(400, -16.0));
        let mut frozen = sample(600, -15.0);
        frozen.optical = 100.0;
        m.step(&frozen);

        let step = m.step(&sample(800, -15.0));
        assert_eq!(step.transition, Some((Phase::Frozen, Phase::MeltRecovery)));
        assert_eq!(step.command, ActuatorCommand::heat(100));

        assert_eq!(m.step(&sample(1_000, 10.0)).command, ActuatorCommand::heat(100));
        assert_eq!(m.step(&sample(1_200, 15.5)).command, ActuatorCommand::idle());
        assert_eq!(m.label(), "Wait");

        assert!(!m.step(&sample(61_000, 15.0)).finished);
        let step = m.step(&sample(61_200, 15.0));
        assert!(step.finished);
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn test_warm_terminal_reading_aborts() {
        let mut m = isothermal(-5.0);
        m.step(&sample(200, -0.5));
        let mut faded = sample(400, 4.0);
        faded.optical = 0.0;
        // Approaching but warm again: the optical drop is a false freeze
        let step = m.step(&faded);
        assert_eq!(step.conclusion.unwrap().outcome, Outcome::Aborted);
    }

    #[test]
    fn test_warm_fault_during_control() {
        let mut config = ExperimentConfig::default();
        config.thresholds.warm_fault_check = crate::config::WarmFaultCheck::DuringControl;
        let mut m = PhaseMachine::new(&config, Profile::Isothermal { setpoint: -5.0 });
        m.start(CLEAR);
        m.step(&sample(200, -1.0));
        m.step(&sample(400, -6.5));
        assert_eq!(m.phase(), Phase::ActiveHold);

        let step = m.step(&sample(600, 0.5));
        assert_eq!(step.conclusion.unwrap().outcome, Outcome::Aborted);
        assert_eq!(m.phase(), Phase::MeltRecovery);
    }

    #[test]
    fn test_linear_ramp_target_and_floor() {
        let mut m = PhaseMachine::new(&ExperimentConfig::default(), Profile::Linear { rate: -1.0 });
        m.start(CLEAR);
        let step = m.step(&sample(200, -0.1));
        assert_eq!(step.transition, Some((Phase::FastCool, Phase::Ramp)));
        assert_eq!(m.law().integral(), 0.0);

        m.step(&sample(60_200, -1.0));
        assert!((m.law().setpoint() - (-1.0)).abs() < 1e-4);

        let step = m.step(&sample(1_600_000, -25.0));
        let conclusion = step.conclusion.unwrap();
        assert_eq!(conclusion.outcome, Outcome::Liquid);
        assert_eq!(conclusion.metric, TerminalMetric::ElapsedMs(1_600_000));
    }

    #[test]
    fn test_ramp_clock_starts_at_ramp_entry() {
        let mut m = PhaseMachine::new(&ExperimentConfig::default(), Profile::Linear { rate: -1.0 });
        m.start(CLEAR);
        m.step(&sample(200, 5.0));
        assert_eq!(m.phase(), Phase::FastCool);

        let step = m.step(&sample(30_000, -0.1));
        assert_eq!(step.transition, Some((Phase::FastCool, Phase::Ramp)));

        // One minute into the ramp, 1.5 minutes into the trial
        m.step(&sample(90_000, -1.0));
        assert!((m.law().setpoint() - (-1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_linear_freeze_records_temperature() {
        let mut m = PhaseMachine::new(&ExperimentConfig::default(), Profile::Linear { rate: -1.0 });
        m.start(CLEAR);
        m.step(&sample(200, -0.1));
        let mut frozen = sample(600_000, -9.5);
        frozen.optical = 1000.0;
        let conclusion = m.step(&frozen).conclusion.unwrap();
        assert_eq!(conclusion.outcome, Outcome::Frozen);
        assert_eq!(conclusion.metric, TerminalMetric::Temperature(-9.5));
    }

    #[test]
    fn test_latent_heat_detection() {
        let mut config = ExperimentConfig::default();
        config.detector = DetectorConfig::LatentHeat {
            window: 5,
            rise: 0.3,
        };
        let mut m = PhaseMachine::new(&config, Profile::Isothermal { setpoint: -10.0 });
        m.start(CLEAR);
        m.step(&sample(200, -1.0));
        m.step(&sample(400, -11.0));
        assert_eq!(m.phase(), Phase::ActiveHold);

        let mut t = 600;
        for _ in 0..5 {
            assert!(m.step(&sample(t, -10.0)).conclusion.is_none());
            t += 200;
        }
        let conclusion = m.step(&sample(t, -9.6)).conclusion.unwrap();
        assert_eq!(conclusion.outcome, Outcome::Frozen);
    }
}
