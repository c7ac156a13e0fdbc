//! Trial runner
//!
//! Repeats trials of one profile until the stop signal is raised. Each
//! trial streams its rows into the store placeholder, which is renamed to
//! the permanent identifier (or discarded) when the trial is classified.
//! Melt recovery always runs to completion before the next trial.

use core::fmt::Write;

use heapless::String;

use super::artifact::{artifact_id, parse_repeat};
use super::record::{LogRow, TrialRecord};
use crate::config::{ConfigError, ExperimentConfig};
use crate::experiment::{Outcome, PhaseMachine, Sample};
use crate::profile::Profile;
use crate::safety::{SafetyMonitor, SensorFault};
use crate::stage::Stage;
use crate::traits::{
    ActuatorError, ArtifactStore, OpticalSensor, StatusDisplay, StopSignal, StoreError,
    TemperatureSensor, ThermalActuator, Ticker, DISPLAY_COLUMNS,
};

/// Fatal run errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError {
    /// A sensor stayed unreadable past the hold budget
    Sensor(SensorFault),
    /// Stage hardware failed
    Actuator(ActuatorError),
    /// Log storage failed
    Store(StoreError),
    /// Configuration or profile rejected
    Config(ConfigError),
}

impl From<SensorFault> for RunError {
    fn from(e: SensorFault) -> Self {
        RunError::Sensor(e)
    }
}

impl From<ActuatorError> for RunError {
    fn from(e: ActuatorError) -> Self {
        RunError::Actuator(e)
    }
}

impl From<StoreError> for RunError {
    fn from(e: StoreError) -> Self {
        RunError::Store(e)
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

/// Hardware collaborators of the apparatus
pub struct Apparatus<P, S, O, A, D> {
    /// Stage temperature sensor
    pub primary: P,
    /// Optional in-sample calibration probe
    pub secondary: Option<S>,
    /// Light dependent resistor
    pub optical: O,
    /// Peltier stage
    pub actuator: A,
    /// Status display
    pub display: D,
}

/// Outcome counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunSummary {
    pub trials: u32,
    pub frozen: u32,
    pub liquid: u32,
    pub early: u32,
    pub aborted: u32,
    /// Repeat number of the last trial run
    pub last_repeat: Option<u32>,
}

impl RunSummary {
    fn record(&mut self, record: &TrialRecord) {
        self.trials += 1;
        self.last_repeat = Some(record.repeat());
        match record.outcome() {
            Some(Outcome::Frozen) => self.frozen += 1,
            Some(Outcome::Liquid) => self.liquid += 1,
            Some(Outcome::Early) => self.early += 1,
            Some(Outcome::Aborted) | None => self.aborted += 1,
        }
    }
}

/// Drives trials on one apparatus
pub struct TrialRunner<P, S, O, A, D, St, T> {
    config: ExperimentConfig,
    primary: P,
    secondary: Option<S>,
    optical: O,
    stage: Stage<A>,
    display: D,
    store: St,
    ticker: T,
}

impl<P, S, O, A, D, St, T> TrialRunner<P, S, O, A, D, St, T>
where
    P: TemperatureSensor,
    S: TemperatureSensor,
    O: OpticalSensor,
    A: ThermalActuator,
    D: StatusDisplay,
    St: ArtifactStore,
    T: Ticker,
{
    /// Validate the configuration and switch the stage off
    pub fn new(
        config: ExperimentConfig,
        apparatus: Apparatus<P, S, O, A, D>,
        store: St,
        ticker: T,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let stage = Stage::new(apparatus.actuator)?;
        Ok(Self {
            config,
            primary: apparatus.primary,
            secondary: apparatus.secondary,
            optical: apparatus.optical,
            stage,
            display: apparatus.display,
            store,
            ticker,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage<A> {
        &self.stage
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// One past the highest repeat number already in the store
    ///
    /// The placeholder and unparseable names are ignored; an empty store
    /// starts at 1.
    pub fn next_repeat_number(&mut self) -> Result<u32, RunError> {
        let mut highest: Option<u32> = None;
        self.store.visit_artifacts(&mut |name| {
            if let Some(repeat) = parse_repeat(name) {
                highest = Some(highest.map_or(repeat, |h| h.max(repeat)));
            }
        })?;
        Ok(highest.map_or(1, |h| h.saturating_add(1)))
    }

    /// Run trials until `stop` is raised
    ///
    /// The stop signal is polled after each trial, so a trial is never cut
    /// short. Any error switches the stage off and ends the run.
    pub fn run<X: StopSignal>(
        &mut self,
        profile: Profile,
        stop: &mut X,
    ) -> Result<RunSummary, RunError> {
        profile.validate(&self.config.thresholds)?;
        let mut repeat = self.next_repeat_number()?;
        let mut summary = RunSummary::default();
        info!(
            "run: {} {} starting at repeat {}",
            profile.kind().as_str(),
            profile.parameter(),
            repeat
        );

        loop {
            let record = self.run_trial(profile, repeat)?;
            summary.record(&record);
            repeat = repeat.saturating_add(1);

            if stop.stop_requested() {
                break;
            }
        }

        info!(
            "run: {} trials ({} frozen, {} liquid, {} early, {} aborted)",
            summary.trials,
            summary.frozen,
            summary.liquid,
            summary.early,
            summary.aborted
        );
        Ok(summary)
    }

    /// Run a single trial, including melt recovery
    pub fn run_trial(&mut self, profile: Profile, repeat: u32) -> Result<TrialRecord, RunError> {
        let result = self.trial(profile, repeat);
        if result.is_err() {
            if let Err(e) = self.stage.switch_off() {
                error!("runner: switch off failed: {:?}", e);
            }
        }
        result
    }

    fn trial(&mut self, profile: Profile, repeat: u32) -> Result<TrialRecord, RunError> {
        let mut machine = PhaseMachine::new(&self.config, profile);
        let mut safety = SafetyMonitor::new();
        let mut record = TrialRecord::new(repeat, &profile);

        let mut banner: String<DISPLAY_COLUMNS> = String::new();
        let _ = write!(banner, "{} {}", profile.kind().banner(), repeat);
        if let Err(e) = self.display.show_banner(&banner) {
            warn!("display: banner failed: {:?}", e);
        }

        self.store.begin()?;
        let start_ms = self.ticker.now_ms();
        let baseline = safety.optical(self.optical.read_intensity())?;
        let step = machine.start(baseline);
        self.stage.apply(step.command)?;

        loop {
            self.ticker.wait();
            let elapsed_ms = self.ticker.now_ms().wrapping_sub(start_ms);
            let sample = self.read_sample(&mut safety, elapsed_ms)?;

            // Rows carry the phase the reading was taken in
            let label = machine.label();
            let logging = machine.phase().is_cooling();
            let step = machine.step(&sample);

            if logging {
                let row = LogRow {
                    elapsed_ms,
                    primary: sample.primary,
                    secondary: sample.secondary,
                    optical: sample.optical,
                    label,
                };
                self.store.append(&row)?;
                record.push(row);
                trace!("row: {} {} {} {}", elapsed_ms, sample.primary, sample.optical, label);
            }

            self.stage.apply(step.command)?;
            self.show_status(machine.label(), sample.primary, elapsed_ms);

            if let Some(conclusion) = step.conclusion {
                if record.finalize(conclusion).is_ok() {
                    if conclusion.outcome.keeps_log() {
                        let id = artifact_id(
                            repeat,
                            record.kind(),
                            record.parameter(),
                            conclusion.outcome,
                            conclusion.metric,
                        )?;
                        self.store.finalize(&id)?;
                        info!("trial {}: saved {}", repeat, id.as_str());
                    } else {
                        self.store.discard()?;
                        warn!(
                            "trial {}: aborted at {} C, log discarded",
                            repeat,
                            conclusion.final_temperature
                        );
                    }
                }
            }

            if step.finished {
                break;
            }
        }

        self.stage.switch_off()?;
        Ok(record)
    }

    fn read_sample(
        &mut self,
        safety: &mut SafetyMonitor,
        elapsed_ms: u32,
    ) -> Result<Sample, RunError> {
        let primary = safety.primary(self.primary.read_celsius())?;
        let secondary = safety.secondary(self.secondary.as_mut().map(|s| s.read_celsius()));
        let optical = safety.optical(self.optical.read_intensity())?;
        Ok(Sample {
            elapsed_ms,
            primary,
            secondary,
            optical,
        })
    }

    fn show_status(&mut self, label: &str, temperature: f32, elapsed_ms: u32) {
        let mut line: String<32> = String::new();
        let _ = write!(line, "{} {:5.1} {:5}", label, temperature, elapsed_ms / 1000);
        if let Err(e) = self.display.show_status(&line) {
            warn!("display: status failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::PLACEHOLDER;
    use crate::traits::{CurrentDirection, DisplayError, NeverStop, NoSensor, SensorError, StopAfter};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::string::{String as StdString, ToString};
    use std::vec::Vec;

    const TICK_MS: u32 = 200;

    /// Crude stage model advanced by the ticker
    struct Plant {
        now_ms: u32,
        temperature: f32,
        direction: CurrentDirection,
        duty: u8,
        /// Sample turns opaque at this time, if below 0 °C
        freeze_at_ms: Option<u32>,
        frozen: bool,
        /// Primary read failures, by tick number
        fail_ticks: Vec<u32>,
        hot_switches: u32,
        /// Relays refuse to switch to heating
        fail_heat: bool,
    }

    impl Plant {
        fn new(freeze_at_ms: Option<u32>) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                now_ms: 0,
                temperature: 20.0,
                direction: CurrentDirection::Cool,
                duty: 0,
                freeze_at_ms,
                frozen: false,
                fail_ticks: Vec::new(),
                hot_switches: 0,
                fail_heat: false,
            }))
        }

        fn advance(&mut self) {
            self.now_ms += TICK_MS;
            let power = self.duty as f32 / 100.0;
            let drive = match self.direction {
                CurrentDirection::Cool => -1.2 * power,
                CurrentDirection::Heat => 2.0 * power,
            };
            let leak = 0.02 * (20.0 - self.temperature);
            self.temperature += drive + leak;

            match self.freeze_at_ms {
                Some(at) if self.now_ms >= at && self.temperature < 0.0 => self.frozen = true,
                _ => {}
            }
            if self.temperature > 0.0 {
                self.frozen = false;
            }
        }
    }

    struct Probe(Rc<RefCell<Plant>>);

    impl TemperatureSensor for Probe {
        fn read_celsius(&mut self) -> Result<f32, SensorError> {
            let plant = self.0.borrow();
            let tick = plant.now_ms / TICK_MS;
            if plant.fail_ticks.contains(&tick) {
                return Err(SensorError::Timeout);
            }
            Ok(plant.temperature)
        }
    }

    struct Ldr(Rc<RefCell<Plant>>);

    impl OpticalSensor for Ldr {
        fn read_intensity(&mut self) -> Result<f32, SensorError> {
            Ok(if self.0.borrow().frozen { 2000.0 } else { 3000.0 })
        }
    }

    struct Peltier(Rc<RefCell<Plant>>);

    impl ThermalActuator for Peltier {
        fn set_pwm_duty(&mut self, percent: u8) -> Result<(), ActuatorError> {
            self.0.borrow_mut().duty = percent;
            Ok(())
        }

        fn set_direction(&mut self, direction: CurrentDirection) -> Result<(), ActuatorError> {
            let mut plant = self.0.borrow_mut();
            if plant.fail_heat && direction == CurrentDirection::Heat {
                return Err(ActuatorError::Relay);
            }
            if plant.duty > 0 {
                plant.hot_switches += 1;
            }
            plant.direction = direction;
            Ok(())
        }

        fn set_assist(&mut self, _on: bool) -> Result<(), ActuatorError> {
            Ok(())
        }
    }

    struct Clock(Rc<RefCell<Plant>>);

    impl Ticker for Clock {
        fn now_ms(&mut self) -> u32 {
            self.0.borrow().now_ms
        }

        fn wait(&mut self) {
            self.0.borrow_mut().advance();
        }
    }

    #[derive(Default)]
    struct Screen {
        banners: Vec<StdString>,
        statuses: u32,
    }

    impl StatusDisplay for Screen {
        fn show_banner(&mut self, text: &str) -> Result<(), DisplayError> {
            self.banners.push(text.to_string());
            Ok(())
        }

        fn show_status(&mut self, _text: &str) -> Result<(), DisplayError> {
            self.statuses += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        artifacts: Vec<(StdString, Vec<StdString>)>,
        open: Option<Vec<StdString>>,
        discarded: u32,
        begins: u32,
        fail_append: bool,
    }

    impl ArtifactStore for MemoryStore {
        fn visit_artifacts(&mut self, visit: &mut dyn FnMut(&str)) -> Result<(), StoreError> {
            for (name, _) in &self.artifacts {
                visit(name);
            }
            if self.open.is_some() {
                visit(PLACEHOLDER);
            }
            Ok(())
        }

        fn begin(&mut self) -> Result<(), StoreError> {
            self.begins += 1;
            self.open = Some(Vec::new());
            Ok(())
        }

        fn append(&mut self, row: &LogRow) -> Result<(), StoreError> {
            if self.fail_append {
                return Err(StoreError::Io);
            }
            self.open
                .as_mut()
                .ok_or(StoreError::NotOpen)?
                .push(row.to_string());
            Ok(())
        }

        fn finalize(&mut self, identifier: &str) -> Result<(), StoreError> {
            let rows = self.open.take().ok_or(StoreError::NotOpen)?;
            self.artifacts.push((identifier.to_string(), rows));
            Ok(())
        }

        fn discard(&mut self) -> Result<(), StoreError> {
            self.open.take().ok_or(StoreError::NotOpen)?;
            self.discarded += 1;
            Ok(())
        }
    }

    type Runner = TrialRunner<Probe, NoSensor, Ldr, Peltier, Screen, MemoryStore, Clock>;

    fn quick_config() -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.timing.melt_soak_ms = 1_000;
        config
    }

    fn runner(plant: &Rc<RefCell<Plant>>, config: ExperimentConfig, store: MemoryStore) -> Runner {
        let apparatus = Apparatus {
            primary: Probe(plant.clone()),
            secondary: None,
            optical: Ldr(plant.clone()),
            actuator: Peltier(plant.clone()),
            display: Screen::default(),
        };
        TrialRunner::new(config, apparatus, store, Clock(plant.clone())).unwrap()
    }

    #[test]
    fn test_isothermal_trial_freezes_and_melts() {
        let plant = Plant::new(Some(60_000));
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());

        let record = runner
            .run_trial(Profile::Isothermal { setpoint: -15.0 }, 1)
            .unwrap();
        assert_eq!(record.outcome(), Some(Outcome::Frozen));

        let store = runner.store();
        assert_eq!(store.artifacts.len(), 1);
        let (name, rows) = &store.artifacts[0];
        assert!(name.starts_with("1_isothermal-15.0_frozen_"), "{}", name);
        assert_eq!(rows.len() as u32, record.rows());
        assert!(rows.iter().any(|r| r.ends_with(",Hold")));
        assert!(store.open.is_none());

        // Melt recovery ran and left the stage off
        assert!(plant.borrow().temperature > 15.0 - 2.0);
        assert_eq!(runner.stage().duty(), 0);
        assert_eq!(runner.stage().relays(), CurrentDirection::Cool);
        assert_eq!(plant.borrow().hot_switches, 0);
        assert_eq!(runner.display().banners[0], "Isothermal 1");
    }

    #[test]
    fn test_liquid_when_nothing_freezes() {
        let plant = Plant::new(None);
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        let record = runner
            .run_trial(Profile::Isothermal { setpoint: -10.0 }, 4)
            .unwrap();
        assert_eq!(record.outcome(), Some(Outcome::Liquid));
        assert!(runner.store().artifacts[0].0.starts_with("4_isothermal-10.0_liquid_"));
    }

    #[test]
    fn test_run_numbers_after_existing_artifacts() {
        let mut store = MemoryStore::default();
        for name in ["1_isothermal-15.0_frozen_1000", "2_isothermal-15.0_frozen_2000", "4_isothermal-15.0_liquid_3000"] {
            store.artifacts.push((name.to_string(), Vec::new()));
        }
        let plant = Plant::new(Some(30_000));
        let mut runner = runner(&plant, quick_config(), store);
        assert_eq!(runner.next_repeat_number().unwrap(), 5);

        let summary = runner
            .run(Profile::Isothermal { setpoint: -15.0 }, &mut StopAfter::new(2))
            .unwrap();
        assert_eq!(summary.trials, 2);
        assert_eq!(summary.last_repeat, Some(6));
        let names: Vec<&str> = runner.store().artifacts.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names[3].starts_with("5_"));
        assert!(names[4].starts_with("6_"));
    }

    #[test]
    fn test_stop_after_one_runs_one_trial() {
        let plant = Plant::new(Some(30_000));
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        let summary = runner
            .run(Profile::Isothermal { setpoint: -15.0 }, &mut StopAfter::new(1))
            .unwrap();
        assert_eq!(summary.trials, 1);
        assert_eq!(summary.last_repeat, Some(1));
        assert_eq!(runner.store().begins, 1);
        assert_eq!(runner.store().artifacts.len(), 1);
    }

    #[test]
    fn test_store_failure_is_fatal() {
        let plant = Plant::new(Some(30_000));
        let store = MemoryStore {
            fail_append: true,
            ..MemoryStore::default()
        };
        let mut runner = runner(&plant, quick_config(), store);
        let err = runner
            .run(Profile::Isothermal { setpoint: -15.0 }, &mut NeverStop)
            .unwrap_err();
        assert_eq!(err, RunError::Store(StoreError::Io));
        assert_eq!(runner.stage().duty(), 0);
        assert_eq!(plant.borrow().duty, 0);

        // The run ends with the failing trial
        assert_eq!(runner.store().begins, 1);
        assert!(runner.store().artifacts.is_empty());
    }

    #[test]
    fn test_actuator_failure_is_fatal() {
        let plant = Plant::new(Some(30_000));
        plant.borrow_mut().fail_heat = true;
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        let err = runner
            .run(Profile::Isothermal { setpoint: -15.0 }, &mut NeverStop)
            .unwrap_err();
        assert_eq!(err, RunError::Actuator(ActuatorError::Relay));
        assert_eq!(runner.stage().duty(), 0);
        assert_eq!(runner.stage().relays(), CurrentDirection::Cool);
        assert_eq!(plant.borrow().duty, 0);
        assert_eq!(plant.borrow().hot_switches, 0);

        // Melt recovery could not start, so no second trial began
        assert_eq!(runner.store().begins, 1);
    }

    #[test]
    fn test_empty_store_starts_at_one() {
        let plant = Plant::new(None);
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        assert_eq!(runner.next_repeat_number().unwrap(), 1);
    }

    #[test]
    fn test_single_sensor_miss_is_bridged() {
        let plant = Plant::new(Some(30_000));
        plant.borrow_mut().fail_ticks.push(10);
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        let record = runner
            .run_trial(Profile::Isothermal { setpoint: -15.0 }, 1)
            .unwrap();
        assert!(record.is_finalized());
    }

    #[test]
    fn test_two_sensor_misses_are_fatal() {
        let plant = Plant::new(None);
        plant.borrow_mut().fail_ticks.extend([10, 11]);
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        let err = runner
            .run_trial(Profile::Isothermal { setpoint: -15.0 }, 1)
            .unwrap_err();
        assert!(matches!(err, RunError::Sensor(_)));
        assert_eq!(runner.stage().duty(), 0);
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let plant = Plant::new(None);
        let mut runner = runner(&plant, quick_config(), MemoryStore::default());
        let err = runner
            .run(Profile::Linear { rate: 1.0 }, &mut StopAfter::new(0))
            .unwrap_err();
        assert_eq!(err, RunError::Config(ConfigError::InvalidProfile));
    }
}
