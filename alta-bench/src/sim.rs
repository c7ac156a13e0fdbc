//! Simulated stage
//!
//! Lumped two-node thermal model: the aluminium stage (primary probe) is
//! driven by the Peltier and leaks to the room; the sample (secondary
//! probe) follows the stage through a single coupling. Below 0 °C the
//! sample nucleates with a hazard that grows exponentially with
//! supercooling. Nucleation releases latent heat into the stage and turns
//! the sample opaque over a few seconds. Melting clears it again.
//!
//! All handles share one [`Plant`]; the ticker advances it.

use std::cell::RefCell;
use std::rc::Rc;

use alta_core::traits::{
    ActuatorError, CurrentDirection, OpticalSensor, SensorError, TemperatureSensor,
    ThermalActuator,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::config::SimConfig;

/// Sample clears once it is this far above 0 °C
const MELT_MARGIN: f32 = 0.5;
/// Fraction of the supercooling removed by the exotherm
const EXOTHERM_RECOVERY: f32 = 0.8;

/// Physical state of the simulated apparatus
pub struct Plant {
    config: SimConfig,
    rng: ChaCha8Rng,
    now_ms: u32,
    stage: f32,
    sample: f32,
    frozen: bool,
    opacity: f32,
    relays: CurrentDirection,
    duty: u8,
    assist: bool,
    nucleations: u32,
    hot_switches: u32,
}

impl Plant {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            now_ms: 0,
            stage: config.initial,
            sample: config.initial,
            frozen: false,
            opacity: 0.0,
            relays: CurrentDirection::Cool,
            duty: 0,
            assist: false,
            nucleations: 0,
            hot_switches: 0,
            config: config.clone(),
        }
    }

    pub fn now_ms(&self) -> u32 {
        self.now_ms
    }

    pub fn stage_temperature(&self) -> f32 {
        self.stage
    }

    pub fn sample_temperature(&self) -> f32 {
        self.sample
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn assist(&self) -> bool {
        self.assist
    }

    /// Number of freezing events so far
    pub fn nucleations(&self) -> u32 {
        self.nucleations
    }

    /// Relay switches made while the duty was non-zero
    pub fn hot_switches(&self) -> u32 {
        self.hot_switches
    }

    /// Signed Peltier power, positive heats (°C/s)
    fn drive(&self) -> f32 {
        let fraction = f32::from(self.duty) / 100.0;
        match self.relays {
            CurrentDirection::Cool => -self.config.cooling_rate * fraction,
            CurrentDirection::Heat => self.config.heating_rate * fraction,
        }
    }

    /// Integrate the model over `period_ms`
    pub fn advance(&mut self, period_ms: u32) {
        let dt = period_ms as f32 / 1000.0;
        let c = &self.config;

        let leak = c.ambient_coupling * (c.ambient - self.stage);
        let load = 0.2 * c.sample_coupling * (self.sample - self.stage);
        let stage = self.stage + dt * (self.drive() + leak + load);
        let sample = self.sample + dt * c.sample_coupling * (self.stage - self.sample);
        self.stage = stage;
        self.sample = sample;
        self.now_ms = self.now_ms.saturating_add(period_ms);

        if self.frozen {
            self.opacity = (self.opacity + c.opacity_rate * dt).min(1.0);
            if self.sample > MELT_MARGIN {
                debug!(t_ms = self.now_ms, "sim: sample melted");
                self.frozen = false;
                self.opacity = 0.0;
            }
        } else if self.sample < 0.0 && self.nucleates(dt) {
            debug!(t_ms = self.now_ms, sample = self.sample, "sim: nucleation");
            self.frozen = true;
            self.nucleations += 1;
            self.sample -= EXOTHERM_RECOVERY * self.sample;
            self.stage += self.config.exotherm;
        }
    }

    fn nucleates(&mut self, dt: f32) -> bool {
        let c = &self.config;
        let hazard =
            c.nucleation_rate * ((c.reference_temperature - self.sample) / c.nucleation_scale).exp();
        let probability = 1.0 - (-hazard * dt).exp();
        self.rng.gen::<f32>() < probability
    }

    fn noise(&mut self, amplitude: f32) -> f32 {
        self.rng.gen_range(-amplitude..=amplitude)
    }

    fn read_stage(&mut self) -> f32 {
        let amplitude = self.config.temperature_noise;
        self.stage + self.noise(amplitude)
    }

    fn read_sample(&mut self) -> f32 {
        let amplitude = self.config.temperature_noise;
        self.sample + self.noise(amplitude)
    }

    fn read_intensity(&mut self) -> f32 {
        let amplitude = self.config.optical_noise;
        let clear = self.config.clear_intensity;
        let drop = self.config.frozen_drop * self.opacity;
        clear - drop + self.noise(amplitude)
    }
}

/// Shared handle to a simulated apparatus
#[derive(Clone)]
pub struct SimulatedStage {
    plant: Rc<RefCell<Plant>>,
}

impl SimulatedStage {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            plant: Rc::new(RefCell::new(Plant::new(config))),
        }
    }

    /// Borrow the plant state
    pub fn with_plant<R>(&self, f: impl FnOnce(&Plant) -> R) -> R {
        f(&self.plant.borrow())
    }

    pub fn advance(&self, period_ms: u32) {
        self.plant.borrow_mut().advance(period_ms);
        trace!(
            t_ms = self.plant.borrow().now_ms,
            stage = self.plant.borrow().stage,
            "sim: tick"
        );
    }

    pub fn now_ms(&self) -> u32 {
        self.plant.borrow().now_ms
    }

    pub fn primary_probe(&self) -> SimProbe {
        SimProbe {
            plant: self.plant.clone(),
            location: ProbeLocation::Stage,
        }
    }

    pub fn sample_probe(&self) -> SimProbe {
        SimProbe {
            plant: self.plant.clone(),
            location: ProbeLocation::Sample,
        }
    }

    pub fn ldr(&self) -> SimLdr {
        SimLdr {
            plant: self.plant.clone(),
        }
    }

    pub fn peltier(&self) -> SimPeltier {
        SimPeltier {
            plant: self.plant.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeLocation {
    Stage,
    Sample,
}

/// Simulated thermocouple
pub struct SimProbe {
    plant: Rc<RefCell<Plant>>,
    location: ProbeLocation,
}

impl TemperatureSensor for SimProbe {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let mut plant = self.plant.borrow_mut();
        Ok(match self.location {
            ProbeLocation::Stage => plant.read_stage(),
            ProbeLocation::Sample => plant.read_sample(),
        })
    }
}

/// Simulated light dependent resistor
pub struct SimLdr {
    plant: Rc<RefCell<Plant>>,
}

impl OpticalSensor for SimLdr {
    fn read_intensity(&mut self) -> Result<f32, SensorError> {
        Ok(self.plant.borrow_mut().read_intensity())
    }
}

/// Simulated Peltier bridge
pub struct SimPeltier {
    plant: Rc<RefCell<Plant>>,
}

impl ThermalActuator for SimPeltier {
    fn set_pwm_duty(&mut self, percent: u8) -> Result<(), ActuatorError> {
        self.plant.borrow_mut().duty = percent.min(100);
        Ok(())
    }

    fn set_direction(&mut self, direction: CurrentDirection) -> Result<(), ActuatorError> {
        let mut plant = self.plant.borrow_mut();
        if plant.duty != 0 && plant.relays != direction {
            plant.hot_switches += 1;
        }
        plant.relays = direction;
        Ok(())
    }

    fn set_assist(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.plant.borrow_mut().assist = on;
        Ok(())
    }
}
