use crate::{
    config::ThermostatConfig,
    error::Error,
    types::{CurrentMode, DisplayUnits, RelayCommand, TargetMode, ThermostatStatus},
};

// Cold-start values, matching the original accessory.
const INITIAL_TEMPERATURE: f32 = 21.0;
const INITIAL_HUMIDITY: f32 = 50.0;
const INITIAL_TARGET_TEMPERATURE: f32 = 21.0;
const INITIAL_HEATING_THRESHOLD: f32 = 18.0;
const INITIAL_COOLING_THRESHOLD: f32 = 24.0;

/// The control state machine.
///
/// The engine is pure with respect to time and hardware: every operation
/// takes a monotonic `now_ms` and returns the relay commands the caller must
/// apply, in order. Re-evaluation happens after every sensor reading and
/// every target write; the deferred stop fires from [`ThermostatEngine::tick`].
#[derive(Debug, Clone)]
pub struct ThermostatEngine {
    config: ThermostatConfig,

    current_mode: CurrentMode,
    target_mode: TargetMode,
    current_temperature: f32,
    current_humidity: f32,
    target_temperature: f32,
    heating_threshold: f32,
    cooling_threshold: f32,
    display_units: DisplayUnits,

    // Set exactly while current_mode != Off.
    system_started_at: Option<u64>,
    // Deadline of the debounced stop; exists only while running.
    pending_stop_deadline: Option<u64>,
}

impl ThermostatEngine {
    pub fn new(config: ThermostatConfig) -> Self {
        Self {
            config,
            current_mode: CurrentMode::Off,
            target_mode: TargetMode::Off,
            current_temperature: INITIAL_TEMPERATURE,
            current_humidity: INITIAL_HUMIDITY,
            target_temperature: INITIAL_TARGET_TEMPERATURE,
            heating_threshold: INITIAL_HEATING_THRESHOLD,
            cooling_threshold: INITIAL_COOLING_THRESHOLD,
            display_units: DisplayUnits::Celsius,
            system_started_at: None,
            pending_stop_deadline: None,
        }
    }

    pub fn config(&self) -> &ThermostatConfig {
        &self.config
    }

    pub fn current_mode(&self) -> CurrentMode {
        self.current_mode
    }

    pub fn target_mode(&self) -> TargetMode {
        self.target_mode
    }

    pub fn current_temperature(&self) -> f32 {
        self.current_temperature
    }

    pub fn current_humidity(&self) -> f32 {
        self.current_humidity
    }

    pub fn target_temperature(&self) -> f32 {
        self.target_temperature
    }

    pub fn heating_threshold(&self) -> f32 {
        self.heating_threshold
    }

    pub fn cooling_threshold(&self) -> f32 {
        self.cooling_threshold
    }

    pub fn display_units(&self) -> DisplayUnits {
        self.display_units
    }

    pub fn set_display_units(&mut self, units: DisplayUnits) {
        self.display_units = units;
    }

    pub fn is_stop_pending(&self) -> bool {
        self.pending_stop_deadline.is_some()
    }

    pub fn pending_stop_remaining_ms(&self, now_ms: u64) -> u64 {
        self.pending_stop_deadline
            .map(|deadline| deadline.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    pub fn running_ms(&self, now_ms: u64) -> u64 {
        match self.system_started_at {
            Some(started) => now_ms.saturating_sub(started),
            None => 0,
        }
    }

    /// Records a sensor sample and re-evaluates. Readings are stored even
    /// when no mode change results.
    pub fn on_reading(&mut self, temperature: f32, humidity: f32, now_ms: u64) -> Vec<RelayCommand> {
        self.current_temperature = temperature;
        self.current_humidity = humidity;

        let mut commands = Vec::new();
        self.evaluate(now_ms, &mut commands);
        commands
    }

    pub fn set_target_mode(&mut self, mode: TargetMode, now_ms: u64) -> Vec<RelayCommand> {
        self.target_mode = mode;

        let mut commands = Vec::new();
        self.evaluate(now_ms, &mut commands);
        commands
    }

    /// Rejects setpoints outside [min_temp, max_temp]; the previous value is
    /// retained on error.
    pub fn set_target_temperature(
        &mut self,
        value: f32,
        now_ms: u64,
    ) -> Result<Vec<RelayCommand>, Error> {
        if !value.is_finite() {
            return Err(Error::NonFinite(value));
        }
        if value < self.config.min_temp || value > self.config.max_temp {
            return Err(Error::TargetOutOfRange {
                min: self.config.min_temp,
                max: self.config.max_temp,
                actual: value,
            });
        }

        self.target_temperature = value;
        let mut commands = Vec::new();
        self.evaluate(now_ms, &mut commands);
        Ok(commands)
    }

    pub fn set_heating_threshold(
        &mut self,
        value: f32,
        now_ms: u64,
    ) -> Result<Vec<RelayCommand>, Error> {
        if !value.is_finite() {
            return Err(Error::NonFinite(value));
        }
        if value >= self.cooling_threshold {
            return Err(Error::ThresholdOrder {
                heating: value,
                cooling: self.cooling_threshold,
            });
        }

        self.heating_threshold = value;
        let mut commands = Vec::new();
        self.evaluate(now_ms, &mut commands);
        Ok(commands)
    }

    pub fn set_cooling_threshold(
        &mut self,
        value: f32,
        now_ms: u64,
    ) -> Result<Vec<RelayCommand>, Error> {
        if !value.is_finite() {
            return Err(Error::NonFinite(value));
        }
        if value <= self.heating_threshold {
            return Err(Error::ThresholdOrder {
                heating: self.heating_threshold,
                cooling: value,
            });
        }

        self.cooling_threshold = value;
        let mut commands = Vec::new();
        self.evaluate(now_ms, &mut commands);
        Ok(commands)
    }

    /// Fires the deferred stop once its deadline has passed.
    ///
    /// Nothing else is evaluated here: after a completed stop the opposite
    /// mode may only start on the next reading or target write, which keeps
    /// mode switches as a full stop followed by a fresh start.
    pub fn tick(&mut self, now_ms: u64) -> Vec<RelayCommand> {
        let mut commands = Vec::new();
        if let Some(deadline) = self.pending_stop_deadline {
            if now_ms >= deadline {
                self.stop_now(&mut commands);
            }
        }
        commands
    }

    pub fn status(&self, now_ms: u64) -> ThermostatStatus {
        ThermostatStatus {
            current_temperature: self.current_temperature,
            current_humidity: self.current_humidity,
            target_temperature: self.target_temperature,
            heating_threshold: self.heating_threshold,
            cooling_threshold: self.cooling_threshold,
            mode: self.current_mode.as_str(),
            target_mode: self.target_mode.as_str(),
            units: self.display_units.value(),
            running_ms: self.running_ms(now_ms),
            stop_pending: self.is_stop_pending(),
            stop_remaining_ms: self.pending_stop_remaining_ms(now_ms),
        }
    }

    fn should_heat(&self) -> bool {
        (self.target_mode == TargetMode::Heat && self.current_temperature < self.target_temperature)
            || (self.target_mode == TargetMode::Auto
                && self.current_temperature < self.heating_threshold)
    }

    fn should_cool(&self) -> bool {
        (self.target_mode == TargetMode::Cool && self.current_temperature > self.target_temperature)
            || (self.target_mode == TargetMode::Auto
                && self.current_temperature > self.cooling_threshold)
    }

    fn evaluate(&mut self, now_ms: u64, commands: &mut Vec<RelayCommand>) {
        let running = self.current_mode != CurrentMode::Off;
        let wanted = self.target_mode != TargetMode::Off;

        match (running, wanted) {
            (false, true) => {
                // Heat is checked first; it wins if both predicates hold.
                if self.should_heat() {
                    self.turn_on(CurrentMode::Heating, now_ms, commands);
                } else if self.should_cool() {
                    self.turn_on(CurrentMode::Cooling, now_ms, commands);
                }
            }
            (true, false) => self.deactivate(now_ms, commands),
            (true, true) => {
                if self.should_heat() {
                    self.turn_on(CurrentMode::Heating, now_ms, commands);
                } else if self.should_cool() {
                    self.turn_on(CurrentMode::Cooling, now_ms, commands);
                } else {
                    self.deactivate(now_ms, commands);
                }
            }
            (false, false) => {}
        }
    }

    /// Start `mode`, or route a mode switch through a full stop, or resume a
    /// run whose stop is still pending.
    fn turn_on(&mut self, mode: CurrentMode, now_ms: u64, commands: &mut Vec<RelayCommand>) {
        if self.current_mode == CurrentMode::Off {
            self.activate(mode, now_ms, commands);
        } else if self.current_mode != mode {
            // Two-step switch: stop completely first; the new mode starts on
            // a later evaluate pass once the stop has fired.
            self.deactivate(now_ms, commands);
        } else if self.pending_stop_deadline.is_some() {
            // Resume: the hardware never went off, so no command is emitted.
            self.pending_stop_deadline = None;
        }
    }

    /// The only path that turns hardware on; guarded by the Off precondition
    /// in [`ThermostatEngine::turn_on`].
    fn activate(&mut self, mode: CurrentMode, now_ms: u64, commands: &mut Vec<RelayCommand>) {
        let Some(channel) = mode.channel() else {
            return;
        };
        commands.push(RelayCommand::on(channel));
        self.system_started_at = Some(now_ms);
        self.current_mode = mode;
    }

    /// Anti-short-cycling stop: immediate once the dwell time has elapsed,
    /// otherwise debounced to the dwell deadline. Idempotent while a stop is
    /// already pending.
    fn deactivate(&mut self, now_ms: u64, commands: &mut Vec<RelayCommand>) {
        if self.current_mode == CurrentMode::Off || self.pending_stop_deadline.is_some() {
            return;
        }

        let elapsed = self.running_ms(now_ms);
        let remaining = self.config.minimum_on_off_time_ms.saturating_sub(elapsed);
        if remaining == 0 {
            self.stop_now(commands);
        } else {
            self.pending_stop_deadline = Some(now_ms + remaining);
        }
    }

    fn stop_now(&mut self, commands: &mut Vec<RelayCommand>) {
        if let Some(channel) = self.current_mode.channel() {
            commands.push(RelayCommand::off(channel));
        }
        self.system_started_at = None;
        self.pending_stop_deadline = None;
        self.current_mode = CurrentMode::Off;
    }
}
