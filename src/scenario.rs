use crate::{
    driver::EffectDriver,
    effects::{Effect, EffectKind, Iterations, Length},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// How long to wait on steps whose effect never ends by itself.
const DEFAULT_HOLD: Duration = Duration::from_millis(1000);

/// Scenario step - effect with playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub effect: Effect,
    #[serde(default)]
    pub iterations: Iterations,
    /// Time to keep the effect alive; derived from the effect when absent
    #[serde(default)]
    pub hold_ms: Option<u64>,
}

impl ScenarioStep {
    /// Delay plus length times iterations, or `hold_ms` when given.
    pub fn hold(&self) -> Duration {
        if let Some(ms) = self.hold_ms {
            return Duration::from_millis(ms);
        }
        let params = self.effect.params();
        match (params.length, self.iterations) {
            (Length::Millis(ms), Iterations::Times(n)) => {
                Duration::from_millis(params.delay as u64 + ms as u64 * n as u64)
            }
            _ => DEFAULT_HOLD,
        }
    }
}

/// Playback scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Loop forever
    #[serde(default)]
    pub loop_forever: bool,
    /// Repeat count (if not loop_forever)
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
    /// Device gain to set before playing (0-100)
    #[serde(default)]
    pub gain: Option<i32>,
    /// Autocenter strength to set before playing (0-100)
    #[serde(default)]
    pub autocenter: Option<i32>,
    pub steps: Vec<ScenarioStep>,
}

fn default_repeat_count() -> u32 {
    1
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step_index: usize,
    pub kind: EffectKind,
    pub error: Option<String>,
}

impl Scenario {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(content)?;
        Ok(scenario)
    }

    /// Load scenario from YAML file
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Play the scenario on `driver`. A failing step is logged and skipped.
    ///
    /// With `loop_forever` this returns only once the driver asks to stop,
    /// and the outcomes cover the last pass only.
    pub fn play<D: EffectDriver + ?Sized>(&self, driver: &mut D) -> anyhow::Result<Vec<StepOutcome>> {
        info!(scenario = %self.name, driver = driver.name(), "starting scenario");
        if !self.description.is_empty() {
            info!("{}", self.description);
        }

        self.configure(driver)?;

        if self.loop_forever {
            warn!("Infinite loop mode. Press Ctrl+C to stop.");
        }

        // In loop mode only the latest pass is kept
        let mut outcomes = Vec::new();
        let mut iteration = 0;
        'passes: while self.loop_forever || iteration < self.repeat_count {
            iteration += 1;
            if self.loop_forever {
                outcomes.clear();
            } else {
                info!("=== Iteration {}/{} ===", iteration, self.repeat_count);
            }

            for (idx, step) in self.steps.iter().enumerate() {
                if !driver.keep_running() {
                    info!(iteration, step = idx + 1, "playback stopped by driver");
                    break 'passes;
                }

                let kind = step.effect.kind();
                info!(step = idx + 1, %kind, hold_ms = step.hold().as_millis() as u64, "playing step");

                let error = match Self::play_step(driver, step) {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(step = idx + 1, "failed to execute effect: {}", e);
                        Some(e.to_string())
                    }
                };
                outcomes.push(StepOutcome {
                    step_index: idx + 1,
                    kind,
                    error,
                });

                let _ = driver.stop_all();
            }
        }

        info!(scenario = %self.name, "scenario completed");
        Ok(outcomes)
    }

    fn configure<D: EffectDriver + ?Sized>(&self, driver: &mut D) -> anyhow::Result<()> {
        if self.gain.is_none() && self.autocenter.is_none() {
            return Ok(());
        }
        let capabilities = driver.capabilities()?;
        if let Some(gain) = self.gain {
            if capabilities.gain() {
                driver.set_gain(gain)?;
            } else {
                warn!(gain, "device has no gain control, ignoring");
            }
        }
        if let Some(autocenter) = self.autocenter {
            if capabilities.autocenter() {
                driver.set_autocenter(autocenter)?;
            } else {
                warn!(autocenter, "device has no autocenter, ignoring");
            }
        }
        Ok(())
    }

    fn play_step<D: EffectDriver + ?Sized>(
        driver: &mut D,
        step: &ScenarioStep,
    ) -> crate::error::HapticResult<()> {
        let id = driver.upload(&step.effect)?;
        let played = driver.run(id, step.iterations).map(|_| {
            let hold = step.hold();
            if !hold.is_zero() {
                thread::sleep(hold);
            }
        });
        let stopped = driver.stop(id);
        driver.destroy(id)?;
        played.and(stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capabilities::{Capabilities, FEATURE_GAIN},
        error::{FailureSite, HapticError, HapticResult},
        manager::EffectId,
        translate::{haptic_type, NativeEffect},
    };

    #[derive(Default)]
    struct RecordingDriver {
        features: u32,
        calls: Vec<String>,
        next_id: i32,
        reject: Option<EffectKind>,
        max_uploads: Option<usize>,
    }

    impl EffectDriver for RecordingDriver {
        fn name(&self) -> &str {
            "recording"
        }

        fn capabilities(&self) -> HapticResult<Capabilities> {
            Ok(Capabilities::from_features(self.features))
        }

        fn set_gain(&mut self, gain: i32) -> HapticResult<()> {
            self.calls.push(format!("gain {}", gain));
            Ok(())
        }

        fn set_autocenter(&mut self, autocenter: i32) -> HapticResult<()> {
            self.calls.push(format!("autocenter {}", autocenter));
            Ok(())
        }

        fn upload(&mut self, effect: &Effect) -> HapticResult<EffectId> {
            // Goes through the real translator so bad descriptions fail here
            let native = NativeEffect::from_effect(effect)?;
            if Some(native.kind()) == self.reject {
                return Err(HapticError::Sdl {
                    site: FailureSite::NewEffect,
                    message: "Effect not supported".to_string(),
                });
            }
            let id = EffectId(self.next_id);
            self.next_id += 1;
            self.calls.push(format!("upload {} as {}", native.kind(), id.0));
            Ok(id)
        }

        fn run(&mut self, id: EffectId, iterations: Iterations) -> HapticResult<()> {
            self.calls.push(format!("run {} {:?}", id.0, iterations));
            Ok(())
        }

        fn stop(&mut self, id: EffectId) -> HapticResult<()> {
            self.calls.push(format!("stop {}", id.0));
            Ok(())
        }

        fn destroy(&mut self, id: EffectId) -> HapticResult<()> {
            self.calls.push(format!("destroy {}", id.0));
            Ok(())
        }

        fn stop_all(&mut self) -> HapticResult<()> {
            self.calls.push("stop all".to_string());
            Ok(())
        }

        fn keep_running(&self) -> bool {
            self.max_uploads.map_or(true, |max| (self.next_id as usize) < max)
        }
    }

    const SCENARIO: &str = r#"
name: test
gain: 80
autocenter: 0
repeat_count: 2
steps:
  - effect:
      type: constant
      level: 10000
    hold_ms: 0
  - effect:
      type: condition
      condition_type: spring
    iterations: infinite
    hold_ms: 0
"#;

    #[test]
    fn scenario_runs_each_step_through_the_driver() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let mut driver = RecordingDriver {
            features: haptic_type(EffectKind::Constant).0 as u32 | FEATURE_GAIN,
            ..RecordingDriver::default()
        };
        let outcomes = scenario.play(&mut driver).unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.error.is_none()));
        assert_eq!(outcomes[1].kind, EffectKind::Spring);
        assert_eq!(
            &driver.calls[..7],
            &[
                "gain 80",
                "upload Constant force as 0",
                "run 0 Times(1)",
                "stop 0",
                "destroy 0",
                "stop all",
                "upload Condition (spring) as 1",
            ]
        );
        assert_eq!(driver.calls[7], "run 1 Infinite");
        // No autocenter feature bit, so the setting is skipped
        assert!(!driver.calls.iter().any(|c| c.starts_with("autocenter")));
    }

    #[test]
    fn failing_step_is_reported_and_playback_continues() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let mut driver = RecordingDriver {
            reject: Some(EffectKind::Constant),
            ..RecordingDriver::default()
        };
        let outcomes = scenario.play(&mut driver).unwrap();
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].error.as_deref().unwrap().contains("Effect not supported"));
        assert!(outcomes[1].error.is_none());
    }

    #[test]
    fn endless_loop_keeps_only_the_current_pass() {
        let mut scenario = Scenario::from_yaml(SCENARIO).unwrap();
        scenario.loop_forever = true;
        scenario.gain = None;
        scenario.autocenter = None;
        let mut driver = RecordingDriver {
            max_uploads: Some(7),
            ..RecordingDriver::default()
        };
        let outcomes = scenario.play(&mut driver).unwrap();

        // Seven uploads is three full passes plus one step of the fourth
        assert_eq!(driver.next_id, 7);
        assert_eq!(driver.calls.iter().filter(|c| c.starts_with("upload")).count(), 7);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].step_index, 1);
        assert_eq!(outcomes[0].kind, EffectKind::Constant);
    }

    #[test]
    fn driver_can_stop_counted_playback_early() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let mut driver = RecordingDriver {
            max_uploads: Some(3),
            ..RecordingDriver::default()
        };
        let outcomes = scenario.play(&mut driver).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[2].kind, EffectKind::Constant);
    }

    #[test]
    fn hold_is_derived_from_effect_timing() {
        let step: ScenarioStep = serde_yaml::from_str(
            "effect:\n  type: ramp\n  start: 0\n  end: 100\n  length: 300\n  delay: 50\niterations: 2\n",
        )
        .unwrap();
        assert_eq!(step.hold(), Duration::from_millis(650));

        let endless: ScenarioStep =
            serde_yaml::from_str("effect:\n  type: constant\n  level: 1\n  length: infinite\n")
                .unwrap();
        assert_eq!(endless.hold(), DEFAULT_HOLD);
    }

    #[test]
    fn bundled_demo_scenario_parses() {
        let scenario = Scenario::from_yaml(include_str!("../scenarios/demo.yaml")).unwrap();
        assert!(!scenario.steps.is_empty());
        for step in &scenario.steps {
            NativeEffect::from_effect(&step.effect).unwrap();
        }
    }
}
