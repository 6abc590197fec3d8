//! Turning held controls into inputs
//!
//! Every client tick samples its controls once. The elapsed time since the
//! previous sample becomes the press duration of the emitted input, so the
//! same input can be applied locally (prediction) and by the server.

use lagsim_core::{EntityId, Input, Timestamp};
use serde::{Deserialize, Serialize};

/// Held state of a client's two controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    /// "Move left" is held
    pub left: bool,
    /// "Move right" is held
    pub right: bool,
}

impl Controls {
    /// Nothing held
    pub const IDLE: Controls = Controls {
        left: false,
        right: false,
    };

    /// Only "move left" held
    pub const LEFT: Controls = Controls {
        left: true,
        right: false,
    };

    /// Only "move right" held
    pub const RIGHT: Controls = Controls {
        left: false,
        right: true,
    };

    /// Signed direction; right wins when both are held
    pub fn direction(&self) -> Option<f64> {
        if self.right {
            Some(1.0)
        } else if self.left {
            Some(-1.0)
        } else {
            None
        }
    }
}

/// Numbers inputs and measures how long controls were held
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    next_sequence: u64,
    last_sample_at: Option<Timestamp>,
}

impl InputSampler {
    /// Create a sampler whose first input will be numbered 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample `controls` at `now`
    ///
    /// The first sample measures zero elapsed time. Returns `None` when no
    /// control is held; the sequence number only advances when an input is
    /// emitted.
    pub fn sample(&mut self, now: Timestamp, controls: Controls, entity_id: EntityId) -> Option<Input> {
        let elapsed = self
            .last_sample_at
            .map_or(0.0, |last| now.saturating_since(last).as_secs_f64());
        self.last_sample_at = Some(now);

        let direction = controls.direction()?;
        let input = Input::new(self.next_sequence, direction * elapsed, entity_id);
        self.next_sequence += 1;
        Some(input)
    }

    /// Sequence number the next emitted input will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_has_zero_elapsed() {
        let mut sampler = InputSampler::new();
        let input = sampler
            .sample(Timestamp::from_millis(1000), Controls::RIGHT, EntityId(0))
            .unwrap();
        assert_eq!(input.sequence_number, 0);
        assert_eq!(input.press_duration, 0.0);
    }

    #[test]
    fn test_sequence_increases_by_one_per_emitted_input() {
        let mut sampler = InputSampler::new();
        let id = EntityId(3);
        let mut seqs = Vec::new();

        for (i, controls) in [Controls::RIGHT, Controls::IDLE, Controls::LEFT, Controls::RIGHT]
            .into_iter()
            .enumerate()
        {
            if let Some(input) = sampler.sample(Timestamp::from_millis(16 * i as u64), controls, id) {
                seqs.push(input.sequence_number);
            }
        }

        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(sampler.next_sequence(), 3);
    }

    #[test]
    fn test_direction_and_elapsed() {
        let mut sampler = InputSampler::new();
        let id = EntityId(0);
        sampler.sample(Timestamp::from_millis(0), Controls::IDLE, id);

        let left = sampler.sample(Timestamp::from_millis(20), Controls::LEFT, id).unwrap();
        assert!((left.press_duration + 0.020).abs() < 1e-12);

        let both = Controls {
            left: true,
            right: true,
        };
        let right = sampler.sample(Timestamp::from_millis(30), both, id).unwrap();
        assert!((right.press_duration - 0.010).abs() < 1e-12);
    }
}
