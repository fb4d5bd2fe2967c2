//! Turns beat and novelty events into rate-limited view changes.

use std::time::Duration;

use tracing::debug;

use crate::config::ReactiveConfig;

use super::deck::{Direction, ViewCycler};

/// The slice of one tick's analysis the dispatcher looks at
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TriggerInput {
    pub is_beat: bool,
    pub novelty: f32,
    pub dominant_frequency: f32,
}

#[derive(Clone, Debug, Default)]
pub struct TriggerDispatcher {
    last_camera_change: Option<Duration>,
    last_direction_change: Option<Duration>,
}

/// `true` if nothing happened yet or more than `cooldown` has passed
fn elapsed(last: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    last.map_or(true, |t| now.saturating_sub(t) > cooldown)
}

impl TriggerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// High dominant frequency steps forward, low steps back
    pub fn direction_for(dominant_frequency: f32, frequency_threshold_hz: f32) -> Direction {
        if dominant_frequency > frequency_threshold_hz {
            Direction::Next
        } else {
            Direction::Previous
        }
    }

    /// Cycle `views` if this tick triggers and both cooldowns have passed.
    ///
    /// Returns the direction that was sent, if any.
    pub fn dispatch(
        &mut self,
        now: Duration,
        input: TriggerInput,
        config: &ReactiveConfig,
        views: &mut dyn ViewCycler,
    ) -> Option<Direction> {
        if !config.sound_animation_enabled() {
            return None;
        }
        if !(input.is_beat || input.novelty > config.novelty_threshold()) {
            return None;
        }
        if !elapsed(self.last_camera_change, now, config.camera_change_cooldown())
            || !elapsed(self.last_direction_change, now, config.direction_change_cooldown())
        {
            return None;
        }

        let direction = Self::direction_for(input.dominant_frequency, config.frequency_threshold_hz());
        views.cycle_view(direction);
        self.last_camera_change = Some(now);
        self.last_direction_change = Some(now);

        debug!(
            %direction,
            beat = input.is_beat,
            novelty = input.novelty,
            dominant_frequency = input.dominant_frequency,
            "view triggered"
        );
        Some(direction)
    }

    pub fn last_camera_change(&self) -> Option<Duration> {
        self.last_camera_change
    }

    /// Let the next trigger through regardless of the camera cooldown
    pub fn clear_camera_change(&mut self) {
        self.last_camera_change = None;
    }

    pub fn reset(&mut self) {
        self.last_camera_change = None;
        self.last_direction_change = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Direction>);

    impl ViewCycler for Recorder {
        fn cycle_view(&mut self, direction: Direction) {
            self.0.push(direction);
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn beat(dominant_frequency: f32) -> TriggerInput {
        TriggerInput {
            is_beat: true,
            novelty: 0.0,
            dominant_frequency,
        }
    }

    #[test]
    fn fires_once_per_cooldown() {
        let config = ReactiveConfig::default();
        let mut dispatcher = TriggerDispatcher::new();
        let mut views = Recorder::default();

        assert_eq!(dispatcher.dispatch(ms(1000), beat(5000.0), &config, &mut views), Some(Direction::Next));
        assert_eq!(dispatcher.dispatch(ms(1030), beat(5000.0), &config, &mut views), None);
        assert_eq!(views.0.len(), 1);

        assert_eq!(dispatcher.dispatch(ms(1061), beat(100.0), &config, &mut views), Some(Direction::Previous));
        assert_eq!(views.0, vec![Direction::Next, Direction::Previous]);
    }

    #[test]
    fn both_cooldowns_must_pass() {
        let mut config = ReactiveConfig::default();
        config.set_camera_change_cooldown(ms(20));
        config.set_direction_change_cooldown(ms(500));
        let mut dispatcher = TriggerDispatcher::new();
        let mut views = Recorder::default();

        assert!(dispatcher.dispatch(ms(0), beat(0.0), &config, &mut views).is_some());
        // camera cooldown passed, direction cooldown has not
        assert!(dispatcher.dispatch(ms(100), beat(0.0), &config, &mut views).is_none());
        assert!(dispatcher.dispatch(ms(501), beat(0.0), &config, &mut views).is_some());
    }

    #[test]
    fn novelty_alone_triggers() {
        let config = ReactiveConfig::default();
        let mut dispatcher = TriggerDispatcher::new();
        let mut views = Recorder::default();
        let input = TriggerInput {
            is_beat: false,
            novelty: 0.6,
            dominant_frequency: 0.0,
        };
        assert!(dispatcher.dispatch(ms(0), input, &config, &mut views).is_some());

        let quiet = TriggerInput {
            novelty: 0.5,
            ..input
        };
        assert!(dispatcher.dispatch(ms(500), quiet, &config, &mut views).is_none());
    }

    #[test]
    fn disabled_sound_animation_blocks() {
        let mut config = ReactiveConfig::default();
        config.set_sound_animation_enabled(false);
        let mut dispatcher = TriggerDispatcher::new();
        let mut views = Recorder::default();
        assert!(dispatcher.dispatch(ms(0), beat(0.0), &config, &mut views).is_none());
        assert!(views.0.is_empty());
        assert_eq!(dispatcher.last_camera_change(), None);
    }

    #[test]
    fn direction_threshold_is_strict() {
        assert_eq!(TriggerDispatcher::direction_for(4000.0, 4000.0), Direction::Previous);
        assert_eq!(TriggerDispatcher::direction_for(4000.5, 4000.0), Direction::Next);
    }
}
