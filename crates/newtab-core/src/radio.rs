//! Radio station controller.
//!
//! [`RadioController`] owns the station list and the playback state. All
//! changes go through discrete commands (`select`, `play`, `pause`,
//! `toggle`, `stop`, `next`, `prev`, `shuffle`); audio output itself is
//! left to whoever observes [`RadioController::state`].
//!
//! ```text
//!            select/next/prev            play
//!   Idle ──────────────────▶ Selected ─────────▶ Playing
//!                              ▲  ▲                │  ▲
//!                         stop │  └──── stop ──────┤  │ play
//!                              │                   ▼  │
//!                              └────── stop ───── Paused
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configured radio station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioStation {
    /// Display name.
    pub name: String,
    /// Stream URL.
    pub url: String,
}

impl RadioStation {
    /// Creates a new station.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Errors returned by radio commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadioError {
    /// The station list is empty.
    #[error("no radio stations configured")]
    NoStations,
    /// The requested index is outside the station list.
    #[error("station index {index} out of range ({count} stations)")]
    UnknownStation { index: usize, count: usize },
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    /// No station selected.
    Idle,
    /// A station is selected but not playing.
    Selected { index: usize },
    /// Playing since the given instant.
    Playing { index: usize, since: Instant },
    /// Paused after playing for `elapsed`.
    Paused { index: usize, elapsed: Duration },
}

impl RadioState {
    /// Returns the selected station index, if any.
    pub fn station_index(&self) -> Option<usize> {
        match *self {
            Self::Idle => None,
            Self::Selected { index } | Self::Playing { index, .. } | Self::Paused { index, .. } => {
                Some(index)
            }
        }
    }

    /// Returns true while playing.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }
}

/// Owns the station list and the playback state.
#[derive(Debug, Clone)]
pub struct RadioController {
    stations: Vec<RadioStation>,
    state: RadioState,
}

impl RadioController {
    /// Creates an idle controller over the given stations.
    pub fn new(stations: Vec<RadioStation>) -> Self {
        Self {
            stations,
            state: RadioState::Idle,
        }
    }

    /// Returns the configured stations.
    pub fn stations(&self) -> &[RadioStation] {
        &self.stations
    }

    /// Returns the current state.
    pub fn state(&self) -> RadioState {
        self.state
    }

    /// Returns the selected station, if any.
    pub fn current_station(&self) -> Option<&RadioStation> {
        self.state
            .station_index()
            .and_then(|index| self.stations.get(index))
    }

    /// Selects a station. Playback continues on the new station if it was playing.
    pub fn select(&mut self, index: usize) -> Result<(), RadioError> {
        self.check_index(index)?;
        self.switch_to(index, Instant::now());
        Ok(())
    }

    /// Starts playback. Does nothing without a selected station.
    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    fn play_at(&mut self, now: Instant) {
        match self.state {
            RadioState::Selected { index } | RadioState::Paused { index, .. } => {
                self.state = RadioState::Playing { index, since: now };
            }
            RadioState::Idle | RadioState::Playing { .. } => {}
        }
    }

    /// Pauses playback, freezing the elapsed time.
    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    fn pause_at(&mut self, now: Instant) {
        if let RadioState::Playing { index, since } = self.state {
            self.state = RadioState::Paused {
                index,
                elapsed: now.saturating_duration_since(since),
            };
        }
    }

    /// Play/pause button behaviour.
    pub fn toggle(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stops playback and resets the elapsed time. The station stays selected.
    pub fn stop(&mut self) {
        if let Some(index) = self.state.station_index() {
            self.state = RadioState::Selected { index };
        }
    }

    /// Moves to the next station, wrapping around.
    pub fn next(&mut self) -> Result<(), RadioError> {
        let count = self.station_count()?;
        let index = match self.state.station_index() {
            None => 0,
            Some(current) => (current + 1) % count,
        };
        self.switch_to(index, Instant::now());
        Ok(())
    }

    /// Moves to the previous station, wrapping around.
    pub fn prev(&mut self) -> Result<(), RadioError> {
        let count = self.station_count()?;
        let index = match self.state.station_index() {
            None => 0,
            Some(0) => count - 1,
            Some(current) => current - 1,
        };
        self.switch_to(index, Instant::now());
        Ok(())
    }

    /// Jumps to a random station.
    pub fn shuffle(&mut self) -> Result<(), RadioError> {
        let count = self.station_count()?;
        self.shuffle_with(|| rand::random_range(0..count))
    }

    /// Jumps to the station picked by `pick`.
    pub fn shuffle_with(&mut self, pick: impl FnOnce() -> usize) -> Result<(), RadioError> {
        self.station_count()?;
        let index = pick();
        self.check_index(index)?;
        self.switch_to(index, Instant::now());
        Ok(())
    }

    /// Returns the elapsed play time at `now`.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.state {
            RadioState::Playing { since, .. } => now.saturating_duration_since(since),
            RadioState::Paused { elapsed, .. } => elapsed,
            RadioState::Idle | RadioState::Selected { .. } => Duration::ZERO,
        }
    }

    /// Returns the elapsed play time as `MM:SS`.
    pub fn elapsed_display_at(&self, now: Instant) -> String {
        format_elapsed(self.elapsed_at(now))
    }

    /// Returns the station label, e.g. `» Radio X «`.
    pub fn station_display(&self) -> String {
        match self.current_station() {
            Some(station) => format!("» {} «", station.name),
            None => "» NO STATION «".to_string(),
        }
    }

    fn switch_to(&mut self, index: usize, now: Instant) {
        self.state = if self.state.is_playing() {
            RadioState::Playing { index, since: now }
        } else {
            RadioState::Selected { index }
        };
    }

    fn station_count(&self) -> Result<usize, RadioError> {
        match self.stations.len() {
            0 => Err(RadioError::NoStations),
            count => Ok(count),
        }
    }

    fn check_index(&self, index: usize) -> Result<(), RadioError> {
        let count = self.station_count()?;
        if index >= count {
            return Err(RadioError::UnknownStation { index, count });
        }
        Ok(())
    }
}

/// Formats a duration as `MM:SS`. Minutes keep growing past 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations() -> Vec<RadioStation> {
        vec![
            RadioStation::new("Radio One", "https://stream.example.com/one"),
            RadioStation::new("Radio Two", "https://stream.example.com/two"),
            RadioStation::new("Radio Three", "https://stream.example.com/three"),
        ]
    }

    fn controller() -> RadioController {
        RadioController::new(stations())
    }

    mod commands {
        use super::*;

        #[test]
        fn starts_idle() {
            let radio = controller();
            assert_eq!(radio.state(), RadioState::Idle);
            assert_eq!(radio.station_display(), "» NO STATION «");
        }

        #[test]
        fn play_without_station_is_noop() {
            let mut radio = controller();
            radio.play();
            radio.toggle();
            assert_eq!(radio.state(), RadioState::Idle);
        }

        #[test]
        fn select_then_play() {
            let mut radio = controller();
            radio.select(1).unwrap();
            assert_eq!(radio.state(), RadioState::Selected { index: 1 });
            assert_eq!(radio.station_display(), "» Radio Two «");

            radio.play();
            assert!(radio.state().is_playing());
            assert_eq!(radio.state().station_index(), Some(1));
        }

        #[test]
        fn select_out_of_range() {
            let mut radio = controller();
            assert_eq!(
                radio.select(7),
                Err(RadioError::UnknownStation { index: 7, count: 3 })
            );
            assert_eq!(radio.state(), RadioState::Idle);
        }

        #[test]
        fn toggle_pauses_and_resumes() {
            let mut radio = controller();
            radio.select(0).unwrap();
            radio.toggle();
            assert!(radio.state().is_playing());
            radio.toggle();
            assert!(matches!(radio.state(), RadioState::Paused { index: 0, .. }));
            radio.toggle();
            assert!(radio.state().is_playing());
        }

        #[test]
        fn stop_keeps_station() {
            let mut radio = controller();
            radio.select(2).unwrap();
            radio.play();
            radio.stop();
            assert_eq!(radio.state(), RadioState::Selected { index: 2 });
        }

        #[test]
        fn next_and_prev_without_station_select_first() {
            let mut radio = controller();
            radio.next().unwrap();
            assert_eq!(radio.state(), RadioState::Selected { index: 0 });

            let mut radio = controller();
            radio.prev().unwrap();
            assert_eq!(radio.state(), RadioState::Selected { index: 0 });
        }

        #[test]
        fn next_and_prev_wrap() {
            let mut radio = controller();
            radio.select(2).unwrap();
            radio.next().unwrap();
            assert_eq!(radio.state().station_index(), Some(0));
            radio.prev().unwrap();
            assert_eq!(radio.state().station_index(), Some(2));
        }

        #[test]
        fn switching_while_playing_keeps_playing() {
            let mut radio = controller();
            radio.select(0).unwrap();
            radio.play();
            radio.next().unwrap();
            assert!(radio.state().is_playing());
            assert_eq!(radio.state().station_index(), Some(1));
        }

        #[test]
        fn switching_while_paused_only_selects() {
            let mut radio = controller();
            radio.select(0).unwrap();
            radio.play();
            radio.pause();
            radio.next().unwrap();
            assert_eq!(radio.state(), RadioState::Selected { index: 1 });
        }

        #[test]
        fn shuffle_uses_picker() {
            let mut radio = controller();
            radio.shuffle_with(|| 2).unwrap();
            assert_eq!(radio.state(), RadioState::Selected { index: 2 });
        }

        #[test]
        fn shuffle_stays_in_range() {
            let mut radio = controller();
            for _ in 0..20 {
                radio.shuffle().unwrap();
                assert!(radio.state().station_index().unwrap() < 3);
            }
        }

        #[test]
        fn empty_station_list() {
            let mut radio = RadioController::new(Vec::new());
            assert_eq!(radio.next(), Err(RadioError::NoStations));
            assert_eq!(radio.prev(), Err(RadioError::NoStations));
            assert_eq!(radio.shuffle(), Err(RadioError::NoStations));
        }
    }

    mod elapsed {
        use super::*;

        #[test]
        fn format() {
            assert_eq!(format_elapsed(Duration::ZERO), "00:00");
            assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
            assert_eq!(format_elapsed(Duration::from_secs(6000)), "100:00");
        }

        #[test]
        fn counts_while_playing() {
            let mut radio = controller();
            radio.select(0).unwrap();
            radio.play_at(Instant::now());

            let RadioState::Playing { since, .. } = radio.state() else {
                panic!("expected Playing");
            };
            assert_eq!(
                radio.elapsed_display_at(since + Duration::from_secs(75)),
                "01:15"
            );
        }

        #[test]
        fn freezes_on_pause_and_resets_on_stop() {
            let start = Instant::now();
            let mut radio = controller();
            radio.select(0).unwrap();
            radio.play_at(start);
            radio.pause_at(start + Duration::from_secs(42));

            let later = start + Duration::from_secs(500);
            assert_eq!(radio.elapsed_display_at(later), "00:42");

            radio.stop();
            assert_eq!(radio.elapsed_display_at(later), "00:00");
        }

        #[test]
        fn resume_restarts_timer() {
            let start = Instant::now();
            let mut radio = controller();
            radio.select(0).unwrap();
            radio.play_at(start);
            radio.pause_at(start + Duration::from_secs(30));
            radio.play_at(start + Duration::from_secs(60));

            assert_eq!(
                radio.elapsed_display_at(start + Duration::from_secs(65)),
                "00:05"
            );
        }
    }
}
