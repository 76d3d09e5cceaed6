//! Playback session state machine.
//!
//! The controller is deliberately pure: it never touches mpv or a timer
//! itself.  Every input (user command, pipeline notification, retry-timer
//! fire) mutates the session and returns the [`Directive`]s the driver must
//! execute.  This keeps the transition table testable without a media
//! pipeline behind it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Automatic reconnect attempts per session lifetime.
pub const MAX_AUTO_RETRIES: u32 = 3;

/// Fixed spacing between automatic reconnect attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Connection status of the live stream — drives UI affordances and retry
/// eligibility.
///
/// Transitions:
///   Disconnected/StreamOffline --(user play)--> Connecting
///   any --(Buffering)--> Connecting
///   any --(Playing)--> Live
///   any --(Error)--> StreamOffline (retry timer armed while under the cap)
///   Live --(user pause)--> Disconnected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Live,
    StreamOffline,
}

impl ConnectionStatus {
    /// User-facing label for the status badge.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Live => "Live",
            ConnectionStatus::StreamOffline => "Stream Offline",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed media-pipeline notification.  The mpv driver translates its raw
/// IPC events into these; the session never sees anything mpv-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The pipeline is stalled waiting for data (transient, no action).
    Buffering,
    /// Audio is flowing.
    Playing,
    /// Hard pipeline error — stream dropped, load failed, decoder gave up.
    Error,
}

/// What the driver must do after a transition.  Pure output; the driver
/// interprets these against the actual pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Reload the media source (to reacquire the live edge rather than a
    /// stale buffered position), then request playback.
    Reconnect,
    /// Stop the pipeline.
    Stop,
    /// Arm the retry timer for [`RETRY_DELAY`]; carries the session
    /// generation so a stale fire can be recognised and dropped.
    ScheduleRetry { generation: u64 },
    /// Apply the mute flag to the pipeline.
    SetMute(bool),
}

/// Mutable state bundle for the single live-stream connection.
///
/// The retry counter is a lifetime cap: it is never reset by a manual
/// reconnect, only by constructing a fresh session.  Whether that cap is
/// intended or should reset on every manual play is unresolved product-side;
/// the observed behavior is the cap, so that is what this implements.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaybackSession {
    pub status: ConnectionStatus,
    pub playing: bool,
    pub muted: bool,
    pub retry_count: u32,
    /// Bumped on every stop; pending retry timers from an older generation
    /// are ignored when they fire.
    pub generation: u64,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// User pressed play.  Always attempts reload+play, regardless of how
    /// many automatic retries have been spent.
    pub fn play(&mut self) -> Vec<Directive> {
        self.status = ConnectionStatus::Connecting;
        vec![Directive::Reconnect]
    }

    /// User pressed pause.  Ends the session attempt: pending retry timers
    /// become stale via the generation bump.
    pub fn pause(&mut self) -> Vec<Directive> {
        self.status = ConnectionStatus::Disconnected;
        self.playing = false;
        self.generation += 1;
        vec![Directive::Stop]
    }

    /// Orthogonal mute toggle — never touches connection state.
    pub fn toggle_mute(&mut self) -> Vec<Directive> {
        self.muted = !self.muted;
        vec![Directive::SetMute(self.muted)]
    }

    /// A typed notification arrived from the media pipeline.
    pub fn pipeline_event(&mut self, event: PipelineEvent) -> Vec<Directive> {
        match event {
            PipelineEvent::Buffering => {
                self.status = ConnectionStatus::Connecting;
                Vec::new()
            }
            PipelineEvent::Playing => {
                self.status = ConnectionStatus::Live;
                self.playing = true;
                Vec::new()
            }
            PipelineEvent::Error => {
                self.status = ConnectionStatus::StreamOffline;
                self.playing = false;
                // The counter gates whether another timer is armed, not the
                // state transition itself.
                if self.retry_count < MAX_AUTO_RETRIES {
                    vec![Directive::ScheduleRetry {
                        generation: self.generation,
                    }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// The retry timer fired.  Stale fires (from before a stop) are no-ops;
    /// a current fire spends one retry and asks the driver to reconnect.
    pub fn retry_due(&mut self, generation: u64) -> Vec<Directive> {
        if generation != self.generation {
            return Vec::new();
        }
        self.retry_count += 1;
        vec![Directive::Reconnect]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_pending_retry(session: &mut PlaybackSession, directives: &[Directive]) -> Vec<Directive> {
        match directives {
            [Directive::ScheduleRetry { generation }] => session.retry_due(*generation),
            _ => panic!("expected a scheduled retry, got {:?}", directives),
        }
    }

    #[test]
    fn status_follows_last_pipeline_event() {
        let mut s = PlaybackSession::new();
        s.play();

        s.pipeline_event(PipelineEvent::Buffering);
        assert_eq!(s.status, ConnectionStatus::Connecting);

        s.pipeline_event(PipelineEvent::Playing);
        assert_eq!(s.status, ConnectionStatus::Live);
        assert!(s.playing);

        s.pipeline_event(PipelineEvent::Buffering);
        assert_eq!(s.status, ConnectionStatus::Connecting);

        s.pipeline_event(PipelineEvent::Error);
        assert_eq!(s.status, ConnectionStatus::StreamOffline);
        assert!(!s.playing);
    }

    #[test]
    fn play_reconnects_then_playing_goes_live() {
        let mut s = PlaybackSession::new();
        let d = s.play();
        assert_eq!(s.status, ConnectionStatus::Connecting);
        assert_eq!(d, vec![Directive::Reconnect]);

        s.pipeline_event(PipelineEvent::Playing);
        assert_eq!(s.status, ConnectionStatus::Live);
    }

    #[test]
    fn pause_from_live_disconnects() {
        let mut s = PlaybackSession::new();
        s.play();
        s.pipeline_event(PipelineEvent::Playing);

        let d = s.pause();
        assert_eq!(s.status, ConnectionStatus::Disconnected);
        assert!(!s.playing);
        assert_eq!(d, vec![Directive::Stop]);
    }

    #[test]
    fn three_errors_schedule_retries_fourth_schedules_nothing() {
        let mut s = PlaybackSession::new();
        s.play();

        for attempt in 0..3 {
            let d = s.pipeline_event(PipelineEvent::Error);
            assert_eq!(s.status, ConnectionStatus::StreamOffline);
            assert_eq!(
                d,
                vec![Directive::ScheduleRetry { generation: 0 }],
                "attempt {attempt} should arm a timer"
            );
            let d = fire_pending_retry(&mut s, &d);
            assert_eq!(d, vec![Directive::Reconnect]);
        }
        assert_eq!(s.retry_count, 3);

        // 4th error still transitions but arms no timer.
        let d = s.pipeline_event(PipelineEvent::Error);
        assert_eq!(s.status, ConnectionStatus::StreamOffline);
        assert!(d.is_empty());
    }

    #[test]
    fn manual_play_from_offline_ignores_spent_retry_cap() {
        let mut s = PlaybackSession::new();
        s.play();
        for _ in 0..3 {
            let d = s.pipeline_event(PipelineEvent::Error);
            fire_pending_retry(&mut s, &d);
        }
        assert!(s.pipeline_event(PipelineEvent::Error).is_empty());

        // Manual play still reloads+plays; the counter is a lifetime cap.
        let d = s.play();
        assert_eq!(s.status, ConnectionStatus::Connecting);
        assert_eq!(d, vec![Directive::Reconnect]);
        assert_eq!(s.retry_count, 3);
    }

    #[test]
    fn mute_never_changes_connection_status() {
        let mut s = PlaybackSession::new();
        for setup in [
            PipelineEvent::Buffering,
            PipelineEvent::Playing,
            PipelineEvent::Error,
        ] {
            s.play();
            s.pipeline_event(setup);
            let before = s.status;
            let d = s.toggle_mute();
            assert_eq!(s.status, before);
            assert_eq!(d, vec![Directive::SetMute(s.muted)]);
        }
        let mut fresh = PlaybackSession::new();
        fresh.toggle_mute();
        assert_eq!(fresh.status, ConnectionStatus::Disconnected);
        assert!(fresh.muted);
    }

    #[test]
    fn stale_retry_fire_after_pause_is_a_noop() {
        let mut s = PlaybackSession::new();
        s.play();
        let d = s.pipeline_event(PipelineEvent::Error);
        let generation = match d[..] {
            [Directive::ScheduleRetry { generation }] => generation,
            _ => panic!("expected ScheduleRetry"),
        };

        s.pause();
        let d = s.retry_due(generation);
        assert!(d.is_empty());
        assert_eq!(s.status, ConnectionStatus::Disconnected);
        assert_eq!(s.retry_count, 0);
    }

    #[test]
    fn full_reconnect_scenario() {
        // play → Connecting → Playing → Live → Error → StreamOffline with a
        // retry armed; reload fires; two more failures retry; a 4th error
        // leaves StreamOffline with no new timer.
        let mut s = PlaybackSession::new();

        assert_eq!(s.play(), vec![Directive::Reconnect]);
        assert_eq!(s.status, ConnectionStatus::Connecting);

        s.pipeline_event(PipelineEvent::Playing);
        assert_eq!(s.status, ConnectionStatus::Live);

        let mut d = s.pipeline_event(PipelineEvent::Error);
        assert_eq!(s.status, ConnectionStatus::StreamOffline);
        for _ in 0..2 {
            assert_eq!(fire_pending_retry(&mut s, &d), vec![Directive::Reconnect]);
            d = s.pipeline_event(PipelineEvent::Error);
        }
        assert_eq!(fire_pending_retry(&mut s, &d), vec![Directive::Reconnect]);

        let d = s.pipeline_event(PipelineEvent::Error);
        assert!(d.is_empty());
        assert_eq!(s.status, ConnectionStatus::StreamOffline);
    }
}
