//! PlayerCore — single-owner event loop for the stream playback controller.
//!
//! All inputs arrive as [`PlayerEvent`] messages on one mpsc channel: user
//! commands from the TUI, raw mpv events forwarded by the reader task, and
//! retry-timer fires.  PlayerCore owns the [`PlaybackSession`] and the
//! [`MpvDriver`] exclusively; no other task touches them, so state updates
//! apply in message-arrival order.
//!
//! The session state machine is pure (`kirtan_core::session`); this loop
//! translates mpv notifications into [`PipelineEvent`]s, feeds them in, and
//! executes the [`Directive`]s that come back.

use std::collections::VecDeque;

use kirtan_core::session::{Directive, PipelineEvent, PlaybackSession, RETRY_DELAY};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::mpv::{
    MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_ICY_TITLE, OBS_ICY_TITLE_DIRECT,
    OBS_PAUSED_FOR_CACHE,
};
use crate::BroadcastMessage;

// ── PlayerEvent ───────────────────────────────────────────────────────────────

/// User-initiated playback commands.
#[derive(Debug, Clone, Copy)]
pub enum PlayerCommand {
    TogglePlay,
    ToggleMute,
}

/// All inputs into the PlayerCore loop.
#[derive(Debug)]
pub enum PlayerEvent {
    Command(PlayerCommand),
    /// Raw mpv unsolicited event (forwarded from the reader task).
    Mpv(MpvEvent),
    /// The 2-second retry timer fired.  Carries the session generation it
    /// was armed under; a stale fire is dropped by the session.
    RetryDue { generation: u64 },
}

// ── PlayerCore ────────────────────────────────────────────────────────────────

pub struct PlayerCore {
    stream_url: String,
    session: PlaybackSession,
    driver: MpvDriver,
    /// Live handle to the mpv IO tasks.  `None` until first play.
    handle: Option<MpvHandle>,
    /// Channel used to feed retry fires and mpv events back into the loop.
    event_tx: mpsc::Sender<PlayerEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    /// Last observed core-idle value, to suppress duplicate transitions.
    obs_core_idle: Option<bool>,
    /// Last ICY title broadcast (to avoid duplicate IcyUpdated).
    last_icy: Option<String>,
}

impl PlayerCore {
    pub fn new(
        stream_url: String,
        mpv_binary: Option<std::path::PathBuf>,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<PlayerEvent>,
    ) -> Self {
        Self {
            stream_url,
            session: PlaybackSession::new(),
            driver: MpvDriver::new(mpv_binary),
            handle: None,
            event_tx,
            broadcast_tx,
            obs_core_idle: None,
            last_icy: None,
        }
    }

    /// Run the core event loop.  Returns when the event channel closes
    /// (the TUI exited).
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<PlayerEvent>) -> anyhow::Result<()> {
        info!("PlayerCore: starting event loop");
        self.publish();

        while let Some(evt) = event_rx.recv().await {
            match evt {
                PlayerEvent::Command(cmd) => {
                    info!("PlayerCore: command {:?}", cmd);
                    let directives = match cmd {
                        PlayerCommand::TogglePlay => {
                            if self.session.playing {
                                self.session.pause()
                            } else {
                                self.session.play()
                            }
                        }
                        PlayerCommand::ToggleMute => self.session.toggle_mute(),
                    };
                    self.run_directives(directives).await;
                    self.publish();
                }

                PlayerEvent::RetryDue { generation } => {
                    let directives = self.session.retry_due(generation);
                    if directives.is_empty() {
                        debug!("PlayerCore: stale retry fire (gen {})", generation);
                    } else {
                        info!(
                            "PlayerCore: auto-retry {} of {}",
                            self.session.retry_count,
                            kirtan_core::session::MAX_AUTO_RETRIES
                        );
                        self.push_log(format!(
                            "reconnecting (attempt {})",
                            self.session.retry_count
                        ));
                    }
                    self.run_directives(directives).await;
                    self.publish();
                }

                PlayerEvent::Mpv(evt) => self.handle_mpv_event(evt).await,
            }
        }

        info!("PlayerCore: event channel closed, shutting down");
        self.cleanup().await;
        Ok(())
    }

    // ── mpv event translation ─────────────────────────────────────────────────

    /// True while the user wants audio — the states in which pipeline
    /// notifications are meaningful.
    fn intends_playback(&self) -> bool {
        use kirtan_core::session::ConnectionStatus::*;
        matches!(self.session.status, Connecting | Live | StreamOffline)
    }

    async fn handle_mpv_event(&mut self, evt: MpvEvent) {
        if let Some((obs_id, data)) = evt.as_property_change() {
            match obs_id {
                OBS_CORE_IDLE => {
                    let val = data.as_bool();
                    if val == self.obs_core_idle {
                        return;
                    }
                    debug!("mpv: core-idle → {:?}", val);
                    self.obs_core_idle = val;
                    match val {
                        Some(false) => self.pipeline(PipelineEvent::Playing).await,
                        // Idle again mid-playback is a stall, not an error;
                        // end-file decides whether the stream actually died.
                        Some(true) if self.session.playing => {
                            self.pipeline(PipelineEvent::Buffering).await
                        }
                        _ => {}
                    }
                }
                OBS_PAUSED_FOR_CACHE => {
                    if data.as_bool() == Some(true) && self.intends_playback() {
                        debug!("mpv: paused-for-cache");
                        self.pipeline(PipelineEvent::Buffering).await;
                    }
                }
                OBS_ICY_TITLE | OBS_ICY_TITLE_DIRECT => {
                    let raw = match data {
                        serde_json::Value::String(s) => Some(s.clone()),
                        _ => None,
                    };
                    let val = filter_icy_title(raw);
                    if val != self.last_icy {
                        info!("mpv: icy-title {:?} → {:?}", self.last_icy, val);
                        self.last_icy = val.clone();
                        let _ = self.broadcast_tx.send(BroadcastMessage::IcyUpdated(val));
                    }
                }
                _ => {}
            }
            return;
        }

        match evt.event_name() {
            Some("end-file") => {
                let reason = evt.end_file_reason().unwrap_or("unknown");
                info!("mpv: end-file reason={}", reason);
                // "stop" is our own Stop directive coming back; anything else
                // while playback is intended means the stream dropped.
                if reason != "stop" && self.intends_playback() {
                    self.push_log(format!("stream ended ({})", reason));
                    self.pipeline(PipelineEvent::Error).await;
                }
                if self.last_icy.is_some() {
                    self.last_icy = None;
                    let _ = self.broadcast_tx.send(BroadcastMessage::IcyUpdated(None));
                }
            }
            Some("start-file") => {
                debug!("mpv: start-file");
                self.obs_core_idle = None;
            }
            _ => {}
        }
    }

    async fn pipeline(&mut self, event: PipelineEvent) {
        let directives = self.session.pipeline_event(event);
        debug!("pipeline {event:?}: status is now {}", self.session.status);
        self.run_directives(directives).await;
        self.publish();
    }

    // ── directive execution ───────────────────────────────────────────────────

    async fn run_directives(&mut self, directives: Vec<Directive>) {
        let mut queue: VecDeque<Directive> = directives.into();
        while let Some(d) = queue.pop_front() {
            match d {
                Directive::Reconnect => {
                    let muted = self.session.muted;
                    match self.ensure_handle().await {
                        Some(handle) => {
                            if let Err(e) = handle.load_stream(&self.stream_url).await {
                                warn!("PlayerCore: loadfile failed: {}", e);
                                self.push_log(format!("failed to load stream: {}", e));
                                queue.extend(self.session.pipeline_event(PipelineEvent::Error));
                            } else if muted {
                                let _ = handle.set_mute(true).await;
                            }
                        }
                        None => {
                            queue.extend(self.session.pipeline_event(PipelineEvent::Error));
                        }
                    }
                }
                Directive::Stop => {
                    if let Some(handle) = self.handle.as_ref() {
                        if let Err(e) = handle.stop().await {
                            warn!("PlayerCore: stop failed: {}", e);
                        }
                    }
                    if self.last_icy.take().is_some() {
                        let _ = self.broadcast_tx.send(BroadcastMessage::IcyUpdated(None));
                    }
                }
                Directive::ScheduleRetry { generation } => {
                    debug!("PlayerCore: arming retry timer (gen {})", generation);
                    let tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(RETRY_DELAY).await;
                        let _ = tx.send(PlayerEvent::RetryDue { generation }).await;
                    });
                }
                Directive::SetMute(muted) => {
                    if let Some(handle) = self.handle.as_ref() {
                        if let Err(e) = handle.set_mute(muted).await {
                            warn!("PlayerCore: set_mute failed: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn ensure_handle(&mut self) -> Option<MpvHandle> {
        if self.handle.is_some() && !self.driver.process_alive() {
            warn!("PlayerCore: mpv process died, dropping handle");
            self.handle = None;
            self.obs_core_idle = None;
        }

        if self.handle.is_none() {
            // One forwarder task per connection: mpv reader → PlayerEvent.
            let (event_tx, mut event_rx) = mpsc::channel::<MpvEvent>(64);
            let core_tx = self.event_tx.clone();
            tokio::spawn(async move {
                while let Some(evt) = event_rx.recv().await {
                    if core_tx.send(PlayerEvent::Mpv(evt)).await.is_err() {
                        break;
                    }
                }
            });

            match self.driver.spawn_and_connect(event_tx).await {
                Ok(handle) => {
                    handle.observe_all_properties().await;
                    self.handle = Some(handle);
                }
                Err(e) => {
                    warn!("PlayerCore: failed to start mpv: {}", e);
                    self.push_log(format!("could not start mpv: {}", e));
                    return None;
                }
            }
        }

        self.handle.clone()
    }

    // ── helpers ───────────────────────────────────────────────────────────────

    fn publish(&self) {
        let _ = self
            .broadcast_tx
            .send(BroadcastMessage::Session(self.session.clone()));
    }

    fn push_log(&self, message: String) {
        let _ = self.broadcast_tx.send(BroadcastMessage::Log(message));
    }

    async fn cleanup(&mut self) {
        info!("PlayerCore: cleanup, killing mpv");
        if let Some(handle) = self.handle.take() {
            let _ = handle.stop().await;
        }
        self.driver.kill().await;
    }
}

/// Drop stream titles that carry no information (empty or dash padding).
fn filter_icy_title(raw: Option<String>) -> Option<String> {
    raw.filter(|t| !t.trim().trim_matches('-').trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icy_filter_drops_padding() {
        assert_eq!(filter_icy_title(None), None);
        assert_eq!(filter_icy_title(Some("".into())), None);
        assert_eq!(filter_icy_title(Some(" - ".into())), None);
        assert_eq!(filter_icy_title(Some("---".into())), None);
        assert_eq!(
            filter_icy_title(Some("Asa Di Var".into())),
            Some("Asa Di Var".to_string())
        );
    }
}
