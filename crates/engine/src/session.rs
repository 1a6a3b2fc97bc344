//! Session orchestrator: the single owner of the dashboard's mutable state.
//!
//! Everything the operator sees is derived from one [`Session`]:
//! the current reading, the crop lifecycle, the pause flag and a bounded
//! log of notices.  State changes only through the entry points below;
//! presentation reads [`Snapshot`] copies.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CropProfile};
use crate::control::ControlState;
use crate::error::EngineError;
use crate::lifecycle::{LifecycleState, LifecycleView};
use crate::sim::{NoiseSource, SensorReading, SensorSimulator, SimParams};
use crate::status::{self, Evaluation, Thresholds};

/// Default number of notices retained in the ring buffer.
pub const DEFAULT_MAX_NOTICES: usize = 200;

/// Day shown at first render so the progress bar is not empty.
pub const DEFAULT_INITIAL_DAY: u32 = 12;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub initial_day: u32,
    pub initial_reading: SensorReading,
    pub thresholds: Thresholds,
    pub sim: SimParams,
    pub max_notices: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_day: DEFAULT_INITIAL_DAY,
            initial_reading: SensorReading::default(),
            thresholds: Thresholds::default(),
            sim: SimParams::default(),
            max_notices: DEFAULT_MAX_NOTICES,
        }
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kind: NoticeKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Crop,
    Control,
    Maintenance,
    Error,
    System,
}

// ---------------------------------------------------------------------------
// Snapshot (what the presentation layer receives)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub uptime_secs: u64,
    pub ticks: u64,
    pub reading: SensorReading,
    pub status: Evaluation,
    pub lifecycle: LifecycleView,
    pub control: ControlState,
    pub autonomous: bool,
    pub purge_available: bool,
    pub notices: Vec<Notice>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    catalog: Arc<Catalog>,
    simulator: SensorSimulator,
    thresholds: Thresholds,
    lifecycle: LifecycleState,
    control: ControlState,
    reading: SensorReading,
    notices: VecDeque<Notice>,
    max_notices: usize,
    started_at: Instant,
    ticks: u64,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>, settings: SessionSettings, noise: Box<dyn NoiseSource>) -> Self {
        let lifecycle = LifecycleState::seeded(catalog.first(), settings.initial_day);
        let max_notices = settings.max_notices.max(1);

        let mut session = Self {
            catalog,
            simulator: SensorSimulator::new(settings.sim, noise),
            thresholds: settings.thresholds,
            lifecycle,
            control: ControlState::default(),
            reading: settings.initial_reading,
            notices: VecDeque::with_capacity(max_notices),
            max_notices,
            started_at: Instant::now(),
            ticks: 0,
        };
        let crop = session.lifecycle.crop();
        let detail = format!(
            "session started: {} day {}/{}",
            crop.name,
            session.lifecycle.day(),
            crop.days_to_harvest
        );
        session.push_notice(NoticeKind::System, detail);
        session
    }

    // -- Entry points -------------------------------------------------------

    /// Timer tick: advance the simulated probes (frozen while paused).
    pub fn on_tick(&mut self) -> SensorReading {
        self.reading = self.simulator.advance(&self.reading, self.control.paused);
        self.ticks += 1;
        debug!(
            tick = self.ticks,
            paused = self.control.paused,
            ph = self.reading.ph,
            ec = self.reading.ec,
            temp = self.reading.temp,
            "session: tick"
        );
        self.reading
    }

    /// Switch the tower to a different crop and restart its cycle.
    ///
    /// An unknown id leaves the current crop, day and reading untouched and
    /// is recorded as an error notice.
    pub fn on_crop_selected(&mut self, crop_id: &str) -> Result<Arc<CropProfile>, EngineError> {
        let Some(crop) = self.catalog.get(crop_id) else {
            warn!(crop = %crop_id, "session: crop selection rejected: unknown id");
            let err = EngineError::NotFound(crop_id.to_string());
            self.push_notice(NoticeKind::Error, err.to_string());
            return Err(err);
        };

        self.lifecycle = LifecycleState::select(Arc::clone(&crop));

        info!(
            crop = %crop.id,
            target_ph = crop.target_ph,
            days_to_harvest = crop.days_to_harvest,
            "session: crop selected: cycle reset"
        );
        self.push_notice(
            NoticeKind::Crop,
            format!(
                "configuring system for: {}. pH set to {}",
                crop.name, crop.target_ph
            ),
        );
        Ok(crop)
    }

    pub fn toggle_pause(&mut self) -> ControlState {
        self.control = self.control.toggled();
        info!(paused = self.control.paused, "session: control toggled");
        let detail = if self.control.paused {
            "system paused"
        } else {
            "autopilot resumed"
        };
        self.push_notice(NoticeKind::Control, detail.to_string());
        self.control
    }

    /// One grow day has elapsed.  Capped at harvest; returns whether the
    /// day counter moved.
    pub fn on_day_elapsed(&mut self) -> bool {
        let moved = self.lifecycle.advance_day();
        if moved {
            let crop = self.lifecycle.crop();
            info!(
                crop = %crop.id,
                day = self.lifecycle.day(),
                days_to_harvest = crop.days_to_harvest,
                "session: day advanced"
            );
            if self.lifecycle.is_harvest_ready() {
                let detail = format!("{} is ready to harvest", crop.name);
                self.push_notice(NoticeKind::Crop, detail);
            }
        }
        moved
    }

    /// Operator asked to renew the tower's water.  Only honoured while
    /// paused; no actuator is driven, the request is logged.
    pub fn request_purge(&mut self) -> Result<(), EngineError> {
        if !self.control.purge_available() {
            warn!("session: purge rejected: system is running");
            let err = EngineError::PurgeUnavailable;
            self.push_notice(NoticeKind::Error, err.to_string());
            return Err(err);
        }
        info!("session: water purge requested");
        self.push_notice(NoticeKind::Maintenance, "water purge requested".to_string());
        Ok(())
    }

    // -- Read access --------------------------------------------------------

    pub fn reading(&self) -> SensorReading {
        self.reading
    }

    pub fn lifecycle(&self) -> &LifecycleState {
        &self.lifecycle
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Status of the current reading against the active crop.
    pub fn evaluate(&self) -> Evaluation {
        status::evaluate(&self.reading, self.lifecycle.crop(), &self.thresholds)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            ticks: self.ticks,
            reading: self.reading,
            status: self.evaluate(),
            lifecycle: self.lifecycle.view(),
            control: self.control,
            autonomous: self.control.is_autonomous(),
            purge_available: self.control.purge_available(),
            notices: self.notices.iter().rev().cloned().collect(),
        }
    }

    fn push_notice(&mut self, kind: NoticeKind, detail: String) {
        if self.notices.len() >= self.max_notices {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            ts: OffsetDateTime::now_utc(),
            kind,
            detail,
        });
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tests::ScriptedNoise;
    use crate::sim::FastrandNoise;
    use crate::status::Status;

    fn session_with(noise: Box<dyn NoiseSource>, settings: SessionSettings) -> Session {
        Session::new(Arc::new(Catalog::builtin()), settings, noise)
    }

    fn test_session() -> Session {
        session_with(Box::new(FastrandNoise::with_seed(5)), SessionSettings::default())
    }

    fn last_notice(session: &Session) -> &Notice {
        session.notices().last().expect("at least one notice")
    }

    #[test]
    fn starts_on_first_crop_mid_cycle() {
        let session = test_session();
        assert_eq!(session.lifecycle().crop().id, "lettuce");
        assert_eq!(session.lifecycle().day(), 12);
        assert!(!session.control().paused);
        assert_eq!(session.reading(), SensorReading::default());
        assert_eq!(last_notice(&session).kind, NoticeKind::System);
    }

    #[test]
    fn tick_with_scripted_noise() {
        let mut session = session_with(
            Box::new(ScriptedNoise::new(&[0.0, 0.5])),
            SessionSettings::default(),
        );
        let next = session.on_tick();
        assert_eq!(
            next,
            SensorReading {
                ph: 5.8,
                ec: 1.2,
                temp: 24.5
            }
        );
        assert_eq!(session.evaluate().ph, Status::Nominal);
        assert_eq!(session.snapshot().ticks, 1);
    }

    #[test]
    fn paused_ticks_freeze_reading() {
        let mut session = test_session();
        session.on_tick();
        let frozen = session.reading();
        session.toggle_pause();
        for _ in 0..10 {
            assert_eq!(session.on_tick(), frozen);
        }
        assert_eq!(session.snapshot().ticks, 11);
    }

    #[test]
    fn off_target_reading_needs_attention() {
        let settings = SessionSettings {
            initial_reading: SensorReading {
                ph: 6.1,
                ec: 1.2,
                temp: 24.0,
            },
            ..SessionSettings::default()
        };
        let session = session_with(Box::new(FastrandNoise::with_seed(1)), settings);
        assert_eq!(session.evaluate().ph, Status::AttentionNeeded);
        assert!(session.snapshot().status.needs_attention());
    }

    #[test]
    fn selecting_crop_resets_cycle_and_publishes_notice() {
        let mut session = test_session();
        let crop = session.on_crop_selected("basil").unwrap();
        assert_eq!(crop.id, "basil");
        assert_eq!(session.lifecycle().crop().id, "basil");
        assert_eq!(session.lifecycle().day(), 1);

        let notice = last_notice(&session);
        assert_eq!(notice.kind, NoticeKind::Crop);
        assert_eq!(notice.detail, "configuring system for: Basil. pH set to 6");
    }

    #[test]
    fn reselecting_same_crop_restarts_cycle() {
        let mut session = test_session();
        session.on_crop_selected("lettuce").unwrap();
        session.on_day_elapsed();
        session.on_day_elapsed();
        assert_eq!(session.lifecycle().day(), 3);
        session.on_crop_selected("lettuce").unwrap();
        assert_eq!(session.lifecycle().day(), 1);
    }

    #[test]
    fn unknown_crop_leaves_state_unchanged() {
        let mut session = test_session();
        session.on_tick();
        let before_lifecycle = session.lifecycle().clone();
        let before_reading = session.reading();

        let err = session.on_crop_selected("Strawberry").unwrap_err();
        assert_eq!(err, EngineError::NotFound("Strawberry".into()));
        assert_eq!(session.lifecycle(), &before_lifecycle);
        assert_eq!(session.reading(), before_reading);

        let notice = last_notice(&session);
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.detail.contains("Strawberry"));
    }

    #[test]
    fn crop_switch_between_ticks_uses_new_target() {
        let settings = SessionSettings {
            initial_reading: SensorReading {
                ph: 5.5,
                ec: 1.8,
                temp: 24.0,
            },
            ..SessionSettings::default()
        };
        let mut session = session_with(Box::new(ScriptedNoise::new(&[0.0, 0.0])), settings);
        // 5.5 is 0.3 below lettuce's 5.8
        assert_eq!(session.evaluate().ph, Status::AttentionNeeded);
        session.on_crop_selected("petunia").unwrap();
        session.on_tick();
        assert_eq!(session.evaluate().ph, Status::Nominal);
    }

    #[test]
    fn toggle_pause_twice_restores_state() {
        let mut session = test_session();
        let original = session.control();
        assert!(session.toggle_pause().paused);
        assert_eq!(session.toggle_pause(), original);
        assert_eq!(last_notice(&session).detail, "autopilot resumed");
    }

    #[test]
    fn day_elapsed_caps_at_harvest() {
        let settings = SessionSettings {
            initial_day: 44,
            ..SessionSettings::default()
        };
        let mut session = session_with(Box::new(FastrandNoise::with_seed(2)), settings);
        assert!(session.on_day_elapsed());
        assert!(!session.on_day_elapsed());
        assert_eq!(session.lifecycle().day(), 45);
        assert_eq!(session.snapshot().lifecycle.progress, 1.0);
        assert!(last_notice(&session).detail.contains("ready to harvest"));
    }

    #[test]
    fn purge_only_while_paused() {
        let mut session = test_session();
        assert_eq!(session.request_purge(), Err(EngineError::PurgeUnavailable));
        assert_eq!(last_notice(&session).kind, NoticeKind::Error);

        session.toggle_pause();
        assert!(session.snapshot().purge_available);
        session.request_purge().unwrap();
        assert_eq!(last_notice(&session).kind, NoticeKind::Maintenance);
    }

    #[test]
    fn notices_ring_buffer_is_bounded() {
        let settings = SessionSettings {
            max_notices: 3,
            ..SessionSettings::default()
        };
        let mut session = session_with(Box::new(FastrandNoise::with_seed(3)), settings);
        for _ in 0..10 {
            session.toggle_pause();
        }
        assert_eq!(session.notices().count(), 3);
    }

    #[test]
    fn snapshot_lists_newest_notice_first() {
        let mut session = test_session();
        session.on_crop_selected("strawberry").unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.notices[0].kind, NoticeKind::Crop);
        assert_eq!(snap.notices.last().unwrap().kind, NoticeKind::System);
        assert_eq!(snap.lifecycle.crop_id, "strawberry");
        assert!(snap.autonomous);
        assert!(!snap.purge_available);
    }

    #[test]
    fn snapshot_serializes() {
        let json = serde_json::to_value(test_session().snapshot()).unwrap();
        assert_eq!(json["lifecycle"]["day"], 12);
        assert_eq!(json["status"]["ph"], "nominal");
        assert_eq!(json["control"]["paused"], false);
        assert_eq!(json["notices"][0]["kind"], "system");
        assert!(json["notices"][0]["ts"].is_string());
    }
}
