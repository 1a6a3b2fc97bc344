use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use airmind_engine::assistant::ReplyProvider;
use airmind_engine::{FastrandNoise, Session};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Public type aliases
// ---------------------------------------------------------------------------

/// The one session, shared between the ticker(s) and the web handlers.
/// Every mutation holds the write lock for its whole duration, so ticks and
/// operator actions never interleave.
pub type SharedSession = Arc<RwLock<Session>>;

pub type SharedAssistant = Arc<Mutex<Box<dyn ReplyProvider>>>;

// ---------------------------------------------------------------------------
// Application state handed to axum
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub assistant: SharedAssistant,
    pub reply_delay: Duration,
}

impl AppState {
    pub fn new(session: Session, assistant: Box<dyn ReplyProvider>, reply_delay: Duration) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            assistant: Arc::new(Mutex::new(assistant)),
            reply_delay,
        }
    }

    /// Build the session and assistant described by a validated config.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let catalog = Arc::new(cfg.catalog()?);
        let session = Session::new(
            catalog,
            cfg.session_settings(),
            Box::new(FastrandNoise::new()),
        );
        let assistant = cfg.assistant()?;
        Ok(Self::new(session, Box::new(assistant), cfg.reply_delay()))
    }
}
