mod config;
mod state;
mod ticker;
mod web;

use anyhow::{Context, Result};
use std::{env, net::SocketAddr, path::Path};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

const DEFAULT_CONFIG_PATH: &str = "airmind.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Env config ──────────────────────────────────────────────────
    let port: u16 = env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // ── Config file (optional unless named explicitly) ──────────────
    let cfg = match env::var("CONFIG_PATH") {
        Ok(path) => config::load(&path)?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => config::load(DEFAULT_CONFIG_PATH)?,
        Err(_) => {
            warn!("no {DEFAULT_CONFIG_PATH} found, using built-in defaults");
            let cfg = Config::default();
            cfg.validate()?;
            cfg
        }
    };

    // ── Session ─────────────────────────────────────────────────────
    // A corrupt catalog aborts start-up here.
    let app = AppState::from_config(&cfg).context("failed to initialise session")?;
    {
        let st = app.session.read().await;
        let crop = st.lifecycle().crop();
        info!(
            crops = st.catalog().len(),
            crop = %crop.id,
            day = st.lifecycle().day(),
            days_to_harvest = crop.days_to_harvest,
            "session ready"
        );
    }

    // ── Periodic tasks ──────────────────────────────────────────────
    let sensor_tick = ticker::spawn_sensor_tick(app.session.clone(), cfg.tick_interval());
    let day_clock = cfg
        .day_length()
        .map(|len| ticker::spawn_day_clock(app.session.clone(), len));

    // ── Web API ─────────────────────────────────────────────────────
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let result = web::serve(app, addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await;

    // ── Teardown ────────────────────────────────────────────────────
    sensor_tick.cancel().await;
    if let Some(clock) = day_clock {
        clock.cancel().await;
    }

    result
}
