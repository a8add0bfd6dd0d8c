//! # scout-cli
//!
//! Local driver for the Scout2Retire chat core. Opens the SQLite store,
//! optionally seeds demo data, then prints as JSON:
//! - the lobby summary (counts, unread totals, favorites)
//! - the general lounge thread view
//! - onboarding progress and the step list

mod demo;

use std::sync::Arc;

use scout_chat::backend::SqliteBackend;
use scout_chat::events::notice_channel;
use scout_chat::onboarding::OnboardingSession;
use scout_chat::resolver::Selection;
use scout_chat::{ChatConfig, ChatSession};
use scout_shared::types::UserId;
use scout_store::Database;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Report<'a> {
    viewer: &'a UserId,
    lobby: scout_chat::lobby::LobbySummary,
    lounge: Option<scout_chat::session::ThreadView>,
    onboarding: OnboardingReport,
}

#[derive(Serialize)]
struct OnboardingReport {
    state: scout_chat::onboarding::OnboardingState,
    progress: scout_shared::onboarding::OnboardingProgress,
    steps: Vec<scout_chat::onboarding::StepEntry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    scout_chat::init_tracing();
    info!("Starting scout-cli v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ChatConfig::from_env();
    info!(?config, "Loaded configuration");

    let viewer = config
        .viewer_id
        .clone()
        .unwrap_or_else(|| UserId::new(demo::DEMO_VIEWER));

    // -----------------------------------------------------------------------
    // 3. Open the store, seeding demo data when asked
    // -----------------------------------------------------------------------
    let mut db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if config.seed_demo && !demo::is_seeded(&db)? {
        demo::seed(&mut db, &viewer)?;
    }

    let backend = Arc::new(SqliteBackend::new(db, config.message_limit));
    let policy = config.request_policy();
    let (tx, mut notices) = notice_channel();

    // -----------------------------------------------------------------------
    // 4. Drive a chat session and an onboarding session
    // -----------------------------------------------------------------------
    let session = ChatSession::new(viewer.clone(), backend.clone(), policy.clone(), tx.clone());
    let lobby = session.load_lobby().await?;
    session.select(Selection::GeneralLounge).await?;
    let lounge = session.thread_view().await;

    let mut onboarding = OnboardingSession::new(viewer.clone(), backend, policy, tx);
    let state = onboarding.load().await?;
    let flow = onboarding.flow();

    let report = Report {
        viewer: &viewer,
        lobby,
        lounge,
        onboarding: OnboardingReport {
            state,
            progress: flow.progress(),
            steps: flow.steps(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    // -----------------------------------------------------------------------
    // 5. Flush notices raised along the way
    // -----------------------------------------------------------------------
    while let Ok(notice) = notices.try_recv() {
        tracing::warn!(level = ?notice.level, text = %notice.text, "Notice");
    }

    Ok(())
}
