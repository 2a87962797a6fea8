//! Wiring & DI. Entry point: bootstrap adapters, inject into services, serve HTTP.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weekwise::adapters::ai::{MockAiAdapter, OpenAiAdapter};
use weekwise::adapters::http::router;
use weekwise::adapters::identity::{StaticIdentityAdapter, SupabaseAuthAdapter};
use weekwise::adapters::persistence::SqliteRepo;
use weekwise::domain::UsageGate;
use weekwise::ports::{AiPort, EventStorePort, IdentityPort, ProfilePort, ScheduleApi};
use weekwise::shared::config::AppConfig;
use weekwise::usecases::{EntitlementService, PlannerService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        AppConfig::default()
    });
    let bind_addr = cfg.bind_addr_or_default();
    weekwise::adapters::ui::init_ui(&bind_addr);

    // --- Persistence: profiles (usage counter) + saved weeks ---
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let sqlite_repo = Arc::new(
        SqliteRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let profiles: Arc<dyn ProfilePort> = Arc::clone(&sqlite_repo) as Arc<dyn ProfilePort>;
    let store: Arc<dyn EventStorePort> = Arc::clone(&sqlite_repo) as Arc<dyn EventStorePort>;

    for user_id in cfg.premium_user_ids() {
        profiles
            .set_premium(&user_id, true)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }

    // --- Identity: Supabase when configured, else static dev tokens ---
    let identity: Arc<dyn IdentityPort> = match (cfg.supabase_url(), cfg.supabase_anon_key()) {
        (Some(url), Some(anon_key)) => {
            info!(url = %url, "identity via Supabase auth");
            Arc::new(SupabaseAuthAdapter::new(&url, anon_key))
        }
        _ => {
            let tokens = StaticIdentityAdapter::parse(cfg.static_tokens.as_deref().unwrap_or(""));
            if tokens.is_empty() {
                warn!("no identity service configured; every request will be unauthorized");
            } else {
                warn!(tokens = tokens.len(), "identity via static development tokens");
            }
            Arc::new(tokens)
        }
    };

    // --- AI: real model, mock, or absent (AI routes answer 503) ---
    let ai: Option<Arc<dyn AiPort>> = if cfg.is_ai_mock() {
        warn!("WEEKWISE_AI_MOCK set, using mock AI adapter");
        Some(Arc::new(MockAiAdapter::new()))
    } else if cfg.is_ai_configured() {
        info!(
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            "AI enabled with OpenAI adapter"
        );
        Some(Arc::new(OpenAiAdapter::new(
            cfg.ai_api_url_or_default(),
            cfg.ai_api_key().unwrap_or_default(),
            cfg.ai_model_or_default(),
        )))
    } else {
        warn!("no AI API key set; AI routes will answer 503");
        None
    };

    // --- Services ---
    let gate = UsageGate::new(cfg.free_limit_or_default());
    info!(free_limit = gate.free_limit(), "usage gate configured");
    let entitlements = Arc::new(EntitlementService::new(identity, profiles, gate));
    let planner: Arc<dyn ScheduleApi> = Arc::new(PlannerService::new(entitlements, ai, store));

    // --- Serve ---
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {}: {}", bind_addr, e))?;
    info!(addr = %bind_addr, "listening");
    axum::serve(listener, router(planner))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}
