use finance_chat_agent::{
    agent::{AgentSettings, FinanceAgent},
    api::start_server,
    config::AppConfig,
    llm::build_chat_model,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("⚠️  {}", e);
        eprintln!("📌 See .env.example for setup instructions");
        e
    })?;

    info!("🚀 Your Finance Bro - API Server");
    info!("📍 Address: {}", config.bind_addr());
    info!("🤖 Model: {}", config.llm_model);

    // Built once and shared by every request
    let model = build_chat_model(&config)?;
    let agent = Arc::new(FinanceAgent::new(
        model,
        AgentSettings {
            temperature: config.temperature,
            context: config.context.clone(),
            history: config.history.clone(),
        },
    ));

    info!("✅ Agent initialized");
    info!("📡 Starting API server...");

    start_server(agent, config.api_base_url.clone(), &config.bind_addr()).await?;

    Ok(())
}
