use finance_chat_agent::{
    agent::{AgentSettings, FinanceAgent},
    config::AppConfig,
    llm::build_chat_model,
    models::FinanceInfo,
};
use futures::StreamExt;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: ask <finance.json> <question...>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the reply
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let finance_path = args.next().ok_or(USAGE)?;
    let question = args.collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        return Err(USAGE.into());
    }

    let config = AppConfig::from_env()?;
    let raw = std::fs::read_to_string(&finance_path)?;
    let finance_info: FinanceInfo = serde_json::from_str(&raw)?;

    info!(file = %finance_path, model = %config.llm_model, "Running one-shot query");

    let agent = FinanceAgent::new(
        build_chat_model(&config)?,
        AgentSettings {
            temperature: config.temperature,
            context: config.context.clone(),
            history: config.history.clone(),
        },
    );

    let mut replies = agent.respond(&question, &finance_info, &[]).await?;

    // Each reply is cumulative; print only what is new
    let mut printed = 0;
    let mut stdout = std::io::stdout();
    while let Some(reply) = replies.next().await {
        let text = reply?.response_text;
        if let Some(delta) = text.get(printed..) {
            write!(stdout, "{}", delta)?;
            stdout.flush()?;
        }
        printed = text.len();
    }
    writeln!(stdout)?;

    Ok(())
}
