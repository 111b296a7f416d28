use std::sync::Arc;

use stepwise_chains::ConversationChain;
use stepwise_core::Retrying;
use stepwise_llm::{OpenAiCompletionClient, DEFAULT_MODEL};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepwise_chains=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = OpenAiCompletionClient::builder()
        .api_key(std::env::var("OPENAI_API_KEY")?)
        .model(std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()))
        .temperature(0.7)
        .build()?;
    let chain = ConversationChain::new(Arc::new(Retrying::new(client, 3)));
    chain.validate()?;

    println!("Type a message, or an empty line to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let reply = chain.predict("demo", line).await?;
        println!("AI: {}", reply.trim());
    }

    Ok(())
}
