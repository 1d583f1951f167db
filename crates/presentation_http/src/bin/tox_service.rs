//! Toxicity and profanity service

use infrastructure::ServiceKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    presentation_http::server::run(ServiceKind::Toxicity).await
}
