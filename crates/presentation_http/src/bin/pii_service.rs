//! PII protection service

use infrastructure::ServiceKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    presentation_http::server::run(ServiceKind::Pii).await
}
