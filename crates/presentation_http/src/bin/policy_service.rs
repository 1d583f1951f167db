//! Policy guard service

use infrastructure::ServiceKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    presentation_http::server::run(ServiceKind::Policy).await
}
