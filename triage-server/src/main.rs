use triage_server::{TriageConfig, run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let config = TriageConfig::from_env()?;
    telemetry::init_tracing(config.log_format);

    run_server(config).await
}
