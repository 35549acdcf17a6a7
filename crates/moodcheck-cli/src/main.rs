use anyhow::Result;
use moodcheck_cli::{build_command, execute, init_tracing, resolve};
use moodcheck_gateway::PersistenceGateway;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_command().get_matches();
    let invocation = resolve(&matches)?;
    init_tracing(invocation.log_json);

    tracing::debug!(
        api = %invocation.config.api_base_url,
        data_dir = %invocation.config.data_dir.display(),
        "Starting moodcheck"
    );

    let gateway = PersistenceGateway::from_config(&invocation.config)?;
    let mut stdout = std::io::stdout().lock();
    execute(invocation.action, &gateway, &mut stdout).await
}
