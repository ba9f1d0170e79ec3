use rask_log_shipper::app::{App, Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        // Prints usage or help and exits with clap's status code.
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };
    App::new(config).run().await?;
    Ok(())
}
