use pi_thermostat_controller::host;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
