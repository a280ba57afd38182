#[tokio::main]
async fn main() -> eyre::Result<()> {
    linkout_api::run().await
}
