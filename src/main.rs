#[tokio::main]
async fn main() -> anyhow::Result<()> {
    oseon_mcp_lib::run().await
}
