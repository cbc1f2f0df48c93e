// Jolie chat backend server

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jolie_server_lib::run().await
}
