use surfaceview_fake_storage_server::api::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let config = ServerConfig {
        base_path: std::path::PathBuf::from("/tmp/surfaceview-fake-storage"),
        port: 4443,
    };
    run_server(config).await
}
