use std::net::TcpListener;

use tempfile::TempDir;
use tokio::runtime::{Builder, Runtime};

/// Starts the fake storage server on a free port.
///
/// The server lives as long as the returned runtime; blobs go to the returned directory.
pub fn start_fake_storage_server() -> (Runtime, TempDir, String) {
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let tempdir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let base_path = tempdir.path().to_path_buf();
    runtime.spawn(async move {
        surfaceview_fake_storage_server::api::run_server_with_listener(base_path, listener)
            .await
            .unwrap();
    });

    (runtime, tempdir, base_url)
}
