use std::{net::TcpListener, path::PathBuf};

use actix_web::{web, App, HttpResponse, HttpServer};
use log::info;

use crate::state::ApiState;

use self::v1::get_object::v1_get_object;
use self::v1::upload_object::v1_upload_object;

pub mod v1;

const MAX_UPLOAD_SIZE: usize = 256 * 1024 * 1024;

pub struct ServerConfig {
    pub base_path: PathBuf,
    pub port: u16,
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.port))?;
    run_server_with_listener(config.base_path, listener).await
}

/// Serves on an already bound listener; bind to port 0 to let the OS pick one.
pub async fn run_server_with_listener(
    base_path: PathBuf,
    listener: TcpListener,
) -> std::io::Result<()> {
    info!(
        "fake storage server on {:?}, blobs in {}",
        listener.local_addr()?,
        base_path.display()
    );
    let state = ApiState::new(base_path);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_SIZE))
            .service(v1_get_object)
            .service(v1_upload_object)
    })
    .listen(listener)?
    .run();
    server.await
}

pub(crate) fn error_response(code: u16, message: String) -> HttpResponse {
    let body = serde_json::json!({
        "error": {
            "code": code,
            "message": message,
        }
    });
    match code {
        400 => HttpResponse::BadRequest().json(body),
        404 => HttpResponse::NotFound().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub(crate) fn object_resource(bucket: &str, name: &str, size: usize) -> serde_json::Value {
    serde_json::json!({
        "kind": "storage#object",
        "id": format!("{}/{}", bucket, name),
        "bucket": bucket,
        "name": name,
        "size": size.to_string(),
        "contentType": "application/octet-stream",
    })
}
