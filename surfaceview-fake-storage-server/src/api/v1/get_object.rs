use actix_web::{get, web, HttpResponse};
use log::error;
use serde::Deserialize;
use surfaceview_objects_store::BlobStore;

use crate::{
    api::{error_response, object_resource},
    state::ApiState,
};

#[derive(Debug, Deserialize)]
pub struct GetObjectQuery {
    pub alt: Option<String>,
}

/// Object metadata, or the object bytes with `alt=media`.
#[get("/storage/v1/b/{bucket}/o/{object}")]
pub async fn v1_get_object(
    state: web::Data<ApiState>,
    path: web::Path<(String, String)>,
    query: web::Query<GetObjectQuery>,
) -> HttpResponse {
    let (bucket, name) = path.into_inner();

    let blob = match state.store.get_blob(&bucket, &name) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            return error_response(404, format!("No such object: {}/{}", bucket, name));
        }
        Err(e) => {
            error!("failed to read {}/{}: {}", bucket, name, e);
            return error_response(500, e.to_string());
        }
    };

    match query.alt.as_deref() {
        Some("media") => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(blob),
        None | Some("json") => {
            HttpResponse::Ok().json(object_resource(&bucket, &name, blob.len()))
        }
        Some(alt) => error_response(400, format!("Invalid alt value: {}", alt)),
    }
}
