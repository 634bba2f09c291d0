use actix_web::{post, web, HttpResponse};
use log::{error, info};
use serde::Deserialize;
use surfaceview_objects_store::BlobStore;

use crate::{
    api::{error_response, object_resource},
    state::ApiState,
};

#[derive(Debug, Deserialize)]
pub struct UploadObjectQuery {
    #[serde(rename = "uploadType")]
    pub upload_type: Option<String>,
    pub name: Option<String>,
}

/// Simple media upload. Multipart and resumable uploads are rejected.
#[post("/upload/storage/v1/b/{bucket}/o")]
pub async fn v1_upload_object(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    query: web::Query<UploadObjectQuery>,
    body: web::Bytes,
) -> HttpResponse {
    let bucket = path.into_inner();

    if query.upload_type.as_deref() != Some("media") {
        return error_response(
            400,
            format!("Unsupported uploadType: {:?}", query.upload_type),
        );
    }
    let Some(name) = query.name.as_deref() else {
        return error_response(400, "Missing name".to_string());
    };

    if let Err(e) = state.store.save_blob(&bucket, name, &body) {
        error!("failed to write {}/{}: {}", bucket, name, e);
        return error_response(500, e.to_string());
    }
    info!("stored {}/{} ({} bytes)", bucket, name, body.len());

    HttpResponse::Ok().json(object_resource(&bucket, name, body.len()))
}
