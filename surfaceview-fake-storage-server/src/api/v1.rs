pub mod get_object;
pub mod upload_object;
