// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_repository;
pub mod http_response;
pub mod png_export;
pub mod projection;
pub mod scene_stream;
