// Application layer - Use cases and pure scene building
pub mod animation;
pub mod dataset_repository;
pub mod dataset_service;
pub mod scene_composer;
pub mod session;
pub mod spatial_mapper;
pub mod time_alignment;
pub mod trace_builder;
pub mod visual_encoder;
pub mod waterfall;
