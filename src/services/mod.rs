pub mod exif_service;
pub mod memory_store;
pub mod storage_service;
