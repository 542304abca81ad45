pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_cache_adapter;
pub mod sqlite_cache_adapter;
