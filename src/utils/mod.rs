pub mod db_utils;
pub mod uid_cache;
pub mod uid_filter;
