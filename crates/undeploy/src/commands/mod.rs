pub mod check_whitelist;
pub mod clean_network;
pub mod destroy;
pub mod find_zone;
