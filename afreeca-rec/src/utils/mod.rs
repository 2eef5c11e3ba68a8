pub mod cookies;
pub mod fs;
pub mod http_client;
