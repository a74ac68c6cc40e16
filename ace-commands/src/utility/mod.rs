pub mod charinfo;
pub mod help;
pub mod info;
pub mod ping;
