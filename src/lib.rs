pub mod check;
pub mod config;
pub mod manifest;
pub mod report;
pub mod scan;
pub mod version;
