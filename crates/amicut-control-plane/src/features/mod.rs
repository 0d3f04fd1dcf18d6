pub mod access_control;
pub mod build_dispatch;
pub mod commands;
pub mod edp_resolution;
pub mod fleet_report;
pub mod inventory;
pub mod observability;
pub mod version_sets;
