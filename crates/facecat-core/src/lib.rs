pub mod config;
pub mod logging;

pub mod catalog;
pub mod dispatch;
pub mod groups;
pub mod remote;
pub mod retry;
pub mod scan;
pub mod service;
pub mod training;
