// Library target shared by the binary, the integration tests and the
// criterion benchmarks.
pub mod app;
pub mod config;
pub mod event;
pub mod quiz;
pub mod source;
pub mod ui;
