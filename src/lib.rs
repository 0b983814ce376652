// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod document;
pub mod goal;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod word_count;
