pub mod calendar;
pub mod config;
pub mod demo;
pub mod fetch;
pub mod history;
pub mod http;
pub mod output;
pub mod scoring;
pub mod timeline;
pub mod weather;
