pub mod aqi;
pub mod client;
pub mod types;

pub use aqi::fetch_aqi;
pub use client::fetch_sparse_weather_samples;
pub use types::RawSample;
