mod api;
mod client;
mod normalize;

pub use client::DispatcharrClient;
