pub mod dedup;
pub mod error;
pub mod intake;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod service;
