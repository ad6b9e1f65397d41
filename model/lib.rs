#![deny(unused_imports)]

pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod train;

#[path = "../frame/mod.rs"]
pub mod frame;

#[path = "../input/mod.rs"]
pub mod input;

#[path = "../session/mod.rs"]
pub mod session;
