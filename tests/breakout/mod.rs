//! Headless breakout scenario shared by the integration driver.

pub mod components;
pub mod systems;
