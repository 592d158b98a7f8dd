//! Avatar locomotion, camera and skeleton replication for a shared 3D space.

pub mod app;
pub mod camera;
pub mod components;
pub mod config;
pub mod controllers;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod input;
pub mod logging;
pub mod scene;
pub mod smoothing;
pub mod systems;
pub mod wire;
