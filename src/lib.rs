pub mod auth;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod screens;
pub mod state;
pub mod store;
pub mod text;
pub mod validation;
