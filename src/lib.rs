pub mod config;
pub mod contact;
pub mod error;
pub mod model;
pub mod news;
pub mod relay;
pub mod state;
pub mod text;
pub mod web;
