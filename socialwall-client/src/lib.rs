pub mod command;
pub mod composer;
pub mod config;
pub mod editor;
pub mod feed;
pub mod profile;
pub mod render;
pub mod terminal;
pub mod ui;
pub mod upload;
pub mod wall;
