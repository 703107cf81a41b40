pub mod assets;
pub mod compute;
pub mod config;
pub mod display;
pub mod entities;
pub mod error;
pub mod preloader;
pub mod selection;
