//! Cardflow Host
//!
//! Headless host for the card carousel. It owns the view tree, the card and
//! detail screens and the navigation stack, and runs the frame-driven event
//! loop that drives the card-to-detail transition.

pub mod app;
pub mod config;
pub mod navigation;
pub mod screen;

pub use app::{App, HostEvent, RunReport, Scenario};
pub use config::{Config, ConfigWarning};
pub use navigation::NavigationStack;
pub use screen::{CardCollectionScreen, DetailScreen};
