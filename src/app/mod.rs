pub mod controller;
pub mod factory;
pub mod notifications;
pub mod shell;

pub use controller::{RunOptions, SenseBridge};
pub use factory::create_app;
pub use notifications::{Delivery, NotificationManager};
pub use shell::AppShell;
