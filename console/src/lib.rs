mod actions;
pub mod api;
pub mod browser;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod form;
pub mod logging;
pub mod state;
pub mod timers;
pub mod view;

#[cfg(test)]
mod testing;

pub use api::{ApiError, HttpApi, JobsApi};
pub use config::Config;
pub use dashboard::{Command, Dashboard, Event, TabTarget};
pub use filter::FilterType;
pub use form::{FormError, FormField, JobForm};
pub use state::{DashboardState, DetailSubTab, SubTab, Tab};
pub use timers::TimerKind;
