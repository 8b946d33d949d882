// Rusty Unobtrusive test site
// ValidationModel form pages and the remote endpoints they call

pub mod config;
pub mod model;
pub mod routes;

pub use config::SiteConfig;
pub use routes::app;
