mod auth;
mod configure;
mod program;

pub use auth::AuthPage;
pub use configure::ConfigurePage;
pub use program::ProgramPage;
