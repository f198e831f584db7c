//! geoconsent server — HTML response interceptor that sets the consent-banner decision cookie.

pub mod error;
pub mod intercept;
pub mod origin;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use origin::{HttpOrigin, Origin};
pub use state::AppState;
