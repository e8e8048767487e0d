//! In-process providers.
//!
//! - [`mock`] - scripted provider for tests and offline demos

pub mod mock;

pub use mock::MockProvider;
