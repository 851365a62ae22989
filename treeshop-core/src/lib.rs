//! Core types and quoting logic for TreeShop land-clearing estimates.

/// Package tiers, rate table, inputs, and the priced breakdown.
pub mod model;
/// Traits describing the geocoding and routing provider interfaces.
pub mod ports;
/// Pure derivation of a priced breakdown from inputs and rates.
pub mod pricing;
/// Mutable quoting session used by clients.
pub mod session;
/// Flat key-value persistence for rates and the business profile.
pub mod settings;
/// Round-trip travel time lookup built on the provider ports.
pub mod transport;

pub use model::*;
pub use ports::*;
pub use pricing::*;
pub use session::*;
pub use settings::*;
pub use transport::*;
