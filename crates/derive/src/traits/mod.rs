//! Traits for the providers consumed by the Espresso derivation core.

mod providers;
pub use providers::EspressoL1Provider;
