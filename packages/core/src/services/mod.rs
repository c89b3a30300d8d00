//! HTTP clients for external medicine registries.

#[cfg(test)]
pub mod mock_provider;
pub mod openfda;
pub mod regional;
