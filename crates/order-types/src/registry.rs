//! Registry trait for self-registering implementations.
//!
//! Pluggable backends declare the name they are configured under together with
//! the factory that builds them, so the service can wire them up by name.

/// Base trait for implementation registries.
///
/// Each backend module provides a `Registry` struct implementing this trait.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"memory"` for `[storage.implementations.memory]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
