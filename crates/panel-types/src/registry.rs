//! Registry trait for self-registering implementations.
//!
//! Each pluggable backend module (storage, identity) provides a Registry
//! struct implementing this trait, declaring the name it is referenced by
//! in configuration files together with its factory function.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "memory" for storage.implementations.memory
	/// - "static_tokens" for identity.implementations.static_tokens
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
