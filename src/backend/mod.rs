#[cfg(feature = "json")]
/// This module provides a JSON document backend.
pub mod json;

#[cfg(feature = "xml")]
/// This module provides an XML document backend.
pub mod xml;
