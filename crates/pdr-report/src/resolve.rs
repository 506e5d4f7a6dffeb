// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance identifier lookup.

/// Why the instance identifier could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The identifier source could not be read.
    #[error("vm id unavailable: {0}")]
    Unavailable(String),

    /// The source returned an empty identifier.
    #[error("vm id is empty")]
    Empty,
}

/// Source of the VM's platform-assigned identifier.
pub trait VmIdResolver {
    /// Look up the identifier.
    fn resolve(&self) -> Result<String, ResolveError>;
}

impl<R: VmIdResolver + ?Sized> VmIdResolver for &R {
    fn resolve(&self) -> Result<String, ResolveError> {
        (**self).resolve()
    }
}

/// A known identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVmId(String);

impl StaticVmId {
    /// Always resolve to `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl VmIdResolver for StaticVmId {
    fn resolve(&self) -> Result<String, ResolveError> {
        if self.0.is_empty() {
            return Err(ResolveError::Empty);
        }
        Ok(self.0.clone())
    }
}

/// An identifier that may or may not have been supplied.
impl VmIdResolver for Option<String> {
    fn resolve(&self) -> Result<String, ResolveError> {
        match self.as_deref() {
            Some("") => Err(ResolveError::Empty),
            Some(id) => Ok(id.to_owned()),
            None => Err(ResolveError::Unavailable("no vm id supplied".into())),
        }
    }
}

/// Never resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownVmId;

impl VmIdResolver for UnknownVmId {
    fn resolve(&self) -> Result<String, ResolveError> {
        Err(ResolveError::Unavailable("no resolver configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_id_resolves() {
        assert_eq!(StaticVmId::new("vm-1").resolve().unwrap(), "vm-1");
        assert_eq!(StaticVmId::new("").resolve(), Err(ResolveError::Empty));
    }

    #[test]
    fn option_resolver() {
        assert_eq!(Some("abc".to_owned()).resolve().unwrap(), "abc");
        assert_eq!(Some(String::new()).resolve(), Err(ResolveError::Empty));
        assert!(matches!(
            None::<String>.resolve(),
            Err(ResolveError::Unavailable(_))
        ));
    }

    #[test]
    fn unknown_never_resolves() {
        let err = UnknownVmId.resolve().unwrap_err();
        assert_eq!(err.to_string(), "vm id unavailable: no resolver configured");
    }
}
