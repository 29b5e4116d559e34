//! Identity of an involved object.

use std::fmt;

use k8s_openapi::api::core::v1::ObjectReference;

/// Identifies the object an event is about, as far as the metadata caches
/// are concerned.
///
/// Two references that only differ in `uid` are distinct keys: a re-created
/// object gets a fresh cache entry. References without a `uid` are keyed by
/// kind, namespace and name alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
    pub uid: Option<String>,
}

impl ObjectKey {
    pub fn new<T: Into<String>>(api_version: T, kind: T, namespace: Option<T>, name: T) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: namespace.map(Into::into),
            name: name.into(),
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn from_reference(reference: &ObjectReference) -> Self {
        let non_empty = |value: &Option<String>| value.clone().filter(|value| !value.is_empty());
        Self {
            api_version: reference.api_version.clone().unwrap_or_default(),
            kind: reference.kind.clone().unwrap_or_default(),
            namespace: non_empty(&reference.namespace),
            name: reference.name.clone().unwrap_or_default(),
            uid: non_empty(&reference.uid),
        }
    }

    /// Splits `api_version` into its group and version.
    ///
    /// The core group is addressed with a bare version (`v1`), so it comes
    /// back as an empty group.
    pub fn group_version(&self) -> (&str, &str) {
        match self.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", self.api_version.as_str()),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(namespace) = &self.namespace {
            write!(f, " {}/{}", namespace, self.name)?;
        } else {
            write!(f, " {}", self.name)?;
        }
        if let Some(uid) = &self.uid {
            write!(f, " ({})", uid)?;
        }
        Ok(())
    }
}

impl From<&ObjectReference> for ObjectKey {
    fn from(reference: &ObjectReference) -> Self {
        Self::from_reference(reference)
    }
}
