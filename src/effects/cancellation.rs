//! Cancellation identities.
//!
//! A [`CancelId`] names a class of in-flight effects. Ids live in a
//! namespace made of [`ScopeSegment`]s: effects produced by a stack element
//! or a presented child are re-homed under that element's segment when they
//! are lifted into the parent, so tearing the element down can cancel the
//! whole namespace at once.

use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_COLLECTION: AtomicU64 = AtomicU64::new(0);

/// Token telling apart collections whose element ids may overlap.
pub(crate) fn collection_token() -> u64 {
    NEXT_COLLECTION.fetch_add(1, Ordering::Relaxed)
}

/// One level of cancellation namespace (a stack element, a presentation).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScopeSegment(Arc<str>);

impl ScopeSegment {
    pub(crate) fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// Segment for the stack element `id`. Stack ids are unique process-wide.
    pub(crate) fn element<S>(id: impl fmt::Debug) -> Self {
        Self::new(format!("{}[{:?}]", short_type_name::<S>(), id))
    }

    /// Segment for the element `id` of the collection holding `collection`,
    /// a token from [`collection_token`].
    pub(crate) fn member<S>(collection: u64, id: impl fmt::Debug) -> Self {
        Self::new(format!("{}@{}[{:?}]", short_type_name::<S>(), collection, id))
    }

    /// Segment for the `generation`-th presentation of an `S`.
    pub(crate) fn presentation<S>(generation: u64) -> Self {
        Self::new(format!("{}#{}", short_type_name::<S>(), generation))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ScopeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeSegment({})", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CancelKey {
    type_id: TypeId,
    hash: u64,
    label: Arc<str>,
}

/// Opaque key identifying a class of in-flight effects.
///
/// Two ids are equal when they were built from equal keys of the same type
/// inside the same scope.
///
/// # Example
///
/// ```rust
/// use tether::effects::CancelId;
///
/// #[derive(Debug, Hash)]
/// enum Cancel {
///     Timer,
///     Fetch,
/// }
///
/// assert_eq!(CancelId::new(Cancel::Timer), CancelId::new(Cancel::Timer));
/// assert_ne!(CancelId::new(Cancel::Timer), CancelId::new(Cancel::Fetch));
/// assert_eq!(CancelId::new(Cancel::Timer).to_string(), "Timer");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CancelId {
    scope: Vec<ScopeSegment>,
    key: Option<CancelKey>,
}

impl CancelId {
    pub fn new<K>(key: K) -> Self
    where
        K: Hash + fmt::Debug + 'static,
    {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Self {
            scope: Vec::new(),
            key: Some(CancelKey {
                type_id: TypeId::of::<K>(),
                hash: hasher.finish(),
                label: format!("{key:?}").into(),
            }),
        }
    }

    /// Id registered for every effect living under `scope`.
    pub(crate) fn scope_root(scope: Vec<ScopeSegment>) -> Self {
        Self { scope, key: None }
    }

    pub fn scope(&self) -> &[ScopeSegment] {
        &self.scope
    }

    pub(crate) fn prefixed(mut self, segment: &ScopeSegment) -> Self {
        self.scope.insert(0, segment.clone());
        self
    }

    pub(crate) fn is_within(&self, scope: &[ScopeSegment]) -> bool {
        self.scope.starts_with(scope)
    }
}

impl fmt::Display for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.scope {
            write!(f, "{segment}/")?;
        }
        match &self.key {
            Some(key) => f.write_str(&key.label),
            None => f.write_str("*"),
        }
    }
}

impl fmt::Debug for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CancelId({self})")
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
