//! Case paths: embed/extract pairs for one case of an action enum.

use std::fmt;
use std::sync::Arc;

type Embed<Root, Value> = Arc<dyn Fn(Value) -> Root + Send + Sync>;
type Extract<Root, Value> = Arc<dyn Fn(Root) -> Option<Value> + Send + Sync>;

/// Projection of a `Root` enum onto one of its cases carrying a `Value`.
///
/// `embed` wraps a child value into the parent case, `extract` unwraps it
/// if (and only if) the parent value is that case. The [`case!`](crate::case)
/// macro builds one from a tuple variant.
///
/// # Example
///
/// ```rust
/// use tether::case;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Parent {
///     Child(u8),
///     Other,
/// }
///
/// let path = case!(Parent::Child);
/// assert_eq!(path.embed(3), Parent::Child(3));
/// assert_eq!(path.extract(Parent::Child(3)), Some(3));
/// assert_eq!(path.extract(Parent::Other), None);
/// ```
pub struct CasePath<Root, Value> {
    embed: Embed<Root, Value>,
    extract: Extract<Root, Value>,
}

impl<Root, Value> Clone for CasePath<Root, Value> {
    fn clone(&self) -> Self {
        Self {
            embed: Arc::clone(&self.embed),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<Root, Value> fmt::Debug for CasePath<Root, Value> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CasePath<{}, {}>",
            std::any::type_name::<Root>(),
            std::any::type_name::<Value>()
        )
    }
}

impl<Root: 'static, Value: 'static> CasePath<Root, Value> {
    pub fn new<E, X>(embed: E, extract: X) -> Self
    where
        E: Fn(Value) -> Root + Send + Sync + 'static,
        X: Fn(Root) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            embed: Arc::new(embed),
            extract: Arc::new(extract),
        }
    }

    pub fn embed(&self, value: Value) -> Root {
        (self.embed)(value)
    }

    pub fn extract(&self, root: Root) -> Option<Value> {
        (self.extract)(root)
    }

    /// Shared embedding function, used when lifting child effects.
    pub(crate) fn embedder(&self) -> Embed<Root, Value> {
        Arc::clone(&self.embed)
    }

    /// Compose with a path into `Value`, producing a path from `Root` to the
    /// grandchild case.
    pub fn append<Leaf: 'static>(self, inner: CasePath<Value, Leaf>) -> CasePath<Root, Leaf> {
        let outer_embed = self.embed;
        let outer_extract = self.extract;
        let inner_embed = inner.embed;
        let inner_extract = inner.extract;
        CasePath {
            embed: Arc::new(move |leaf| outer_embed(inner_embed(leaf))),
            extract: Arc::new(move |root| outer_extract(root).and_then(|value| inner_extract(value))),
        }
    }
}

/// Build a [`CasePath`] for a single-field tuple variant.
///
/// ```rust
/// use tether::case;
/// use tether::core::CasePath;
///
/// enum Action {
///     Counter(i32),
///     Reset,
/// }
///
/// let path: CasePath<Action, i32> = case!(Action::Counter);
/// assert!(matches!(path.embed(1), Action::Counter(1)));
/// assert!(path.extract(Action::Reset).is_none());
/// ```
#[macro_export]
macro_rules! case {
    ($variant:path) => {
        $crate::core::CasePath::new($variant, |root| match root {
            $variant(value) => ::core::option::Option::Some(value),
            #[allow(unreachable_patterns)]
            _ => ::core::option::Option::None,
        })
    };
}
