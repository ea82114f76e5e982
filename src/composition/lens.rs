//! State lenses: borrow a child region out of a parent state.

use std::marker::PhantomData;

/// Mutable projection from a parent state into a child region.
///
/// Returns `None` when the region does not currently exist (an enum state
/// in a different case). A lens never takes ownership of the region.
pub trait Lens<Parent, Child>: Send + Sync {
    fn project<'a>(&self, parent: &'a mut Parent) -> Option<&'a mut Child>;
}

/// Lens onto a field that always exists.
///
/// ```rust
/// use tether::composition::{Field, Lens};
///
/// struct App {
///     count: u32,
/// }
///
/// let lens = Field::new(|app: &mut App| &mut app.count);
/// let mut app = App { count: 1 };
/// *lens.project(&mut app).unwrap() += 1;
/// assert_eq!(app.count, 2);
/// ```
pub struct Field<F>(F);

impl<F> Field<F> {
    pub fn new<P, C>(project: F) -> Self
    where
        F: Fn(&mut P) -> &mut C + Send + Sync,
    {
        Self(project)
    }
}

impl<P, C, F> Lens<P, C> for Field<F>
where
    F: Fn(&mut P) -> &mut C + Send + Sync,
{
    fn project<'a>(&self, parent: &'a mut P) -> Option<&'a mut C> {
        Some((self.0)(parent))
    }
}

/// Lens onto one case of an enum state.
///
/// ```rust
/// use tether::composition::{Case, Lens};
///
/// enum Destination {
///     Alert(String),
///     Edit(u32),
/// }
///
/// let lens = Case::new(|d: &mut Destination| match d {
///     Destination::Edit(value) => Some(value),
///     _ => None,
/// });
///
/// let mut edit = Destination::Edit(1);
/// let mut alert = Destination::Alert("sure?".into());
/// assert!(lens.project(&mut edit).is_some());
/// assert!(lens.project(&mut alert).is_none());
/// ```
pub struct Case<F>(F);

impl<F> Case<F> {
    pub fn new<P, C>(project: F) -> Self
    where
        F: Fn(&mut P) -> Option<&mut C> + Send + Sync,
    {
        Self(project)
    }
}

impl<P, C, F> Lens<P, C> for Case<F>
where
    F: Fn(&mut P) -> Option<&mut C> + Send + Sync,
{
    fn project<'a>(&self, parent: &'a mut P) -> Option<&'a mut C> {
        (self.0)(parent)
    }
}

/// Two lenses chained: parent to middle, middle to child.
pub struct Compose<Outer, Inner, Middle> {
    outer: Outer,
    inner: Inner,
    _middle: PhantomData<fn() -> Middle>,
}

impl<Outer, Inner, Middle> Compose<Outer, Inner, Middle> {
    pub fn new(outer: Outer, inner: Inner) -> Self {
        Self {
            outer,
            inner,
            _middle: PhantomData,
        }
    }
}

impl<P, M, C, Outer, Inner> Lens<P, C> for Compose<Outer, Inner, M>
where
    Outer: Lens<P, M>,
    Inner: Lens<M, C>,
    M: 'static,
{
    fn project<'a>(&self, parent: &'a mut P) -> Option<&'a mut C> {
        self.outer
            .project(parent)
            .and_then(|middle| self.inner.project(middle))
    }
}
