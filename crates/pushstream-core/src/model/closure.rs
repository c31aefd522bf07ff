use std::{fmt, rc::Rc};

///
/// Closure
///
/// Shared, caller-supplied function carried as an operation argument.
/// Two closures are equal only when they are the same allocation.
///

pub struct Closure<F: ?Sized>(pub(crate) Rc<F>);

impl<F: ?Sized> Closure<F> {
    #[must_use]
    pub fn get(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> Clone for Closure<F> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Closure<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Closure(..)")
    }
}

impl<F: ?Sized> PartialEq for Closure<F> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
