//! This module contains the conditions used to select paths, and the compiler
//! that turns them into predicates over paths.

use std::{collections::HashSet, rc::Rc};

use derivative::Derivative;

use crate::path::{Address, Path};

/// A predicate over paths.
pub type PathPredicate<P> = Rc<dyn Fn(&P) -> bool>;

/// A specification of which paths to select.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub enum Condition<P> {
    /// Selects paths that are currently at the address.
    Address(Address),

    /// Selects paths that are currently at any of the addresses.
    Addresses(HashSet<Address>),

    /// Selects paths for which the predicate holds.
    Predicate(#[derivative(Debug = "ignore")] PathPredicate<P>),
}

impl<P: Path> Condition<P> {
    /// Creates a condition that selects paths satisfying `predicate`.
    pub fn predicate(predicate: impl Fn(&P) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(predicate))
    }

    /// Creates a condition that selects paths at any of the `addresses`.
    pub fn addresses(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self::Addresses(addresses.into_iter().collect())
    }

    /// Compiles `condition` into a predicate over paths.
    ///
    /// A `condition` of [`None`] compiles to a predicate that always returns
    /// `default`.
    #[must_use]
    pub fn compile(condition: Option<Self>, default: bool) -> PathPredicate<P> {
        match condition {
            None => Rc::new(move |_: &P| default),
            Some(Self::Address(address)) => Rc::new(move |path: &P| path.addr() == address),
            Some(Self::Addresses(addresses)) => {
                Rc::new(move |path: &P| addresses.contains(&path.addr()))
            }
            Some(Self::Predicate(predicate)) => predicate,
        }
    }
}

impl<P> From<Address> for Condition<P> {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl<P> From<HashSet<Address>> for Condition<P> {
    fn from(value: HashSet<Address>) -> Self {
        Self::Addresses(value)
    }
}

impl<P> From<Vec<Address>> for Condition<P> {
    fn from(value: Vec<Address>) -> Self {
        Self::Addresses(value.into_iter().collect())
    }
}

impl<P> From<&[Address]> for Condition<P> {
    fn from(value: &[Address]) -> Self {
        Self::Addresses(value.iter().copied().collect())
    }
}

impl<P, const N: usize> From<[Address; N]> for Condition<P> {
    fn from(value: [Address; N]) -> Self {
        Self::Addresses(value.into_iter().collect())
    }
}
