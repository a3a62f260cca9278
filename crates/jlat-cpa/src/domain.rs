//! Lattice traits for abstract states.

use std::hash::Hash;

use jlat_cfa::NodeId;

/// A value in a join-semilattice.
///
/// Contract: `join` is commutative and associative, `is_less_or_equal` is a
/// partial order consistent with it (`a ≤ join(a, b)` for all reachable
/// pairs). States are stored by value throughout the engine, so structural
/// `Eq`/`Hash` is the identity used by the waitlist, the reached set, and the
/// interprocedural summary cache; `Clone` must produce a fully independent
/// value.
pub trait LatticeState: Clone + Eq + Hash {
    /// Least upper bound of `self` and `other`.
    fn join(&self, other: &Self) -> Self;

    /// Whether `self` is at most as precise-losing as `other`
    /// (`self ⊑ other`).
    fn is_less_or_equal(&self, other: &Self) -> bool;
}

/// An abstract state pinned to exactly one program location.
pub trait ProgramState: LatticeState {
    fn location(&self) -> NodeId;
}

/// Join/compare strategy over abstract states.
///
/// Most analyses let the state type carry its own lattice operators and use
/// [`DelegateDomain`]; a separate domain object is the seam for analyses that
/// need context the state does not carry.
pub trait AbstractDomain<S> {
    fn join(&self, left: &S, right: &S) -> S;
    fn is_less_or_equal(&self, left: &S, right: &S) -> bool;
}

/// Domain that delegates to the state's own lattice operators.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelegateDomain;

impl<S: LatticeState> AbstractDomain<S> for DelegateDomain {
    fn join(&self, left: &S, right: &S) -> S {
        left.join(right)
    }

    fn is_less_or_equal(&self, left: &S, right: &S) -> bool {
        left.is_less_or_equal(right)
    }
}


#[cfg(test)]
mod tests {
    use super::test_domain::Sign;
    use super::*;

    const ALL: [Sign; 4] = [
        Sign::Bottom,
        Sign::Known(false),
        Sign::Known(true),
        Sign::Top,
    ];

    #[test]
    fn test_join_commutative_associative() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a.join(&b), b.join(&a));
                for c in ALL {
                    assert_eq!(a.join(&b).join(&c), a.join(&b.join(&c)));
                }
            }
        }
    }

    #[test]
    fn test_partial_order_consistent_with_join() {
        for a in ALL {
            assert!(a.is_less_or_equal(&a));
            for b in ALL {
                let j = a.join(&b);
                assert!(a.is_less_or_equal(&j));
                assert!(b.is_less_or_equal(&j));
            }
        }
    }

    #[test]
    fn test_delegate_domain_forwards() {
        let d = DelegateDomain;
        assert_eq!(d.join(&Sign::Bottom, &Sign::Top), Sign::Top);
        assert!(d.is_less_or_equal(&Sign::Known(true), &Sign::Top));
    }
}
