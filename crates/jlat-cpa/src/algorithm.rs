//! The CPA worklist algorithm.

use tracing::{debug, trace};

use jlat_cfa::MethodCfa;

use crate::error::{AnalysisError, Result};
use crate::merge::MergeOperator;
use crate::precision::PrecisionAdjustment;
use crate::reached::ReachedSet;
use crate::stop::StopOperator;
use crate::transfer::TransferRelation;
use crate::waitlist::{UniqueFifoWaitlist, Waitlist};

/// Abort ceilings for one intraprocedural fixpoint.
///
/// Termination of the loop itself is only guaranteed for finite-height
/// lattices; these ceilings are the safety net for domains or inputs that
/// violate that. The reached-state budget doubles as the memory probe: it
/// bounds how many states one unit may hold alive.
#[derive(Clone, Copy, Debug)]
pub struct CpaConfig {
    /// Maximum number of waitlist pops before the run aborts.
    pub max_processed: usize,
    /// Maximum number of states the reached set may hold.
    pub max_reached_states: usize,
    /// Ceilings are tested every this many pops.
    pub check_interval: usize,
}

impl Default for CpaConfig {
    fn default() -> Self {
        Self {
            max_processed: 100_000,
            max_reached_states: 50_000,
            check_interval: 64,
        }
    }
}

/// Outcome of one completed fixpoint.
#[derive(Clone, Debug)]
pub struct RunResult<S> {
    pub reached: ReachedSet<S>,
    /// Number of states popped off the waitlist.
    pub processed: usize,
}

/// The worklist fixpoint loop, parameterized by merge/stop/precision
/// policies. The transfer relation is passed per run so interprocedural
/// transfers can recurse through a fresh algorithm instance while keeping
/// one shared cache.
#[derive(Clone, Copy, Debug)]
pub struct CpaAlgorithm<M, St, Pa> {
    merge: M,
    stop: St,
    precision: Pa,
    config: CpaConfig,
}

impl<M, St, Pa> CpaAlgorithm<M, St, Pa> {
    pub const fn new(merge: M, stop: St, precision: Pa, config: CpaConfig) -> Self {
        Self {
            merge,
            stop,
            precision,
            config,
        }
    }

    /// Run to fixpoint from `initial` with a fresh unique-FIFO waitlist.
    pub fn run<T, P>(
        &self,
        transfer: &mut T,
        cfa: &MethodCfa,
        initial: T::State,
        precision: P,
    ) -> Result<RunResult<T::State>>
    where
        T: TransferRelation,
        M: MergeOperator<T::State>,
        St: StopOperator<T::State>,
        Pa: PrecisionAdjustment<T::State, P>,
        P: Clone,
    {
        let mut waitlist = UniqueFifoWaitlist::new();
        self.run_with_waitlist(transfer, cfa, initial, precision, &mut waitlist)
    }

    /// Run to fixpoint with a caller-supplied waitlist strategy.
    pub fn run_with_waitlist<T, P, W>(
        &self,
        transfer: &mut T,
        cfa: &MethodCfa,
        initial: T::State,
        precision: P,
        waitlist: &mut W,
    ) -> Result<RunResult<T::State>>
    where
        T: TransferRelation,
        M: MergeOperator<T::State>,
        St: StopOperator<T::State>,
        Pa: PrecisionAdjustment<T::State, P>,
        P: Clone,
        W: Waitlist<T::State>,
    {
        use crate::domain::ProgramState;

        let mut reached = ReachedSet::new();
        reached.add(initial.clone());
        waitlist.add(initial);

        let mut precision = precision;
        let mut processed = 0usize;

        while let Some(state) = waitlist.pop() {
            processed += 1;
            if processed % self.config.check_interval == 0 {
                self.check_ceilings(cfa, processed, reached.len())?;
            }

            // Leaving edges are cloned out so the transfer relation may
            // borrow the CFA again while computing successors.
            let edges: Vec<_> = cfa.leaving_edges(state.location()).cloned().collect();
            for edge in &edges {
                for successor in transfer.successors(&state, edge, cfa)? {
                    let (successor, adjusted) =
                        self.precision.adjust(successor, precision.clone(), &reached);
                    precision = adjusted;

                    // Merge phase: existing states at the successor's
                    // location may widen to cover it; a changed state is
                    // requeued under its new value.
                    let existing: Vec<_> = reached.at(successor.location()).to_vec();
                    for old in &existing {
                        let merged = self.merge.merge(&successor, old);
                        if merged != *old {
                            reached.replace(old, merged.clone());
                            waitlist.remove(old);
                            waitlist.add(merged);
                        }
                    }

                    // Stop phase: only uncovered successors survive.
                    if !self.stop.stop(&successor, reached.at(successor.location())) {
                        reached.add(successor.clone());
                        waitlist.add(successor);
                    }
                }
            }
        }

        trace!(
            method = %cfa.signature,
            processed,
            reached = reached.len(),
            "fixpoint terminated"
        );
        Ok(RunResult { reached, processed })
    }

    fn check_ceilings(&self, cfa: &MethodCfa, processed: usize, reached: usize) -> Result<()> {
        if processed <= self.config.max_processed && reached <= self.config.max_reached_states {
            return Ok(());
        }
        debug!(
            method = %cfa.signature,
            processed,
            reached,
            "aborting: complexity ceiling exceeded"
        );
        Err(AnalysisError::ExcessiveComplexity {
            signature: cfa.signature.clone(),
            processed,
            reached,
            max_processed: self.config.max_processed,
            max_reached: self.config.max_reached_states,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LatticeState, ProgramState};
    use crate::merge::MergeJoinOperator;
    use crate::precision::{NoPrecision, StaticPrecisionAdjustment};
    use crate::stop::StopSepOperator;
    use jlat_cfa::{
        CfaBuilder, CfaEdge, Instruction, JvmType, MethodDescriptor, MethodSignature, NodeId,
    };

    /// Saturating counter lattice pinned to a node: Known(n) up to a cap,
    /// then Top. Finite height, so the loop must terminate on any CFA.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Count {
        location: NodeId,
        value: Option<u32>,
    }

    impl Count {
        const CAP: u32 = 8;

        fn new(location: NodeId, value: u32) -> Self {
            Self {
                location,
                value: (value <= Self::CAP).then_some(value),
            }
        }
    }

    impl LatticeState for Count {
        fn join(&self, other: &Self) -> Self {
            let value = match (self.value, other.value) {
                (Some(a), Some(b)) if a == b => Some(a),
                _ => None,
            };
            Self {
                location: self.location,
                value,
            }
        }
        fn is_less_or_equal(&self, other: &Self) -> bool {
            other.value.is_none() || self.value == other.value
        }
    }

    impl ProgramState for Count {
        fn location(&self) -> NodeId {
            self.location
        }
    }

    /// Transfer that increments the counter on every edge.
    struct Increment;

    impl TransferRelation for Increment {
        type State = Count;

        fn successors(
            &mut self,
            state: &Count,
            edge: &CfaEdge,
            _cfa: &MethodCfa,
        ) -> Result<Vec<Count>> {
            let value = state.value.map_or(Count::CAP + 1, |v| v + 1);
            Ok(vec![Count::new(edge.target, value)])
        }
    }

    fn looping_cfa() -> MethodCfa {
        // entry -> n -> n (self loop) -> return exit
        let sig = MethodSignature::new(
            "T",
            "loop",
            MethodDescriptor::new(vec![], JvmType::Void),
        );
        let mut b = CfaBuilder::new(sig, true, 0);
        let n = b.add_node(1);
        b.add_instruction_edge(b.entry(), n, Instruction::Const { value: 0, width: 1 });
        b.add_instruction_edge(n, n, Instruction::Branch { pops: 0 });
        b.add_instruction_edge(n, b.return_exit(), Instruction::Return { width: 0 });
        b.finish()
    }

    fn algorithm(
        config: CpaConfig,
    ) -> CpaAlgorithm<MergeJoinOperator, StopSepOperator, StaticPrecisionAdjustment> {
        CpaAlgorithm::new(
            MergeJoinOperator,
            StopSepOperator,
            StaticPrecisionAdjustment,
            config,
        )
    }

    #[test]
    fn test_terminates_on_finite_height_domain() {
        let cfa = looping_cfa();
        let alg = algorithm(CpaConfig::default());
        let initial = Count::new(cfa.entry, 0);
        let result = alg
            .run(&mut Increment, &cfa, initial, NoPrecision)
            .expect("finite-height domain must terminate");

        // The self loop saturates to Top; the exit is reached.
        assert!(!result.reached.at(cfa.return_exit).is_empty());
        assert!(result.processed > 0);
    }

    #[test]
    fn test_aborts_on_processed_ceiling() {
        // An unbounded-height variant: never saturate, so every revisit is
        // a new state and only the ceiling stops the loop.
        struct Unbounded;
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        struct N(NodeId, u64);
        impl LatticeState for N {
            fn join(&self, other: &Self) -> Self {
                N(self.0, self.1.max(other.1))
            }
            fn is_less_or_equal(&self, other: &Self) -> bool {
                self.1 == other.1
            }
        }
        impl ProgramState for N {
            fn location(&self) -> NodeId {
                self.0
            }
        }
        impl TransferRelation for Unbounded {
            type State = N;
            fn successors(&mut self, state: &N, edge: &CfaEdge, _cfa: &MethodCfa) -> Result<Vec<N>> {
                Ok(vec![N(edge.target, state.1 + 1)])
            }
        }

        let cfa = looping_cfa();
        let config = CpaConfig {
            max_processed: 100,
            max_reached_states: 1_000_000,
            check_interval: 10,
        };
        let alg = algorithm(config);
        let err = alg
            .run(&mut Unbounded, &cfa, N(cfa.entry, 0), NoPrecision)
            .unwrap_err();
        assert_eq!(err.id(), "EXCESSIVE_COMPLEXITY");
        assert!(err.is_resource_exhaustion());
    }

    #[test]
    fn test_straight_line_reaches_exit_once() {
        let sig = MethodSignature::new("T", "s", MethodDescriptor::new(vec![], JvmType::Void));
        let mut b = CfaBuilder::new(sig, true, 0);
        let n = b.add_node(1);
        b.add_instruction_edge(b.entry(), n, Instruction::Const { value: 1, width: 1 });
        b.add_instruction_edge(n, b.return_exit(), Instruction::Return { width: 0 });
        let cfa = b.finish();

        let alg = algorithm(CpaConfig::default());
        let result = alg
            .run(&mut Increment, &cfa, Count::new(cfa.entry, 0), NoPrecision)
            .unwrap();
        assert_eq!(result.reached.at(cfa.return_exit).len(), 1);
        assert_eq!(
            result.reached.at(cfa.return_exit)[0],
            Count::new(cfa.return_exit, 2)
        );
    }
}
