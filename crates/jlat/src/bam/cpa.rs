//! Assembly of one configured interprocedural analysis.

use jlat_cfa::{Cfa, MethodSignature};
use jlat_cpa::{
    AnalysisError, CpaAlgorithm, CpaConfig, MergeOperator, NoPrecision, ReachedSet, Result,
    StaticPrecisionAdjustment, StopOperator,
};

use crate::bam::{BamTransferRelation, ExpandOperator, RebuildOperator, ReduceOperator};
use crate::semantics::JvmSemantics;
use crate::state::JvmState;
use crate::value::AbstractValue;

/// Outcome of analyzing one method interprocedurally.
#[derive(Clone, Debug)]
pub struct BamResult<V> {
    /// Reached set of the target method's own fixpoint.
    pub reached: ReachedSet<JvmState<V>>,
    /// States at the target's return and exception exits.
    pub exit_states: Vec<JvmState<V>>,
    /// States popped in the target's fixpoint (callee fixpoints excluded).
    pub processed: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// One fully configured analysis: a program CFA plus factories for the
/// domain-specific pieces. Implementors choose a value domain and override
/// whichever operator factories deviate from the defaults; `run` wires a
/// fresh transfer relation and summary cache per invocation, so concurrent
/// `run` calls from a shared `&self` never contend.
pub trait BamAnalysis: Sync {
    type Semantics: JvmSemantics;
    type Reduce: ReduceOperator<Value = <Self::Semantics as JvmSemantics>::Value>;
    type Expand: ExpandOperator<Value = <Self::Semantics as JvmSemantics>::Value>;
    type Rebuild: RebuildOperator<Value = <Self::Semantics as JvmSemantics>::Value>;
    type Merge: MergeOperator<JvmState<<Self::Semantics as JvmSemantics>::Value>> + Clone;
    type Stop: StopOperator<JvmState<<Self::Semantics as JvmSemantics>::Value>> + Clone;

    fn cfa(&self) -> &Cfa;

    fn create_semantics(&self) -> Self::Semantics;
    fn create_reduce(&self) -> Self::Reduce;
    fn create_expand(&self) -> Self::Expand;
    fn create_rebuild(&self) -> Self::Rebuild;
    fn create_merge(&self) -> Self::Merge;
    fn create_stop(&self) -> Self::Stop;

    fn cpa_config(&self) -> CpaConfig {
        CpaConfig::default()
    }

    /// Call stack depth ceiling: negative is unbounded, 0 keeps every call
    /// an intraprocedural summary.
    fn max_call_stack_depth(&self) -> i32 {
        -1
    }

    /// Analyze one method to fixpoint, descending into callees.
    fn run(
        &self,
        target: &MethodSignature,
    ) -> Result<BamResult<<Self::Semantics as JvmSemantics>::Value>> {
        let program = self.cfa();
        let method = program
            .method(target)
            .ok_or_else(|| AnalysisError::UnknownMethod(target.clone()))?;

        let mut transfer = BamTransferRelation::new(
            program,
            self.create_semantics(),
            self.create_reduce(),
            self.create_expand(),
            self.create_rebuild(),
            self.create_merge(),
            self.create_stop(),
            self.cpa_config(),
            self.max_call_stack_depth(),
        );
        let algorithm = CpaAlgorithm::new(
            self.create_merge(),
            self.create_stop(),
            StaticPrecisionAdjustment,
            self.cpa_config(),
        );
        let result = algorithm.run(
            &mut transfer,
            method,
            JvmState::initial(method),
            NoPrecision,
        )?;

        let mut exit_states = result.reached.at(method.return_exit).to_vec();
        exit_states.extend_from_slice(result.reached.at(method.exception_exit));
        Ok(BamResult {
            reached: result.reached,
            exit_states,
            processed: result.processed,
            cache_hits: transfer.cache().hits(),
            cache_misses: transfer.cache().misses(),
        })
    }
}

/// Analysis with every operator at its default over a chosen value domain.
#[derive(Debug)]
pub struct DefaultAnalysis<V> {
    cfa: Cfa,
    config: CpaConfig,
    max_depth: i32,
    _value: std::marker::PhantomData<fn() -> V>,
}

impl<V> DefaultAnalysis<V> {
    pub fn new(cfa: Cfa) -> Self {
        Self {
            cfa,
            config: CpaConfig::default(),
            max_depth: -1,
            _value: std::marker::PhantomData,
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: CpaConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn with_max_call_stack_depth(mut self, depth: i32) -> Self {
        self.max_depth = depth;
        self
    }
}

impl<V: AbstractValue + Send + Sync> BamAnalysis for DefaultAnalysis<V> {
    type Semantics = crate::semantics::DefaultSemantics<V>;
    type Reduce = crate::bam::DefaultReduceOperator<V>;
    type Expand = crate::bam::DefaultExpandOperator<V>;
    type Rebuild = crate::bam::DefaultRebuildOperator<V>;
    type Merge = jlat_cpa::MergeJoinOperator;
    type Stop = jlat_cpa::StopSepOperator;

    fn cfa(&self) -> &Cfa {
        &self.cfa
    }

    fn create_semantics(&self) -> Self::Semantics {
        crate::semantics::DefaultSemantics::new()
    }

    fn create_reduce(&self) -> Self::Reduce {
        crate::bam::DefaultReduceOperator::new()
    }

    fn create_expand(&self) -> Self::Expand {
        crate::bam::DefaultExpandOperator::new()
    }

    fn create_rebuild(&self) -> Self::Rebuild {
        crate::bam::DefaultRebuildOperator::new()
    }

    fn create_merge(&self) -> Self::Merge {
        jlat_cpa::MergeJoinOperator
    }

    fn create_stop(&self) -> Self::Stop {
        jlat_cpa::StopSepOperator
    }

    fn cpa_config(&self) -> CpaConfig {
        self.config
    }

    fn max_call_stack_depth(&self) -> i32 {
        self.max_depth
    }
}
