//! The interprocedural transfer relation.

use tracing::{trace, trace_span};

use jlat_cfa::{Call, Cfa, CfaEdge, EdgeKind, MethodCfa};
use jlat_cpa::{
    CpaAlgorithm, CpaConfig, MergeOperator, NoPrecision, Result, StaticPrecisionAdjustment,
    StopOperator, TransferRelation,
};

use crate::bam::{BamCache, ExpandOperator, RebuildOperator, ReduceOperator};
use crate::semantics::JvmSemantics;
use crate::state::JvmState;
use crate::transfer::JvmTransferRelation;

/// Wraps the per-instruction relation and resolves call edges through
/// reduce/analyze/expand with a shared summary cache.
///
/// A call to a method with a CFA descends: the caller state is reduced to a
/// callee entry state, the callee's own fixpoint runs (with this relation,
/// so nested calls share the cache), and each recorded exit state is
/// expanded and rebuilt into a caller successor. Calls to unknown methods,
/// and calls past the configured stack depth, fall back to the
/// intraprocedural summary of [`JvmSemantics::invoke`].
pub struct BamTransferRelation<'p, Sem: JvmSemantics, R, E, Rb, M, St> {
    program: &'p Cfa,
    inner: JvmTransferRelation<Sem>,
    reduce: R,
    expand: E,
    rebuild: Rb,
    cache: BamCache<JvmState<Sem::Value>>,
    merge: M,
    stop: St,
    config: CpaConfig,
    /// Depth ceiling: negative is unbounded, 0 disables descent entirely.
    max_depth: i32,
    depth: u32,
}

impl<'p, Sem, R, E, Rb, M, St> BamTransferRelation<'p, Sem, R, E, Rb, M, St>
where
    Sem: JvmSemantics,
    R: ReduceOperator<Value = Sem::Value>,
    E: ExpandOperator<Value = Sem::Value>,
    Rb: RebuildOperator<Value = Sem::Value>,
    M: MergeOperator<JvmState<Sem::Value>> + Clone,
    St: StopOperator<JvmState<Sem::Value>> + Clone,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        program: &'p Cfa,
        semantics: Sem,
        reduce: R,
        expand: E,
        rebuild: Rb,
        merge: M,
        stop: St,
        config: CpaConfig,
        max_depth: i32,
    ) -> Self {
        Self {
            program,
            inner: JvmTransferRelation::new(semantics),
            reduce,
            expand,
            rebuild,
            cache: BamCache::new(),
            merge,
            stop,
            config,
            max_depth,
            depth: 0,
        }
    }

    pub const fn cache(&self) -> &BamCache<JvmState<Sem::Value>> {
        &self.cache
    }

    fn may_descend(&self) -> bool {
        u32::try_from(self.max_depth).map_or(true, |limit| self.depth < limit)
    }

    fn process_call(
        &mut self,
        state: &JvmState<Sem::Value>,
        edge: &CfaEdge,
        call: &Call,
        cfa: &MethodCfa,
    ) -> Result<Vec<JvmState<Sem::Value>>> {
        let program = self.program;
        let Some(callee) = program.method(&call.target) else {
            trace!(target = %call.target, "no CFA for callee, summarizing in place");
            return self.inner.process_call(state, edge, call, cfa);
        };
        if !self.may_descend() {
            trace!(
                target = %call.target,
                depth = self.depth,
                "call stack depth bound reached, summarizing in place"
            );
            return self.inner.process_call(state, edge, call, cfa);
        }

        let offset = cfa.node(edge.source).map_or(0, |n| n.offset);
        let reduced = self.reduce.reduce(state, call, callee, offset)?;

        let cached = self
            .cache
            .lookup(&call.target, &reduced)
            .map(|entry| entry.exit_states.clone());
        let exits = match cached {
            Some(exits) => exits,
            None => self.analyze_callee(callee, reduced)?,
        };

        let mut successors = Vec::with_capacity(exits.len());
        for exit in &exits {
            let expanded = self.expand.expand(state, exit, call, cfa, edge, callee)?;
            successors.push(self.rebuild.rebuild(state, expanded, call, cfa)?);
        }
        Ok(successors)
    }

    /// Run the callee's fixpoint from `reduced` and record the summary.
    fn analyze_callee(
        &mut self,
        callee: &MethodCfa,
        reduced: JvmState<Sem::Value>,
    ) -> Result<Vec<JvmState<Sem::Value>>> {
        let span = trace_span!("callee", method = %callee.signature, depth = self.depth);
        let _guard = span.enter();

        let algorithm = CpaAlgorithm::new(
            self.merge.clone(),
            self.stop.clone(),
            StaticPrecisionAdjustment,
            self.config,
        );
        self.depth += 1;
        let result = algorithm.run(self, callee, reduced.clone(), NoPrecision);
        self.depth -= 1;
        let result = result?;

        let mut exits = result.reached.at(callee.return_exit).to_vec();
        exits.extend_from_slice(result.reached.at(callee.exception_exit));
        self.cache.insert(
            callee.signature.clone(),
            reduced,
            exits.clone(),
            result.reached,
        );
        Ok(exits)
    }
}

impl<Sem, R, E, Rb, M, St> TransferRelation for BamTransferRelation<'_, Sem, R, E, Rb, M, St>
where
    Sem: JvmSemantics,
    R: ReduceOperator<Value = Sem::Value>,
    E: ExpandOperator<Value = Sem::Value>,
    Rb: RebuildOperator<Value = Sem::Value>,
    M: MergeOperator<JvmState<Sem::Value>> + Clone,
    St: StopOperator<JvmState<Sem::Value>> + Clone,
{
    type State = JvmState<Sem::Value>;

    fn successors(
        &mut self,
        state: &Self::State,
        edge: &CfaEdge,
        cfa: &MethodCfa,
    ) -> Result<Vec<Self::State>> {
        match &edge.kind {
            EdgeKind::Call(call) => self.process_call(state, edge, call, cfa),
            EdgeKind::Instruction(_) | EdgeKind::Successor => {
                self.inner.successors(state, edge, cfa)
            }
        }
    }
}
