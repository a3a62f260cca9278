//! Whole-program driver: one independent analysis unit per method.

use rayon::prelude::*;
use tracing::{debug, info};

use jlat_cfa::MethodSignature;
use jlat_cpa::AnalysisError;

use crate::bam::{BamAnalysis, BamResult};
use crate::semantics::JvmSemantics;

/// How one unit ended.
#[derive(Debug)]
pub enum UnitOutcome<V> {
    Analyzed(BamResult<V>),
    /// A complexity ceiling tripped; the unit is skipped, not failed.
    TooComplex(AnalysisError),
    Failed(AnalysisError),
}

impl<V> UnitOutcome<V> {
    pub const fn is_analyzed(&self) -> bool {
        matches!(self, Self::Analyzed(_))
    }
}

/// Result of one analysis unit.
#[derive(Debug)]
pub struct UnitReport<V> {
    pub signature: MethodSignature,
    pub outcome: UnitOutcome<V>,
}

/// Results of a whole-program run, one report per method in signature
/// order.
#[derive(Debug)]
pub struct DriverReport<V> {
    pub units: Vec<UnitReport<V>>,
}

impl<V> DriverReport<V> {
    pub fn analyzed(&self) -> usize {
        self.units.iter().filter(|u| u.outcome.is_analyzed()).count()
    }

    pub fn too_complex(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::TooComplex(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Failed(_)))
            .count()
    }

    pub fn unit(&self, signature: &MethodSignature) -> Option<&UnitReport<V>> {
        self.units.iter().find(|u| u.signature == *signature)
    }
}

/// Analyze every method of the program as its own unit, in parallel.
///
/// Units are independent: each gets a fresh transfer relation and summary
/// cache, and a failing unit never aborts the others. Units are reported in
/// signature order regardless of scheduling.
pub fn analyze_all<A>(analysis: &A) -> DriverReport<<A::Semantics as JvmSemantics>::Value>
where
    A: BamAnalysis,
    <A::Semantics as JvmSemantics>::Value: Send,
{
    let mut signatures: Vec<MethodSignature> = analysis
        .cfa()
        .methods()
        .map(|m| m.signature.clone())
        .collect();
    signatures.sort_unstable();

    let units: Vec<_> = signatures
        .into_par_iter()
        .map(|signature| {
            let outcome = match analysis.run(&signature) {
                Ok(result) => UnitOutcome::Analyzed(result),
                Err(error) if error.is_resource_exhaustion() => {
                    debug!(method = %signature, %error, "unit skipped as too complex");
                    UnitOutcome::TooComplex(error)
                }
                Err(error) => {
                    debug!(method = %signature, %error, "unit failed");
                    UnitOutcome::Failed(error)
                }
            };
            UnitReport { signature, outcome }
        })
        .collect();

    let report = DriverReport { units };
    info!(
        analyzed = report.analyzed(),
        too_complex = report.too_complex(),
        failed = report.failed(),
        "program analysis finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bam::DefaultAnalysis;
    use crate::value::test_value::Const;
    use jlat_cfa::{
        Call, Cfa, CfaBuilder, Instruction, InvokeKind, JvmType, MethodCfa, MethodDescriptor,
    };
    use jlat_cpa::CpaConfig;

    fn sig(name: &str) -> MethodSignature {
        MethodSignature::new("T", name, MethodDescriptor::new(vec![], JvmType::Void))
    }

    /// `static void ok() { return; }`
    fn ok_cfa(name: &str) -> MethodCfa {
        let mut b = CfaBuilder::new(sig(name), true, 0);
        b.add_instruction_edge(b.entry(), b.return_exit(), Instruction::Return { width: 0 });
        b.finish()
    }

    /// A method whose first edge pops an empty stack.
    fn broken_cfa(name: &str) -> MethodCfa {
        let mut b = CfaBuilder::new(sig(name), true, 0);
        let n = b.add_node(1);
        b.add_instruction_edge(b.entry(), n, Instruction::Pop { slots: 1 });
        b.add_instruction_edge(n, b.return_exit(), Instruction::Return { width: 0 });
        b.finish()
    }

    #[test]
    fn test_failing_unit_does_not_poison_the_rest() {
        let mut cfa = Cfa::new();
        cfa.insert(ok_cfa("a"));
        cfa.insert(broken_cfa("b"));
        cfa.insert(ok_cfa("c"));

        let analysis: DefaultAnalysis<Const> = DefaultAnalysis::new(cfa);
        let report = analyze_all(&analysis);

        assert_eq!(report.units.len(), 3);
        assert_eq!(report.analyzed(), 2);
        assert_eq!(report.failed(), 1);
        let broken = report.unit(&sig("b")).unwrap();
        match &broken.outcome {
            UnitOutcome::Failed(error) => assert_eq!(error.id(), "STACK_UNDERFLOW"),
            other => panic!("expected a failed unit, got {other:?}"),
        }
    }

    #[test]
    fn test_reports_are_in_signature_order() {
        let mut cfa = Cfa::new();
        for name in ["c", "a", "b"] {
            cfa.insert(ok_cfa(name));
        }
        let analysis: DefaultAnalysis<Const> = DefaultAnalysis::new(cfa);
        let report = analyze_all(&analysis);
        let names: Vec<_> = report.units.iter().map(|u| u.signature.name.clone()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_complexity_abort_is_classified_separately() {
        // A self-loop that keeps producing covered states still costs pops;
        // a one-pop budget trips the ceiling immediately.
        let mut b = CfaBuilder::new(sig("spin"), true, 0);
        let n = b.add_node(1);
        b.add_instruction_edge(b.entry(), n, Instruction::Const { value: 0, width: 1 });
        b.add_instruction_edge(n, n, Instruction::Pop { slots: 0 });
        b.add_instruction_edge(n, b.return_exit(), Instruction::Return { width: 0 });
        let mut cfa = Cfa::new();
        cfa.insert(b.finish());

        let config = CpaConfig {
            max_processed: 1,
            max_reached_states: 1,
            check_interval: 1,
        };
        let analysis: DefaultAnalysis<Const> = DefaultAnalysis::new(cfa).with_config(config);
        let report = analyze_all(&analysis);
        assert_eq!(report.too_complex(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn test_interprocedural_units_share_nothing() {
        // Both units call the same callee; each runs with its own cache.
        let callee = ok_cfa("callee");
        let caller = |name: &str| {
            let mut b = CfaBuilder::new(sig(name), true, 0);
            let site = b.add_node(1);
            let after = b.add_node(2);
            b.add_instruction_edge(b.entry(), site, Instruction::Const { value: 1, width: 1 });
            b.add_call_edge(site, after, Call::new(sig("callee"), InvokeKind::Static));
            b.add_successor_edge(site, after);
            b.add_instruction_edge(after, b.return_exit(), Instruction::Return { width: 0 });
            b.finish()
        };
        let mut cfa = Cfa::new();
        cfa.insert(callee);
        cfa.insert(caller("x"));
        cfa.insert(caller("y"));

        let analysis: DefaultAnalysis<Const> = DefaultAnalysis::new(cfa);
        let report = analyze_all(&analysis);
        assert_eq!(report.analyzed(), 3);
        for name in ["x", "y"] {
            match &report.unit(&sig(name)).unwrap().outcome {
                UnitOutcome::Analyzed(result) => assert_eq!(result.cache_misses, 1),
                other => panic!("expected an analyzed unit, got {other:?}"),
            }
        }
    }
}
