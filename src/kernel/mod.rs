//! Multiply-accumulate kernels and kernel selection.
//!
//! Every assignment runs exactly one of three kernel tiers:
//! - [`KernelTier::Vectorized`]: packed SIMD arithmetic, row-major targets only.
//! - [`KernelTier::Optimized`]: scalar, four nonzeros and four columns per step.
//! - [`KernelTier::Default`]: scalar, one nonzero at a time; also the only tier
//!   that handles diagonal dense operands and heap-backed element types.
//!
//! Schur-product assignment never reaches a kernel directly; it is routed through
//! a dense temporary by the dispatcher.

pub mod chunks;
pub mod default;
pub mod optimized;
pub mod range;
pub mod vectorized;

use tracing::debug;

use crate::config::MultOptions;
use crate::core::probe::Capabilities;
use crate::core::scalar::Scalar;
use crate::core::traits::{DenseRows, SparseRows};
use crate::expr::structure::Structure;
use crate::matrix::block::DenseBlockMut;
use range::RangeEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelTier {
    Default,
    Optimized,
    Vectorized,
}

pub fn select_kernel(caps: &Capabilities) -> KernelTier {
    let tier = if caps.vectorized {
        KernelTier::Vectorized
    } else if caps.optimized {
        KernelTier::Optimized
    } else {
        KernelTier::Default
    };
    debug!(?tier, band = ?caps.band, padded = caps.padded, "selected kernel");
    tier
}

/// Assignment operator applied to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    SchurAssign,
}

impl AssignOp {
    /// The kernel update, or `None` for operators that need a temporary.
    pub fn update(self) -> Option<Update> {
        match self {
            AssignOp::Assign => Some(Update::Assign),
            AssignOp::AddAssign => Some(Update::Add),
            AssignOp::SubAssign => Some(Update::Sub),
            AssignOp::SchurAssign => None,
        }
    }
}

/// What a kernel does with each contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Reset the block first, then accumulate.
    Assign,
    Add,
    Sub,
}

/// How a lazy product reaches a dense target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelChoice {
    Direct { tier: KernelTier, update: Update },
    ViaTemporary,
}

pub fn route(caps: &Capabilities, op: AssignOp) -> KernelChoice {
    match op.update() {
        Some(update) => KernelChoice::Direct {
            tier: select_kernel(caps),
            update,
        },
        None => KernelChoice::ViaTemporary,
    }
}

/// Everything a kernel needs besides the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelPlan {
    pub tier: KernelTier,
    pub range: RangeEngine,
    /// Column block width of the default kernel.
    pub block: usize,
    /// A scalar loop is needed for the trailing columns of a packed range.
    pub remainder: bool,
}

impl KernelPlan {
    pub fn new(
        tier: KernelTier,
        caps: &Capabilities,
        structure: Structure,
        update: Update,
        options: &MultOptions,
    ) -> Self {
        let block = if caps.row_major || caps.band.is_diagonal() {
            usize::MAX
        } else {
            options.column_block.max(1)
        };
        Self {
            tier,
            range: RangeEngine::new(caps.band, structure, update),
            block,
            remainder: !caps.padded,
        }
    }
}

/// Run the planned kernel on one block of the target, then mirror the upper
/// triangle if the result was declared symmetric or Hermitian.
pub fn run<T, S, D>(block: &mut DenseBlockMut<'_, T>, a: &S, b: &D, plan: &KernelPlan)
where
    T: Scalar,
    S: SparseRows<T> + ?Sized,
    D: DenseRows<T> + ?Sized,
{
    match plan.tier {
        KernelTier::Default => default::run(block, a, b, plan),
        KernelTier::Optimized => optimized::run(block, a, b, plan),
        KernelTier::Vectorized => vectorized::run(block, a, b, plan),
    }
    let structure = plan.range.structure();
    if plan.range.update() == Update::Assign && structure.mirrors() {
        range::mirror(block, structure == Structure::Hermitian);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Band;

    fn caps(vectorized: bool, optimized: bool) -> Capabilities {
        Capabilities {
            evaluate_left: false,
            evaluate_right: false,
            vectorized,
            optimized,
            band: Band::General,
            padded: true,
            row_major: true,
        }
    }

    #[test]
    fn tiers_are_exclusive() {
        assert_eq!(select_kernel(&caps(true, false)), KernelTier::Vectorized);
        assert_eq!(select_kernel(&caps(false, true)), KernelTier::Optimized);
        assert_eq!(select_kernel(&caps(false, false)), KernelTier::Default);
    }

    #[test]
    fn schur_goes_through_temporary() {
        assert_eq!(
            route(&caps(true, false), AssignOp::SchurAssign),
            KernelChoice::ViaTemporary
        );
        assert_eq!(
            route(&caps(false, true), AssignOp::SubAssign),
            KernelChoice::Direct {
                tier: KernelTier::Optimized,
                update: Update::Sub,
            }
        );
    }

    #[test]
    fn plan_blocks_only_column_major_targets() {
        let opts = MultOptions::default();
        let plan = KernelPlan::new(
            KernelTier::Default,
            &caps(false, false),
            Structure::General,
            Update::Assign,
            &opts,
        );
        assert_eq!(plan.block, usize::MAX);
        let mut cm = caps(false, true);
        cm.row_major = false;
        cm.padded = false;
        let plan =
            KernelPlan::new(KernelTier::Optimized, &cm, Structure::Lower, Update::Add, &opts);
        assert_eq!(plan.block, 64);
        assert!(plan.remainder);
    }
}
