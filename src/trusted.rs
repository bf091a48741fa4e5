//! Entry into the unfused reference kernels.

use fusedmm_reference::{
    force_repulsion_csr, gcn_csr, sigmoid_csr, spmm_csr, tdist_csr, SigmoidTable, SubtractOrder,
};

use crate::error::HarnessResult;
use crate::kernel_dispatcher::{KernelCall, KernelDims};
use crate::kernel_types::ApplicationKind;
use crate::{DenseMut, Real};

/// Run the reference implementation of `app` with the same argument checks
/// as the fused path.
pub fn run_trusted<T: Real>(
    app: ApplicationKind,
    order: SubtractOrder,
    table: &SigmoidTable<T>,
    call: &KernelCall<'_, T>,
    c: DenseMut<'_, T>,
) -> HarnessResult<()> {
    call.validate(&c)?;
    let KernelDims { m, k, .. } = call.dims;
    let s = &call.s;
    match app {
        ApplicationKind::TDistribution => tdist_csr(s, m, k, call.a, call.b, c),
        ApplicationKind::Sigmoid => sigmoid_csr(s, m, k, call.a, call.b, c, table),
        ApplicationKind::ForceRepulsion => force_repulsion_csr(s, m, k, call.a, call.b, c, order),
        ApplicationKind::WeightedAggregation => spmm_csr(s, m, k, call.b, c),
        ApplicationKind::UnweightedAggregation => gcn_csr(s, m, k, call.b, c),
    }
    Ok(())
}
