//! Pluggable scalar functions for the fused scalar stage.

use fusedmm_reference::{tdist_scale, SigmoidTable};

use crate::error::{HarnessError, HarnessResult};
use crate::kernel_types::ApplicationKind;
use crate::Real;

/// A `scalar -> scalar` map applied once per edge by `ScalarOp::UserDefined`.
pub trait ScalarUdf<T>: Sync {
    fn apply(&self, v: T) -> T;
}

impl<T, F> ScalarUdf<T> for F
where
    F: Fn(T) -> T + Sync,
{
    #[inline(always)]
    fn apply(&self, v: T) -> T {
        self(v)
    }
}

/// The built-in scalar functions. Exactly one is active per run.
#[derive(Debug, Clone, Copy)]
pub enum ScalarFunction<'t, T> {
    /// `1 - sigmoid(v)` via the shared lookup table.
    SigmoidComplement(&'t SigmoidTable<T>),
    /// `1 + 1/v`
    ReciprocalPlusOne,
    /// `clamp(-2 / (1 + v))`
    TDistScale,
    /// `log2(1 + sqrt(v))`
    LogLikelihood,
    /// `sqrt(v) + 1/v`
    SqrtCombinator,
    Identity,
}

/// Precision-free selector of a [`ScalarFunction`], as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarFunctionKind {
    SigmoidComplement,
    ReciprocalPlusOne,
    TDistScale,
    LogLikelihood,
    SqrtCombinator,
    Identity,
}

impl ScalarFunctionKind {
    pub const ALL: [ScalarFunctionKind; 6] = [
        ScalarFunctionKind::SigmoidComplement,
        ScalarFunctionKind::ReciprocalPlusOne,
        ScalarFunctionKind::TDistScale,
        ScalarFunctionKind::LogLikelihood,
        ScalarFunctionKind::SqrtCombinator,
        ScalarFunctionKind::Identity,
    ];

    /// `sm`, `fr`, `tdist`, `ll`, `fa` or `id`.
    pub fn from_tag(tag: &str) -> HarnessResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| HarnessError::InvalidConfig(format!("unknown scalar function {tag:?}")))
    }

    pub fn tag(self) -> &'static str {
        match self {
            ScalarFunctionKind::SigmoidComplement => "sm",
            ScalarFunctionKind::ReciprocalPlusOne => "fr",
            ScalarFunctionKind::TDistScale => "tdist",
            ScalarFunctionKind::LogLikelihood => "ll",
            ScalarFunctionKind::SqrtCombinator => "fa",
            ScalarFunctionKind::Identity => "id",
        }
    }

    /// The function an application plugs into its scalar stage, and the one
    /// its reference kernel computes.
    pub fn for_application(app: ApplicationKind) -> Self {
        match app {
            ApplicationKind::TDistribution => ScalarFunctionKind::TDistScale,
            ApplicationKind::Sigmoid => ScalarFunctionKind::SigmoidComplement,
            ApplicationKind::ForceRepulsion => ScalarFunctionKind::ReciprocalPlusOne,
            ApplicationKind::WeightedAggregation | ApplicationKind::UnweightedAggregation => {
                ScalarFunctionKind::Identity
            }
        }
    }

    pub fn bind<T: Real>(self, table: &SigmoidTable<T>) -> ScalarFunction<'_, T> {
        match self {
            ScalarFunctionKind::SigmoidComplement => ScalarFunction::SigmoidComplement(table),
            ScalarFunctionKind::ReciprocalPlusOne => ScalarFunction::ReciprocalPlusOne,
            ScalarFunctionKind::TDistScale => ScalarFunction::TDistScale,
            ScalarFunctionKind::LogLikelihood => ScalarFunction::LogLikelihood,
            ScalarFunctionKind::SqrtCombinator => ScalarFunction::SqrtCombinator,
            ScalarFunctionKind::Identity => ScalarFunction::Identity,
        }
    }
}

impl<'t, T: Real> ScalarFunction<'t, T> {
    pub fn for_application(app: ApplicationKind, table: &'t SigmoidTable<T>) -> Self {
        ScalarFunctionKind::for_application(app).bind(table)
    }

    pub fn kind(&self) -> ScalarFunctionKind {
        match self {
            ScalarFunction::SigmoidComplement(_) => ScalarFunctionKind::SigmoidComplement,
            ScalarFunction::ReciprocalPlusOne => ScalarFunctionKind::ReciprocalPlusOne,
            ScalarFunction::TDistScale => ScalarFunctionKind::TDistScale,
            ScalarFunction::LogLikelihood => ScalarFunctionKind::LogLikelihood,
            ScalarFunction::SqrtCombinator => ScalarFunctionKind::SqrtCombinator,
            ScalarFunction::Identity => ScalarFunctionKind::Identity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunction::SigmoidComplement(_) => "sigmoid-complement",
            ScalarFunction::ReciprocalPlusOne => "reciprocal-plus-one",
            ScalarFunction::TDistScale => "tdist-scale",
            ScalarFunction::LogLikelihood => "log-likelihood",
            ScalarFunction::SqrtCombinator => "sqrt-combinator",
            ScalarFunction::Identity => "identity",
        }
    }
}

impl<'t, T: Real> ScalarUdf<T> for ScalarFunction<'t, T> {
    #[inline(always)]
    fn apply(&self, v: T) -> T {
        match self {
            ScalarFunction::SigmoidComplement(table) => T::one() - table.lookup(v),
            ScalarFunction::ReciprocalPlusOne => T::one() + T::one() / v,
            ScalarFunction::TDistScale => tdist_scale(T::from_f64(-2.0) / (T::one() + v)),
            ScalarFunction::LogLikelihood => (T::one() + v.sqrt()).log2(),
            ScalarFunction::SqrtCombinator => v.sqrt() + T::one() / v,
            ScalarFunction::Identity => v,
        }
    }
}
