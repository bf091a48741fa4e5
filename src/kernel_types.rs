//! Operation messages: the five stage selectors of a fused update.
//!
//! Every fused SDDMM+SpMM update runs the same per-edge pipeline
//! (vector op, reduce op, scalar op, vector scale, accumulate); an
//! application is just one choice per stage. The composite can also be
//! carried as a `u32` with one bit group per stage, see [`bits`].

use std::fmt;

use fusedmm_reference::SubtractOrder;

use crate::error::{HarnessError, HarnessResult};

/// Bit encoding of an operation message. Exactly one bit per group is set.
pub mod bits {
    /// `T = A_i - B_j`
    pub const VOP_SUBR: u32 = 0x0000_0001;
    /// `T = B_j - A_i`
    pub const VOP_SUBL: u32 = 0x0000_0002;
    /// `T = B_j`
    pub const VOP_COPY_RHS: u32 = 0x0000_0004;
    pub const VOP_NOOP: u32 = 0x0000_0008;
    pub const VOP_MASK: u32 = 0x0000_000F;

    /// `s = ||T||^2`
    pub const ROP_NORMR: u32 = 0x0000_0010;
    /// `s = A_i . B_j`
    pub const ROP_DOT: u32 = 0x0000_0020;
    pub const ROP_NOOP: u32 = 0x0000_0040;
    pub const ROP_MASK: u32 = 0x0000_00F0;

    /// `s = f(s)`
    pub const SOP_UDEF: u32 = 0x0000_0100;
    pub const SOP_COPY: u32 = 0x0000_0200;
    pub const SOP_NOOP: u32 = 0x0000_0400;
    pub const SOP_MASK: u32 = 0x0000_0F00;

    /// `T = s * T`
    pub const VSC_MUL: u32 = 0x0000_1000;
    pub const VSC_NOOP: u32 = 0x0000_2000;
    pub const VSC_MASK: u32 = 0x0000_F000;

    /// `C_i += T`
    pub const AOP_ADD: u32 = 0x0001_0000;
    pub const AOP_MASK: u32 = 0x000F_0000;

    pub const ALL_MASK: u32 = VOP_MASK | ROP_MASK | SOP_MASK | VSC_MASK | AOP_MASK;
}

/// Per-edge vector stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorOp {
    /// Row difference in the given operand order.
    Subtract(SubtractOrder),
    /// Copy `B_j` into the row temporary.
    CopyRhs,
    /// Later stages read `B_j` in place.
    NoOp,
}

/// Vector-to-scalar stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// Squared Euclidean norm of the stage-1 vector.
    SquaredNorm,
    /// `A_i . B_j`
    Dot,
    /// Scalar stays the edge weight.
    NoOp,
}

/// Scalar-to-scalar stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarOp {
    UserDefined,
    Copy,
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorScaleOp {
    Multiply,
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulateOp {
    Add,
}

/// One choice per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpMessage {
    pub vop: VectorOp,
    pub rop: ReduceOp,
    pub sop: ScalarOp,
    pub vsc: VectorScaleOp,
    pub aop: AccumulateOp,
}

impl OpMessage {
    pub const fn new(
        vop: VectorOp,
        rop: ReduceOp,
        sop: ScalarOp,
        vsc: VectorScaleOp,
        aop: AccumulateOp,
    ) -> Self {
        Self { vop, rop, sop, vsc, aop }
    }

    pub fn to_bits(self) -> u32 {
        let vop = match self.vop {
            VectorOp::Subtract(SubtractOrder::LhsMinusRhs) => bits::VOP_SUBR,
            VectorOp::Subtract(SubtractOrder::RhsMinusLhs) => bits::VOP_SUBL,
            VectorOp::CopyRhs => bits::VOP_COPY_RHS,
            VectorOp::NoOp => bits::VOP_NOOP,
        };
        let rop = match self.rop {
            ReduceOp::SquaredNorm => bits::ROP_NORMR,
            ReduceOp::Dot => bits::ROP_DOT,
            ReduceOp::NoOp => bits::ROP_NOOP,
        };
        let sop = match self.sop {
            ScalarOp::UserDefined => bits::SOP_UDEF,
            ScalarOp::Copy => bits::SOP_COPY,
            ScalarOp::NoOp => bits::SOP_NOOP,
        };
        let vsc = match self.vsc {
            VectorScaleOp::Multiply => bits::VSC_MUL,
            VectorScaleOp::NoOp => bits::VSC_NOOP,
        };
        let aop = match self.aop {
            AccumulateOp::Add => bits::AOP_ADD,
        };
        vop | rop | sop | vsc | aop
    }

    /// Decode a composite. Each group must carry exactly one known selector.
    pub fn from_bits(raw: u32) -> HarnessResult<Self> {
        let reject = |reason: String| HarnessError::UnsupportedOperation { bits: raw, reason };

        if raw & !bits::ALL_MASK != 0 {
            return Err(reject(format!("bits {:#x} outside every stage", raw & !bits::ALL_MASK)));
        }
        let one = |mask: u32, stage: &str| -> HarnessResult<u32> {
            let v = raw & mask;
            if v.count_ones() != 1 {
                return Err(reject(format!("{stage} needs exactly one selector, got {v:#x}")));
            }
            Ok(v)
        };

        let vop = match one(bits::VOP_MASK, "vector op")? {
            bits::VOP_SUBR => VectorOp::Subtract(SubtractOrder::LhsMinusRhs),
            bits::VOP_SUBL => VectorOp::Subtract(SubtractOrder::RhsMinusLhs),
            bits::VOP_COPY_RHS => VectorOp::CopyRhs,
            _ => VectorOp::NoOp,
        };
        let rop = match one(bits::ROP_MASK, "reduce op")? {
            bits::ROP_NORMR => ReduceOp::SquaredNorm,
            bits::ROP_DOT => ReduceOp::Dot,
            bits::ROP_NOOP => ReduceOp::NoOp,
            v => return Err(reject(format!("unknown reduce op {v:#x}"))),
        };
        let sop = match one(bits::SOP_MASK, "scalar op")? {
            bits::SOP_UDEF => ScalarOp::UserDefined,
            bits::SOP_COPY => ScalarOp::Copy,
            bits::SOP_NOOP => ScalarOp::NoOp,
            v => return Err(reject(format!("unknown scalar op {v:#x}"))),
        };
        let vsc = match one(bits::VSC_MASK, "vector scale op")? {
            bits::VSC_MUL => VectorScaleOp::Multiply,
            bits::VSC_NOOP => VectorScaleOp::NoOp,
            v => return Err(reject(format!("unknown vector scale op {v:#x}"))),
        };
        let aop = match one(bits::AOP_MASK, "accumulate op")? {
            bits::AOP_ADD => AccumulateOp::Add,
            v => return Err(reject(format!("accumulate op {v:#x} not implemented, only add"))),
        };
        Ok(Self { vop, rop, sop, vsc, aop })
    }

    /// True when the row temporary of length K is written by the vector stage.
    #[inline]
    pub fn uses_row_temporary(&self) -> bool {
        matches!(self.vop, VectorOp::Subtract(_) | VectorOp::CopyRhs)
    }
}

impl fmt::Display for OpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}|{:?}|{:?}|{:?}|{:?} ({:#07x})", self.vop, self.rop, self.sop, self.vsc, self.aop, self.to_bits())
    }
}

/// The five graph-embedding applications the harness knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApplicationKind {
    /// `t`: t-distribution attraction.
    TDistribution,
    /// `s`: sigmoid attraction.
    Sigmoid,
    /// `f`: force-directed repulsion.
    ForceRepulsion,
    /// `m`: weighted aggregation (SpMM).
    WeightedAggregation,
    /// `g`: unweighted aggregation (GCN).
    UnweightedAggregation,
}

impl ApplicationKind {
    pub const ALL: [ApplicationKind; 5] = [
        ApplicationKind::TDistribution,
        ApplicationKind::Sigmoid,
        ApplicationKind::ForceRepulsion,
        ApplicationKind::WeightedAggregation,
        ApplicationKind::UnweightedAggregation,
    ];

    pub fn from_letter(c: char) -> HarnessResult<Self> {
        match c {
            't' => Ok(ApplicationKind::TDistribution),
            's' => Ok(ApplicationKind::Sigmoid),
            'f' => Ok(ApplicationKind::ForceRepulsion),
            'm' => Ok(ApplicationKind::WeightedAggregation),
            'g' => Ok(ApplicationKind::UnweightedAggregation),
            other => Err(HarnessError::UnknownApplication(other)),
        }
    }

    pub fn letter(self) -> char {
        match self {
            ApplicationKind::TDistribution => 't',
            ApplicationKind::Sigmoid => 's',
            ApplicationKind::ForceRepulsion => 'f',
            ApplicationKind::WeightedAggregation => 'm',
            ApplicationKind::UnweightedAggregation => 'g',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ApplicationKind::TDistribution => "tdist",
            ApplicationKind::Sigmoid => "sigmoid",
            ApplicationKind::ForceRepulsion => "force-repulsion",
            ApplicationKind::WeightedAggregation => "spmm",
            ApplicationKind::UnweightedAggregation => "gcn",
        }
    }

    /// Stage choices for this application. Only force repulsion looks at `order`.
    pub fn message(self, order: SubtractOrder) -> OpMessage {
        use AccumulateOp::Add;
        match self {
            ApplicationKind::TDistribution => OpMessage::new(
                VectorOp::Subtract(SubtractOrder::LhsMinusRhs),
                ReduceOp::SquaredNorm,
                ScalarOp::UserDefined,
                VectorScaleOp::Multiply,
                Add,
            ),
            ApplicationKind::Sigmoid => OpMessage::new(
                VectorOp::CopyRhs,
                ReduceOp::Dot,
                ScalarOp::UserDefined,
                VectorScaleOp::Multiply,
                Add,
            ),
            ApplicationKind::ForceRepulsion => OpMessage::new(
                VectorOp::Subtract(order),
                ReduceOp::SquaredNorm,
                ScalarOp::UserDefined,
                VectorScaleOp::Multiply,
                Add,
            ),
            ApplicationKind::WeightedAggregation => OpMessage::new(
                VectorOp::CopyRhs,
                ReduceOp::NoOp,
                ScalarOp::Copy,
                VectorScaleOp::Multiply,
                Add,
            ),
            ApplicationKind::UnweightedAggregation => OpMessage::new(
                VectorOp::CopyRhs,
                ReduceOp::NoOp,
                ScalarOp::NoOp,
                VectorScaleOp::NoOp,
                Add,
            ),
        }
    }
}

impl TryFrom<char> for ApplicationKind {
    type Error = HarnessError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_letter(c)
    }
}

impl fmt::Display for ApplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
