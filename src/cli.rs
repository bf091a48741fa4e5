//! Command-line surface of the `fusedmm-time` binary.
//!
//! Flags are historically spelled with a single dash (`-input`, `-nrep`,
//! `-skHd`). [`normalize_args`] rewrites those to the `--long` form before
//! clap sees them, so both spellings parse.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use fusedmm_reference::SubtractOrder;

use crate::config::{BenchConfig, Precision};
use crate::error::{HarnessError, HarnessResult};
use crate::kernel_types::ApplicationKind;
use crate::profiling::TimerKind;
use crate::udf::ScalarFunctionKind;

pub const USAGE: &str = "\
Usage: fusedmm-time -input <path> [options]
  -input <path>     Matrix Market file (required)
  -M <int>          rows to process, 0 = all [0]
  -K <int>          feature dimension [128]
  -C <KB>           cache size to defeat, 0 = detected L3 [25344]
  -nrep <int>       timed repetitions [20]
  -T <0|1>          run the correctness check first [0]
  -t <t|s|f|m|g>    tdist, sigmoid, force-repulsion, spmm, gcn [s]
  -udf <sm|fr|tdist|ll|fa|id>
                    fused scalar function, overriding the application's;
                    needs -t t, s or f and excludes -T 1 [application's own]
  -skHd <0|1>       suppress the CSV header [0]
  -ialpha <0|1>     alpha [1]
  -ibeta <0|1>      beta [0]
  -nthreads <int>   worker threads [all]
  -prec <s|d>       single or double precision [s]
  -timer <cf|steady> cache-flushing or steady-state timer [cf]
  -seed <int>       random input seed [0]
  -frdir <0|1>      force-repulsion difference, 0 = A-B, 1 = B-A [0]
  -h                this message";

#[derive(Parser, Debug, Clone)]
#[command(name = "fusedmm-time", disable_help_flag = true, disable_version_flag = true)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    #[arg(long = "input")]
    pub input: Option<PathBuf>,

    #[arg(short = 'M', default_value_t = 0)]
    pub m: usize,

    #[arg(short = 'K', default_value_t = 128)]
    pub k: usize,

    #[arg(short = 'C', default_value_t = 25344)]
    pub cache_kb: usize,

    #[arg(long = "nrep", default_value_t = 20)]
    pub nrep: usize,

    #[arg(short = 'T', default_value_t = 0)]
    pub test: u8,

    #[arg(short = 't', default_value_t = 's')]
    pub app: char,

    #[arg(long = "udf")]
    pub udf: Option<String>,

    #[arg(long = "skHd", default_value_t = 0)]
    pub skip_header: u8,

    #[arg(long = "ialpha", default_value_t = 1)]
    pub ialpha: i64,

    #[arg(long = "ibeta", default_value_t = 0)]
    pub ibeta: i64,

    #[arg(long = "nthreads")]
    pub nthreads: Option<usize>,

    #[arg(long = "prec", default_value = "s")]
    pub precision: String,

    #[arg(long = "timer", default_value = "cf")]
    pub timer: String,

    #[arg(long = "seed", default_value_t = 0)]
    pub seed: u64,

    #[arg(long = "frdir", default_value_t = 0)]
    pub frdir: u8,

    #[arg(short = 'h')]
    pub help: bool,
}

/// Rewrite `-word` (two or more letters after one dash) to `--word`.
/// Short flags, `--long` flags, negative numbers and values pass through.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let rewritten = arg.to_str().and_then(|s| {
                let rest = s.strip_prefix('-')?;
                let multi_letter = rest.len() > 1
                    && !rest.starts_with('-')
                    && rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                    && rest.chars().all(|c| c.is_ascii_alphanumeric());
                multi_letter.then(|| OsString::from(format!("--{rest}")))
            });
            rewritten.unwrap_or(arg)
        })
        .collect()
}

impl Cli {
    /// Parse a full argv (program name first), accepting single-dash long flags.
    pub fn parse_normalized<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    pub fn into_config(self) -> HarnessResult<BenchConfig> {
        let input = self.input.ok_or(HarnessError::MissingInput)?;
        let force_order = match self.frdir {
            0 => SubtractOrder::LhsMinusRhs,
            1 => SubtractOrder::RhsMinusLhs,
            d => return Err(HarnessError::InvalidConfig(format!("-frdir must be 0 or 1, got {d}"))),
        };
        let cfg = BenchConfig {
            input,
            m: self.m,
            k: self.k,
            cache_kb: self.cache_kb,
            nrep: self.nrep,
            run_check: self.test != 0,
            app: ApplicationKind::from_letter(self.app)?,
            udf: self.udf.as_deref().map(ScalarFunctionKind::from_tag).transpose()?,
            skip_header: self.skip_header != 0,
            alpha: if self.ialpha != 0 { 1.0 } else { 0.0 },
            beta: if self.ibeta != 0 { 1.0 } else { 0.0 },
            threads: self.nthreads,
            precision: Precision::from_tag(&self.precision)?,
            timer: TimerKind::from_tag(&self.timer)?,
            seed: self.seed,
            force_order,
            ..BenchConfig::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
