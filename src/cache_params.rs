//! Host cache topology, used to pick the cache size the flushing timer
//! has to overflow when none is given.
//!
//! Sizes come from CPUID leaf 4 on x86_64, then sysfs on Linux, then a
//! conservative fallback. Detection runs once per process.

use std::sync::OnceLock;

/// Per-core data cache sizes in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSizes {
    pub l1d: usize,
    pub l2: usize,
    pub l3: usize,
}

impl CacheSizes {
    /// 32 KiB / 1 MiB / 8 MiB.
    pub const FALLBACK: CacheSizes = CacheSizes { l1d: 32 << 10, l2: 1 << 20, l3: 8 << 20 };

    /// Largest level present.
    #[inline]
    pub fn last_level(&self) -> usize {
        self.l1d.max(self.l2).max(self.l3)
    }
}

static CACHE_SIZES: OnceLock<CacheSizes> = OnceLock::new();

/// Detected cache sizes, memoised.
pub fn cache_sizes() -> CacheSizes {
    *CACHE_SIZES.get_or_init(|| {
        let sizes = detect();
        log::debug!(
            "cache sizes: L1D={} KiB, L2={} KiB, L3={} KiB",
            sizes.l1d >> 10,
            sizes.l2 >> 10,
            sizes.l3 >> 10
        );
        sizes
    })
}

/// Bytes to defeat for a `-C <KB>` request; `0` means the detected last level.
pub fn flush_bytes(cache_kb: usize) -> usize {
    if cache_kb == 0 {
        cache_sizes().last_level()
    } else {
        cache_kb.saturating_mul(1024)
    }
}

fn detect() -> CacheSizes {
    #[cfg(target_arch = "x86_64")]
    {
        if let Some(s) = from_cpuid() {
            return s;
        }
    }
    #[cfg(target_os = "linux")]
    {
        if let Some(s) = from_sysfs() {
            return s;
        }
    }
    CacheSizes::FALLBACK
}

#[cfg(target_arch = "x86_64")]
fn from_cpuid() -> Option<CacheSizes> {
    let (mut l1d, mut l2, mut l3) = (None, None, None);
    for sub in 0..16u32 {
        // SAFETY: leaf 4 is available on every x86_64 CPU this runs on; an
        // unsupported leaf reports cache type 0 and ends the walk.
        let r = unsafe { std::arch::x86_64::__cpuid_count(4, sub) };
        let kind = r.eax & 0x1F;
        if kind == 0 {
            break;
        }
        let level = (r.eax >> 5) & 0x7;
        let line = (r.ebx & 0xFFF) as usize + 1;
        let partitions = ((r.ebx >> 12) & 0x3FF) as usize + 1;
        let ways = ((r.ebx >> 22) & 0x3FF) as usize + 1;
        let sets = r.ecx as usize + 1;
        let size = line * partitions * ways * sets;
        // kind: 1 data, 2 instruction, 3 unified
        match (level, kind) {
            (1, 1) => l1d = Some(size),
            (2, 1) | (2, 3) => l2 = Some(size),
            (3, 1) | (3, 3) => l3 = Some(size),
            _ => {}
        }
    }
    Some(CacheSizes {
        l1d: l1d?,
        l2: l2?,
        l3: l3.unwrap_or(CacheSizes::FALLBACK.l3),
    })
}

#[cfg(target_os = "linux")]
fn from_sysfs() -> Option<CacheSizes> {
    let (mut l1d, mut l2, mut l3) = (None, None, None);
    for idx in 0..8 {
        let base = format!("/sys/devices/system/cpu/cpu0/cache/index{idx}");
        let read = |leaf: &str| std::fs::read_to_string(format!("{base}/{leaf}")).ok();
        let (Some(level), Some(kind), Some(size)) = (read("level"), read("type"), read("size")) else {
            continue;
        };
        let Some(size) = parse_cache_size(&size) else { continue };
        match (level.trim(), kind.trim()) {
            ("1", "Data") => l1d = Some(size),
            ("2", "Unified") | ("2", "Data") => l2 = Some(size),
            ("3", "Unified") => l3 = Some(size),
            _ => {}
        }
    }
    Some(CacheSizes {
        l1d: l1d?,
        l2: l2?,
        l3: l3.unwrap_or(CacheSizes::FALLBACK.l3),
    })
}

/// Parse sysfs cache sizes such as `48K`, `2048K`, `32M` or `1024`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cache_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let (digits, scale) = match raw.as_bytes().last()? {
        b'K' | b'k' => (&raw[..raw.len() - 1], 1usize << 10),
        b'M' | b'm' => (&raw[..raw.len() - 1], 1 << 20),
        b'G' | b'g' => (&raw[..raw.len() - 1], 1 << 30),
        _ => (raw, 1),
    };
    digits.trim().parse::<usize>().ok()?.checked_mul(scale)
}
