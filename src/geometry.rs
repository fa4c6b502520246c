use anyhow::{Context, bail};
use serde::Serialize;

/// Parse a gem5 size label like "16kB" into bytes
///
/// gem5 treats the decimal-looking units as binary, so "1kB" is 1024 bytes.
pub fn parse_size_label(label: &str) -> anyhow::Result<u64> {
    let label = label.trim();
    let split = label
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(label.len());
    let (digits, unit) = label.split_at(split);
    if digits.is_empty() {
        bail!("Size label {:?} does not start with a number", label);
    }
    let value: u64 = digits
        .parse()
        .with_context(|| format!("Invalid number in size label {:?}", label))?;
    let shift = match unit {
        "B" | "" => 0,
        "kB" | "KB" | "KiB" => 10,
        "MB" | "MiB" => 20,
        "GB" | "GiB" => 30,
        _ => bail!("Unknown unit {:?} in size label {:?}", unit, label),
    };
    value
        .checked_mul(1 << shift)
        .with_context(|| format!("Size label {:?} overflows", label))
}

/// Replacement policy letter used by SimpleScalar sim-cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Replacement {
    Lru,
    Fifo,
    Random,
}

impl Replacement {
    pub fn letter(self) -> char {
        match self {
            Replacement::Lru => 'l',
            Replacement::Fifo => 'f',
            Replacement::Random => 'r',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    /// total capacity in bytes
    pub size: u64,
    /// block (line) size in bytes
    pub block_size: u64,
    /// set associativity
    pub assoc: u64,
}

impl CacheGeometry {
    pub fn new(size: u64, block_size: u64, assoc: u64) -> anyhow::Result<Self> {
        if !block_size.is_power_of_two() {
            bail!("Block size {} is not a power of two", block_size);
        }
        if assoc == 0 {
            bail!("Associativity must be at least 1");
        }
        if !size.is_power_of_two() {
            bail!("Cache size {} is not a power of two", size);
        }
        let way_bytes = block_size
            .checked_mul(assoc)
            .context("Block size times associativity overflows")?;
        if size < way_bytes || size % way_bytes != 0 {
            bail!(
                "Cache size {} is not a multiple of block size {} x {} ways",
                size,
                block_size,
                assoc
            );
        }
        let geometry = Self {
            size,
            block_size,
            assoc,
        };
        if !geometry.sets().is_power_of_two() {
            bail!("{} sets is not a power of two", geometry.sets());
        }
        Ok(geometry)
    }

    pub fn from_label(label: &str, block_size: u64, assoc: u64) -> anyhow::Result<Self> {
        Self::new(parse_size_label(label)?, block_size, assoc)
    }

    pub fn sets(&self) -> u64 {
        self.size / (self.block_size * self.assoc)
    }

    pub fn offset_bits(&self) -> u32 {
        self.block_size.trailing_zeros()
    }

    pub fn index_bits(&self) -> u32 {
        self.sets().trailing_zeros()
    }

    /// tag bits left for an `address_bits` wide address, zero if the address is too narrow
    pub fn tag_bits(&self, address_bits: u32) -> u32 {
        address_bits.saturating_sub(self.index_bits() + self.offset_bits())
    }

    /// sim-cache configuration: `name:nsets:bsize:assoc:repl`
    pub fn sim_cache_spec(&self, name: &str, replacement: Replacement) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            name,
            self.sets(),
            self.block_size,
            self.assoc,
            replacement.letter()
        )
    }

    pub fn human_size(&self) -> String {
        format!("{}", size::Size::from_bytes(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_label() {
        assert_eq!(parse_size_label("1kB").unwrap(), 1024);
        assert_eq!(parse_size_label("16kB").unwrap(), 16 * 1024);
        assert_eq!(parse_size_label("512KiB").unwrap(), 512 * 1024);
        assert_eq!(parse_size_label("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size_label("64B").unwrap(), 64);
        assert_eq!(parse_size_label("64").unwrap(), 64);

        assert!(parse_size_label("kB").is_err());
        assert!(parse_size_label("16kb").is_err());
        assert!(parse_size_label("16 parsecs").is_err());
        assert!(parse_size_label("").is_err());
    }

    #[test]
    fn test_a7_l1_geometry() {
        // 16kB, 32B lines, 2-way
        let geometry = CacheGeometry::from_label("16kB", 32, 2).unwrap();
        assert_eq!(geometry.sets(), 256);
        assert_eq!(geometry.offset_bits(), 5);
        assert_eq!(geometry.index_bits(), 8);
        assert_eq!(geometry.tag_bits(32), 19);
        assert_eq!(
            geometry.sim_cache_spec("dl1", Replacement::Lru),
            "dl1:256:32:2:l"
        );
    }

    #[test]
    fn test_sweep_geometries() {
        let expected = [("1kB", 16), ("2kB", 32), ("4kB", 64), ("8kB", 128), ("16kB", 256)];
        for (label, sets) in expected {
            let geometry = CacheGeometry::from_label(label, 32, 2).unwrap();
            assert_eq!(geometry.sets(), sets, "sets for {}", label);
        }
    }

    #[test]
    fn test_direct_mapped_and_fully_associative() {
        let direct = CacheGeometry::new(4096, 64, 1).unwrap();
        assert_eq!(direct.sets(), 64);
        assert_eq!(
            direct.sim_cache_spec("il1", Replacement::Fifo),
            "il1:64:64:1:f"
        );

        let full = CacheGeometry::new(4096, 64, 64).unwrap();
        assert_eq!(full.sets(), 1);
        assert_eq!(full.index_bits(), 0);
        assert_eq!(full.tag_bits(32), 26);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(CacheGeometry::new(4096, 48, 2).is_err());
        assert!(CacheGeometry::new(4096, 64, 0).is_err());
        assert!(CacheGeometry::new(3000, 64, 2).is_err());
        assert!(CacheGeometry::new(64, 64, 2).is_err());
        // 3-way leaves a non power-of-two set count
        assert!(CacheGeometry::new(4096, 64, 3).is_err());
    }
}
