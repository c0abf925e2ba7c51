use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default first seed when none is given on the command line.
pub const DEFAULT_SEED_START: u32 = 0xA2E7_0001;

/// Accepts decimal or `0x`-prefixed hex. Underscores are ignored, so
/// `0xDEAD_BEEF` parses.
pub fn parse_seed(raw: &str) -> Result<u32> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex seed: {}", raw.trim())),
        None => cleaned
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {}", raw.trim())),
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

fn collect_seeds<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<u32>> {
    tokens
        .map(str::trim)
        .filter(|token| !token.is_empty() && !token.starts_with('#'))
        .map(parse_seed)
        .collect()
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = collect_seeds(input.split(','))?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// One seed per line; blank lines and `#` comments are skipped.
pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let seeds = collect_seeds(data.lines())?;
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

/// `count` seeds from a linear congruential walk starting at `start`.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    std::iter::successors(Some(start), |cur| {
        Some(cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223))
    })
    .take(count as usize)
    .collect()
}

/// Seed file wins over an explicit list, which wins over a generated walk.
pub fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }
    let start = seed_start
        .map(parse_seed)
        .transpose()?
        .unwrap_or(DEFAULT_SEED_START);
    if seed_count == 0 {
        return Err(anyhow!("--seed-count must be >= 1"));
    }
    Ok(seed_sequence(start, seed_count))
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    Ok(())
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let encoded = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))
}

pub fn default_out_dir(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}-{}", unix_now()))
}
