use crate::util::ensure_parent;
use anyhow::{anyhow, Context, Result};
use arena_core::Leaderboard;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn read_leaderboard(path: &Path) -> Result<Leaderboard> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading leaderboard {}", path.display()))?;
    Leaderboard::parse(&text).with_context(|| format!("malformed leaderboard {}", path.display()))
}

/// Rewrites the whole file.
pub fn write_leaderboard(path: &Path, board: &Leaderboard) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, board.render()).with_context(|| format!("failed writing {}", path.display()))
}

/// Creates an all-zero board. Refuses to clobber an existing file unless
/// `force` is set.
pub fn init_leaderboard(path: &Path, force: bool) -> Result<Leaderboard> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        ));
    }
    let board = Leaderboard::default();
    write_leaderboard(path, &board)?;
    Ok(board)
}

/// Inserts `score` and persists the board when it placed. Returns the
/// zero-based rank.
pub fn submit_score(path: &Path, score: u32) -> Result<Option<usize>> {
    let mut board = read_leaderboard(path)?;
    let rank = board.insert(score);
    if let Some(rank) = rank {
        write_leaderboard(path, &board)?;
        info!(score, rank = rank + 1, path = %path.display(), "leaderboard updated");
    }
    Ok(rank)
}
