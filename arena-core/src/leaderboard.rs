use tracing::warn;

use crate::constants::LEADERBOARD_CAPACITY;
use crate::error::LeaderboardError;

/// Fixed-capacity list of play scores, highest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaderboard {
    scores: Vec<u32>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self {
            scores: vec![0; LEADERBOARD_CAPACITY],
        }
    }
}

impl Leaderboard {
    /// Parses whitespace-separated integers. Fewer entries than the capacity
    /// is a data error; extra entries are ranked and the lowest dropped.
    pub fn parse(text: &str) -> Result<Self, LeaderboardError> {
        let mut scores = Vec::with_capacity(LEADERBOARD_CAPACITY);
        for (index, token) in text.split_whitespace().enumerate() {
            let score = token
                .parse::<u32>()
                .map_err(|_| LeaderboardError::InvalidEntry {
                    index,
                    token: token.to_string(),
                })?;
            scores.push(score);
        }

        if scores.len() < LEADERBOARD_CAPACITY {
            return Err(LeaderboardError::TooFewEntries {
                found: scores.len(),
                expected: LEADERBOARD_CAPACITY,
            });
        }
        if scores.len() > LEADERBOARD_CAPACITY {
            warn!(
                found = scores.len(),
                capacity = LEADERBOARD_CAPACITY,
                "leaderboard has extra entries, keeping the highest"
            );
        }

        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores.truncate(LEADERBOARD_CAPACITY);
        Ok(Self { scores })
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn lowest(&self) -> u32 {
        self.scores.last().copied().unwrap_or(0)
    }

    pub fn qualifies(&self, score: u32) -> bool {
        score >= self.lowest()
    }

    /// Inserts a qualifying score and returns its zero-based rank. The lowest
    /// entry is evicted to keep the list at capacity.
    pub fn insert(&mut self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let rank = self
            .scores
            .iter()
            .position(|entry| score >= *entry)
            .unwrap_or(self.scores.len());
        self.scores.insert(rank, score);
        self.scores.truncate(LEADERBOARD_CAPACITY);
        (rank < LEADERBOARD_CAPACITY).then_some(rank)
    }

    /// Whitespace-separated form, written back in full.
    pub fn render(&self) -> String {
        let mut out = self
            .scores
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(text: &str) -> Leaderboard {
        Leaderboard::parse(text).unwrap()
    }

    #[test]
    fn parse_sorts_descending() {
        let board = board("3 9 1 4 4 0 12 7 2");
        assert_eq!(board.scores(), &[12, 9, 7, 4, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn too_few_entries_is_an_error() {
        assert_eq!(
            Leaderboard::parse("5 4 3 2 1 0 0 0"),
            Err(LeaderboardError::TooFewEntries {
                found: 8,
                expected: 9
            })
        );
        assert!(Leaderboard::parse("").is_err());
    }

    #[test]
    fn non_integer_entry_is_an_error() {
        assert_eq!(
            Leaderboard::parse("1 2 three 4 5 6 7 8 9"),
            Err(LeaderboardError::InvalidEntry {
                index: 2,
                token: "three".to_string()
            })
        );
    }

    #[test]
    fn extra_entries_are_truncated() {
        let board = board("1 2 3 4 5 6 7 8 9 10 11");
        assert_eq!(board.scores(), &[11, 10, 9, 8, 7, 6, 5, 4, 3]);
    }

    #[test]
    fn insert_evicts_lowest_and_stays_sorted() {
        let mut board = board("90 80 70 60 50 40 30 20 10");
        assert_eq!(board.insert(55), Some(4));
        assert_eq!(board.scores(), &[90, 80, 70, 60, 55, 50, 40, 30, 20]);

        assert_eq!(board.insert(5), None);
        assert_eq!(board.insert(20), Some(8));
        assert_eq!(board.scores().len(), LEADERBOARD_CAPACITY);
        assert!(board.scores().windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn default_board_accepts_zero_and_renders_whitespace() {
        let mut board = Leaderboard::default();
        assert_eq!(board.insert(0), Some(0));
        assert_eq!(board.insert(42), Some(0));
        assert_eq!(board.render(), "42 0 0 0 0 0 0 0 0\n");
        assert_eq!(Leaderboard::parse(&board.render()), Ok(board));
    }
}
