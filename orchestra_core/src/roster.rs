//! Roster loading: positions file -> musicians with priority values.
//!
//! File format: first line is an integer N, followed by N lines of
//! two integers "x y". Any deviation is a fatal startup error.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use orchestra_env::MusicianId;

use crate::error::RosterError;
use crate::position::Position;

/// One musician as declared by the roster.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub id: MusicianId,
    pub position: Position,

    /// Drawn once at load time from `0..n^4`. The range makes ties unlikely
    /// but does not exclude them; the exchange policy's strict `>` means an
    /// actual tie can deadlock a pair of neighbors (documented liveness
    /// caveat, see the tie-break option in `ProtocolConfig`).
    pub priority_value: u64,
}

/// The full set of musicians for one run.
#[derive(Debug, Clone)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Builds a roster from explicit entries (scenario fixtures with chosen
    /// priority values).
    pub fn from_entries(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    /// Parses roster text and draws priority values from a seeded RNG.
    ///
    /// The same seed and text always produce the same roster.
    pub fn parse(text: &str, seed: u64) -> Result<Self, RosterError> {
        let mut lines = text.lines();
        let count_line = lines.next().ok_or(RosterError::Empty)?;
        // Parsed unsigned: a negative or garbage header is rejected as-is
        // instead of wrapping into a nonsense declared count.
        let declared: usize =
            count_line
                .trim()
                .parse()
                .map_err(|_| RosterError::InvalidNumber {
                    line: 1,
                    field: count_line.trim().to_string(),
                })?;

        let records: Vec<&str> = lines.collect();
        if records.len() != declared {
            return Err(RosterError::CountMismatch {
                declared,
                actual: records.len(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_priority = (declared as u64).saturating_pow(4).max(1);

        let mut entries = Vec::with_capacity(declared);
        for (i, record) in records.iter().enumerate() {
            let line = i + 2; // 1-based, after the count line
            let fields: Vec<&str> = record.split_whitespace().collect();
            if fields.len() != 2 {
                return Err(RosterError::InvalidRecord { line });
            }

            let x = parse_field(fields[0], line)?;
            let y = parse_field(fields[1], line)?;

            entries.push(RosterEntry {
                id: MusicianId::from_index(i),
                position: Position::new(x, y),
                priority_value: rng.gen_range(0..max_priority),
            });
        }

        Ok(Self { entries })
    }

    /// Reads and parses a positions file.
    pub fn load(path: &Path, seed: u64) -> Result<Self, RosterError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, seed)
    }

    /// All roster entries, in id order.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// All positions, in id order (graph builder input).
    pub fn positions(&self) -> Vec<Position> {
        self.entries.iter().map(|e| e.position).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_field(s: &str, line: usize) -> Result<i64, RosterError> {
    s.trim().parse().map_err(|_| RosterError::InvalidNumber {
        line,
        field: s.to_string(),
    })
}
