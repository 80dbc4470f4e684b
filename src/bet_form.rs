use crate::units::{
    format_amount,
    format_exact,
    parse_amount,
};
use alloy::primitives::{
    TxHash,
    U256,
};
use std::{
    collections::HashSet,
    fmt,
};

pub const MAX_ROWS: usize = 100;
pub const MAX_NUMBER: u8 = 99;

/// Which lottery method a bet targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BetKind {
    /// `betLo`: settled against many draws.
    #[default]
    MultiDraw,
    /// `betDe`: settled against one draw.
    SingleDraw,
}

impl BetKind {
    pub fn method_name(self) -> &'static str {
        match self {
            BetKind::MultiDraw => "betLo",
            BetKind::SingleDraw => "betDe",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BetKind::MultiDraw => BetKind::SingleDraw,
            BetKind::SingleDraw => BetKind::MultiDraw,
        }
    }
}

impl fmt::Display for BetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BetKind::MultiDraw => "Lo (27 draws)",
            BetKind::SingleDraw => "De (1 draw)",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetEntry {
    pub number: u8,
    pub stake: U256,
}

/// A validated bet: distinct numbers, 1 to 100 entries, every stake at or
/// above the minimum in force when it was collected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetSet {
    pub entries: Vec<BetEntry>,
    pub kind: BetKind,
}

impl BetSet {
    pub fn numbers(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.number).collect()
    }

    pub fn stakes(&self) -> Vec<U256> {
        self.entries.iter().map(|e| e.stake).collect()
    }

    pub fn total_stake(&self) -> U256 {
        self.entries
            .iter()
            .fold(U256::ZERO, |acc, e| acc.saturating_add(e.stake))
    }

    pub fn max_stake(&self) -> U256 {
        self.entries
            .iter()
            .map(|e| e.stake)
            .max()
            .unwrap_or(U256::ZERO)
    }
}

/// The last bet sent, kept for "repeat". Stakes stay in base units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedBet {
    pub entries: Vec<BetEntry>,
    pub kind: BetKind,
    pub total_stake: U256,
    pub tx_hash: TxHash,
}

impl SubmittedBet {
    pub fn new(bet: &BetSet, tx_hash: TxHash) -> Self {
        Self {
            entries: bet.entries.clone(),
            kind: bet.kind,
            total_stake: bet.total_stake(),
            tx_hash,
        }
    }
}

/// "NN: X FROLL" pairs joined with "; ".
pub fn describe_entries(entries: &[BetEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{:02}: {} FROLL", e.number, format_amount(e.stake, 6)))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid number in row {row}: please enter 00-99.")]
    InvalidNumber { row: usize },
    #[error("Duplicate number {number:02}: each number must be unique.")]
    DuplicateNumber { number: u8 },
    #[error("Invalid stake amount in row {row}.")]
    InvalidStake { row: usize },
    #[error("Each stake must be ≥ {} FROLL.", display_minimum(.minimum))]
    BelowMinimum { row: usize, minimum: U256 },
    #[error("Please enter at least one bet.")]
    EmptyBetSet,
    #[error("Maximum {MAX_ROWS} numbers per bet.")]
    TooManyEntries,
}

fn display_minimum(minimum: &U256) -> String {
    format_amount(*minimum, 18)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BetRow {
    pub number: String,
    pub stake: String,
}

impl BetRow {
    pub fn is_blank(&self) -> bool {
        self.number.trim().is_empty() && self.stake.trim().is_empty()
    }

    fn parsed_stake(&self) -> Option<U256> {
        parse_amount(&self.stake).ok().filter(|s| !s.is_zero())
    }
}

/// Rows of raw user text; always holds at least one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetForm {
    rows: Vec<BetRow>,
}

impl Default for BetForm {
    fn default() -> Self {
        Self {
            rows: vec![BetRow::default()],
        }
    }
}

impl BetForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[BetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(BetRow::is_blank)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut BetRow> {
        self.rows.get_mut(index)
    }

    /// Appends a blank row and returns its index.
    pub fn add_row(&mut self) -> Result<usize, ValidationError> {
        if self.rows.len() >= MAX_ROWS {
            return Err(ValidationError::TooManyEntries);
        }
        self.rows.push(BetRow::default());
        Ok(self.rows.len() - 1)
    }

    /// Removes a row unless it is the last one left.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    pub fn clear_row(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = BetRow::default();
        }
    }

    pub fn set_number(&mut self, index: usize, value: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.number = value.into();
        }
    }

    pub fn set_stake(&mut self, index: usize, value: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            row.stake = value.into();
        }
    }

    /// Exact sum over rows whose stake parses to a positive amount.
    pub fn total_stake(&self) -> U256 {
        self.rows
            .iter()
            .filter_map(BetRow::parsed_stake)
            .fold(U256::ZERO, |acc, s| acc.saturating_add(s))
    }

    pub fn collect(&self, min_stake: U256, kind: BetKind) -> Result<BetSet, ValidationError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (index, row) in self.rows.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            let row_no = index + 1;
            let number = parse_number(&row.number)
                .ok_or(ValidationError::InvalidNumber { row: row_no })?;
            if !seen.insert(number) {
                return Err(ValidationError::DuplicateNumber { number });
            }
            let stake = row
                .parsed_stake()
                .ok_or(ValidationError::InvalidStake { row: row_no })?;
            if stake < min_stake {
                return Err(ValidationError::BelowMinimum {
                    row: row_no,
                    minimum: min_stake,
                });
            }
            entries.push(BetEntry { number, stake });
        }

        if entries.is_empty() {
            return Err(ValidationError::EmptyBetSet);
        }
        if entries.len() > MAX_ROWS {
            return Err(ValidationError::TooManyEntries);
        }
        Ok(BetSet { entries, kind })
    }

    /// Refills the form with the entries of a previous bet.
    pub fn repeat(&mut self, bet: &SubmittedBet) {
        if bet.entries.is_empty() {
            return;
        }
        self.rows = bet
            .entries
            .iter()
            .take(MAX_ROWS)
            .map(|e| BetRow {
                number: format!("{:02}", e.number),
                stake: format_exact(e.stake),
            })
            .collect();
    }

    pub fn double_stakes(&mut self) {
        self.map_stakes(|s| s.saturating_mul(U256::from(2u64)));
    }

    /// Halves in base units; an odd base-unit amount rounds down.
    pub fn halve_stakes(&mut self) {
        self.map_stakes(|s| s / U256::from(2u64));
    }

    fn map_stakes(&mut self, f: impl Fn(U256) -> U256) {
        for row in &mut self.rows {
            if let Some(stake) = row.parsed_stake() {
                row.stake = format_exact(f(stake));
            }
        }
    }
}

fn parse_number(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>()
        .ok()
        .filter(|n| *n <= MAX_NUMBER as u32)
        .map(|n| n as u8)
}
