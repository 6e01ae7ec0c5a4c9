use std::fmt;

use crate::error::ConfigError;
use crate::session::{MAX_OPERAND, MIN_OPERAND};

/// Rows shown per table
pub const TABLE_ROWS: u32 = 10;

/// Reference multiplication table for one number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimesTable {
    base: u32,
}

impl TimesTable {
    pub fn new(base: u32) -> Result<Self, ConfigError> {
        if !(MIN_OPERAND..=MAX_OPERAND).contains(&base) {
            return Err(ConfigError::OperandOutOfRange(base));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// `(multiplier, product)` pairs for 1..=10
    pub fn rows(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (1..=TABLE_ROWS).map(move |n| (n, self.base * n))
    }

    /// Every table the quiz can draw from
    pub fn all() -> impl Iterator<Item = TimesTable> {
        (MIN_OPERAND..=MAX_OPERAND).map(|base| TimesTable { base })
    }
}

impl fmt::Display for TimesTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Times Table", self.base)?;
        let width = (self.base * TABLE_ROWS).to_string().len();
        for (n, product) in self.rows() {
            writeln!(
                f,
                "{:>2} × {:>2} = {:>width$}",
                self.base,
                n,
                product,
                width = width
            )?;
        }
        Ok(())
    }
}
