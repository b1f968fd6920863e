//! Command tokens: the words sent over the serial line, and the
//! receive-side line parser.
//!
//! Parsing is kept apart from acting on the result: [`parse_line`] only
//! classifies a line, it never touches LED state.

use core::fmt;

use crate::count::LedCount;

/// Every command line ends with this byte.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Receive-side alias for [`CommandToken::Zero`].
const ZERO_ALIAS: &[u8] = b"0";

// ════════════════════════════════════════════════════════════════════════════
// CommandToken
// ════════════════════════════════════════════════════════════════════════════

/// One of the six words that request a given [`LedCount`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandToken {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
}

impl CommandToken {
    /// All tokens, indexed by their count.
    pub const ALL: [CommandToken; 6] = [
        CommandToken::Zero,
        CommandToken::One,
        CommandToken::Two,
        CommandToken::Three,
        CommandToken::Four,
        CommandToken::Five,
    ];

    pub const fn from_count(count: LedCount) -> Self {
        match count.get() {
            0 => CommandToken::Zero,
            1 => CommandToken::One,
            2 => CommandToken::Two,
            3 => CommandToken::Three,
            4 => CommandToken::Four,
            _ => CommandToken::Five,
        }
    }

    pub const fn count(self) -> LedCount {
        LedCount::ALL[self as usize]
    }

    /// The word as transmitted, without terminator.
    pub const fn word(self) -> &'static str {
        match self {
            CommandToken::Zero  => "ZERO",
            CommandToken::One   => "ONE",
            CommandToken::Two   => "TWO",
            CommandToken::Three => "THREE",
            CommandToken::Four  => "FOUR",
            CommandToken::Five  => "FIVE",
        }
    }

    /// The full wire line, terminator included.
    pub const fn line(self) -> &'static str {
        match self {
            CommandToken::Zero  => "ZERO\n",
            CommandToken::One   => "ONE\n",
            CommandToken::Two   => "TWO\n",
            CommandToken::Three => "THREE\n",
            CommandToken::Four  => "FOUR\n",
            CommandToken::Five  => "FIVE\n",
        }
    }
}

impl From<LedCount> for CommandToken {
    fn from(count: LedCount) -> Self {
        CommandToken::from_count(count)
    }
}

impl fmt::Display for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Parsing
// ════════════════════════════════════════════════════════════════════════════

/// Result of classifying one received line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parsed {
    /// No vocabulary word prefixes the line.
    Unknown,
    Count(LedCount),
}

/// Classify a received line (terminator already stripped or not: anything
/// after the matched word is ignored).
///
/// Words are tried in order `ZERO`, `0`, `ONE`, `TWO`, `THREE`, `FOUR`,
/// `FIVE`; the first prefix match wins. Matching is case-sensitive. A line
/// such as `05` matches the `0` alias.
pub fn parse_line(line: &[u8]) -> Parsed {
    if line.starts_with(CommandToken::Zero.word().as_bytes()) || line.starts_with(ZERO_ALIAS) {
        return Parsed::Count(LedCount::ZERO);
    }
    CommandToken::ALL[1..]
        .iter()
        .find(|t| line.starts_with(t.word().as_bytes()))
        .map_or(Parsed::Unknown, |t| Parsed::Count(t.count()))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
