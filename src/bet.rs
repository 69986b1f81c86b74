//! Bet models: raw form input, validated submissions and stored records.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{LedgerError, Result};

/// Multiplier values whose payout is `base * mul` rather than `base + mul`.
pub const MULTIPLICATIVE_MULS: [u32; 2] = [3, 6];

/// Computes the money amount of a bet from its stake and multiplier.
///
/// A multiplier of exactly 3 or 6 multiplies the stake; any other value
/// (zero included) is added to it.
///
/// ```
/// use lotto_ledger::compute_amount;
///
/// assert_eq!(compute_amount(50, 3), 150);
/// assert_eq!(compute_amount(60, 0), 60);
/// assert_eq!(compute_amount(20, 5), 25);
/// ```
pub fn compute_amount(base: u32, mul: u32) -> u64 {
    if MULTIPLICATIVE_MULS.contains(&mul) {
        u64::from(base) * u64::from(mul)
    } else {
        u64::from(base) + u64::from(mul)
    }
}

/// Renders the formula shown next to a bet: `"{base}*{mul}"`, or just the
/// stake when there is no multiplier. Display only, never parsed back.
pub fn calc_text(base: u32, mul: u32) -> String {
    if mul != 0 {
        format!("{}*{}", base, mul)
    } else {
        base.to_string()
    }
}

/// Bet type label.
///
/// The four labels used on the sales form have named variants; any other
/// label is carried through as `Other` so new types never break grouping.
/// Equality, hashing and ordering go through [`BetType::label`], so
/// `Other("บน")` and `Top` are the same type.
#[derive(Debug, Clone, Default)]
pub enum BetType {
    /// "3 ตัวตรง", exact three digits.
    #[default]
    ThreeStraight,
    /// "3 ตัวโต๊ด", three digits in any order.
    ThreeToad,
    /// "บน", upper prize digits.
    Top,
    /// "ล่าง", lower prize digits.
    Bottom,
    /// Any label not offered by the form.
    Other(String),
}

impl BetType {
    /// The labels offered by the sales form, in display order.
    pub const KNOWN: [BetType; 4] = [
        BetType::ThreeStraight,
        BetType::ThreeToad,
        BetType::Top,
        BetType::Bottom,
    ];

    /// Maps a label onto its variant. Surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "3 ตัวตรง" => BetType::ThreeStraight,
            "3 ตัวโต๊ด" => BetType::ThreeToad,
            "บน" => BetType::Top,
            "ล่าง" => BetType::Bottom,
            other => BetType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BetType::ThreeStraight => "3 ตัวตรง",
            BetType::ThreeToad => "3 ตัวโต๊ด",
            BetType::Top => "บน",
            BetType::Bottom => "ล่าง",
            BetType::Other(label) => label,
        }
    }
}

impl PartialEq for BetType {
    fn eq(&self, other: &Self) -> bool {
        self.label() == other.label()
    }
}

impl Eq for BetType {}

impl Hash for BetType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label().hash(state);
    }
}

impl PartialOrd for BetType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BetType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}

impl FromStr for BetType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(BetType::from_label(s))
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for BetType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for BetType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(BetType::from_label(&s))
    }
}

/// Opaque record identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BetId(String);

impl BetId {
    pub fn new(id: impl Into<String>) -> Self {
        BetId(id.into())
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar day a record belongs to, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(date: NaiveDate) -> Self {
        DateKey(date)
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT).map(DateKey)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

/// Raw bet as typed into the sales form or read from an import file.
///
/// Stake fields are text; an empty or missing value counts as zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BetDraft {
    pub number: String,

    #[serde(rename = "type", default)]
    pub bet_type: String,

    #[serde(default)]
    pub base: Option<String>,

    #[serde(default)]
    pub mul: Option<String>,
}

impl BetDraft {
    pub fn new(
        number: impl Into<String>,
        bet_type: impl Into<String>,
        base: impl Into<String>,
        mul: impl Into<String>,
    ) -> Self {
        BetDraft {
            number: number.into(),
            bet_type: bet_type.into(),
            base: Some(base.into()),
            mul: Some(mul.into()),
        }
    }

    /// Validates the draft and derives its amount and formula text.
    ///
    /// Rejects an empty or non-numeric number, non-numeric stakes and a
    /// stake of zero. An empty bet type falls back to the form's default.
    pub fn validate(&self) -> Result<NewBet> {
        let number = self.number.trim();
        if number.is_empty() {
            return Err(LedgerError::validation("number", "must not be empty"));
        }
        if !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::validation(
                "number",
                format!("'{}' must contain digits only", number),
            ));
        }

        let base = parse_stake("base", self.base.as_deref())?;
        if base == 0 {
            return Err(LedgerError::validation("base", "must be greater than zero"));
        }
        let mul = parse_stake("mul", self.mul.as_deref())?;

        let bet_type = if self.bet_type.trim().is_empty() {
            BetType::default()
        } else {
            BetType::from_label(&self.bet_type)
        };

        Ok(NewBet::new(number, bet_type, base, mul))
    }
}

fn parse_stake(field: &'static str, raw: Option<&str>) -> Result<u32> {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Ok(0);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::validation(
            field,
            format!("'{}' is not a whole number", trimmed),
        ));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| LedgerError::validation(field, format!("'{}' is too large", trimmed)))
}

/// A validated bet ready to be handed to the store.
///
/// `calc` and `amount` are fixed here, at creation time, and travel with the
/// record from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBet {
    pub number: String,
    pub bet_type: BetType,
    pub base: u32,
    pub mul: u32,
    pub calc: String,
    pub amount: u64,
}

impl NewBet {
    pub fn new(number: impl Into<String>, bet_type: BetType, base: u32, mul: u32) -> Self {
        NewBet {
            number: number.into(),
            bet_type,
            base,
            mul,
            calc: calc_text(base, mul),
            amount: compute_amount(base, mul),
        }
    }

    /// Attaches the store-assigned identity.
    pub fn into_record(self, id: BetId, date: DateKey) -> BetRecord {
        BetRecord {
            id,
            number: self.number,
            bet_type: self.bet_type,
            base: self.base,
            mul: self.mul,
            calc: self.calc,
            amount: self.amount,
            date,
        }
    }
}

/// A stored bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetRecord {
    /// Assigned by the store, immutable.
    pub id: BetId,

    /// Lottery number, digits only.
    pub number: String,

    pub bet_type: BetType,

    /// Primary stake.
    pub base: u32,

    /// Multiplier or secondary stake.
    pub mul: u32,

    /// Formula text captured at creation.
    pub calc: String,

    /// Money amount captured at creation.
    pub amount: u64,

    /// Day the record belongs to.
    pub date: DateKey,
}

impl BetRecord {
    /// Returns `true` if this record belongs to the `(number, type)` group.
    pub fn is_in_group(&self, number: &str, bet_type: &BetType) -> bool {
        self.number == number && &self.bet_type == bet_type
    }
}
