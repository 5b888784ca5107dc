use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Five-band label derived from a composite technical recommendation score.
///
/// Variants are declared from most bearish to most bullish so the derived `Ord` follows the
/// score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingLabel {
    #[serde(rename = "Strong Sell")]
    StrongSell,
    #[serde(rename = "Sell")]
    Sell,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl RatingLabel {
    pub const ALL: [RatingLabel; 5] = [
        RatingLabel::StrongSell,
        RatingLabel::Sell,
        RatingLabel::Neutral,
        RatingLabel::Buy,
        RatingLabel::StrongBuy,
    ];

    /// Bands are half-open and checked top-down. NaN fails every comparison and lands in
    /// `StrongSell`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            RatingLabel::StrongBuy
        } else if score >= 0.1 {
            RatingLabel::Buy
        } else if score >= -0.1 {
            RatingLabel::Neutral
        } else if score >= -0.5 {
            RatingLabel::Sell
        } else {
            RatingLabel::StrongSell
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatingLabel::StrongSell => "Strong Sell",
            RatingLabel::Sell => "Sell",
            RatingLabel::Neutral => "Neutral",
            RatingLabel::Buy => "Buy",
            RatingLabel::StrongBuy => "Strong Buy",
        }
    }
}

pub fn classify(score: f64) -> RatingLabel {
    RatingLabel::from_score(score)
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRatingLabel(pub String);

impl fmt::Display for UnknownRatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rating label: {:?}", self.0)
    }
}

impl std::error::Error for UnknownRatingLabel {}

impl FromStr for RatingLabel {
    type Err = UnknownRatingLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatingLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownRatingLabel(s.to_string()))
    }
}
