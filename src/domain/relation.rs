//! Logical-relationship claims and their transformation into covers.
//!
//! The oracle reports, per target market, which other markets imply it and
//! which it implies. Claims reference markets loosely (an id the oracle may
//! have mangled, or a paraphrased question), so matching against the real
//! candidate set is tolerant. Matched claims become [`CoverRelationship`]s by
//! contrapositive:
//!
//! - `B implies T`  covers a T YES position with B NO (no T means no B);
//! - `T implies B`  covers a T NO position with B YES (T happening forces B).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::coverage::NECESSARY_PROBABILITY;
use super::ids::MarketId;
use super::market::{Market, Position};

/// Direction of a claimed implication relative to the target market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The referenced market implies the target.
    ImpliedBy,
    /// The target implies the referenced market.
    Implies,
}

/// An unverified relationship claim from the oracle. Ephemeral: it exists
/// only between one oracle call and cover transformation.
#[derive(Debug, Clone)]
pub struct ImplicationClaim {
    pub direction: Direction,
    pub market_id: String,
    pub market_question: String,
    pub explanation: String,
    pub counterexample_attempt: String,
}

/// A claim matched to a real market and turned into a hedging cover.
#[derive(Debug, Clone)]
pub struct CoverRelationship {
    pub target_position: Position,
    pub cover: Market,
    pub cover_position: Position,
    pub relationship: String,
    pub cover_probability: Decimal,
}

/// Resolve a claim's loose market reference against the candidate set.
///
/// Tries exact id, then case-insensitive question equality, then
/// bidirectional case-insensitive substring; first match wins. A claim that
/// resolves to the target itself is dropped.
pub fn match_claim<'a>(
    claim: &ImplicationClaim,
    target_id: &MarketId,
    candidates: &'a [Market],
) -> Option<&'a Market> {
    let matched = candidates
        .iter()
        .find(|m| m.id.as_str() == claim.market_id)
        .or_else(|| {
            let wanted = claim.market_question.to_lowercase();
            candidates
                .iter()
                .find(|m| m.question.to_lowercase() == wanted)
                .or_else(|| {
                    candidates.iter().find(|m| {
                        let q = m.question.to_lowercase();
                        q.contains(&wanted) || wanted.contains(&q)
                    })
                })
        })?;
    if matched.id == *target_id {
        return None;
    }
    Some(matched)
}

/// Transform a matched claim into the cover it supports.
///
/// The probability is the fixed necessary-relationship constant; oracle
/// confidence language is never trusted with a number.
pub fn to_cover(claim: &ImplicationClaim, cover_market: &Market) -> CoverRelationship {
    let (target_position, cover_position) = match claim.direction {
        Direction::ImpliedBy => (Position::Yes, Position::No),
        Direction::Implies => (Position::No, Position::Yes),
    };
    CoverRelationship {
        target_position,
        cover: cover_market.clone(),
        cover_position,
        relationship: claim.explanation.clone(),
        cover_probability: NECESSARY_PROBABILITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{ConditionId, TokenId};
    use rust_decimal_macros::dec;

    fn market(id: &str, question: &str) -> Market {
        Market {
            id: MarketId::new(id),
            question: question.into(),
            slug: id.into(),
            condition_id: ConditionId::new(format!("0x{id}")),
            yes_token: TokenId::new(format!("yes-{id}")),
            no_token: TokenId::new(format!("no-{id}")),
            yes_price: dec!(0.5),
            no_price: dec!(0.5),
            volume: dec!(0),
            volume_24h: dec!(0),
            liquidity: dec!(0),
            end_date: None,
            active: true,
            closed: false,
            resolved: false,
        }
    }

    fn claim(direction: Direction, id: &str, question: &str) -> ImplicationClaim {
        ImplicationClaim {
            direction,
            market_id: id.into(),
            market_question: question.into(),
            explanation: "one forces the other".into(),
            counterexample_attempt: "none found".into(),
        }
    }

    #[test]
    fn matches_by_exact_id_first() {
        let candidates = vec![
            market("10", "Will A win the final?"),
            market("20", "Will B win the final?"),
        ];
        let c = claim(Direction::ImpliedBy, "20", "Will A win the final?");
        let matched = match_claim(&c, &MarketId::new("99"), &candidates).unwrap();
        assert_eq!(matched.id.as_str(), "20");
    }

    #[test]
    fn falls_back_to_question_then_substring() {
        let candidates = vec![market("10", "Will the incumbent win the 2026 election?")];

        let exact = claim(Direction::Implies, "bogus", "will the incumbent win the 2026 election?");
        assert!(match_claim(&exact, &MarketId::new("99"), &candidates).is_some());

        let partial = claim(Direction::Implies, "bogus", "incumbent win the 2026");
        assert!(match_claim(&partial, &MarketId::new("99"), &candidates).is_some());
    }

    #[test]
    fn unmatched_and_self_references_drop() {
        let candidates = vec![market("10", "Will A happen?")];

        let unmatched = claim(Direction::Implies, "77", "completely unrelated text");
        assert!(match_claim(&unmatched, &MarketId::new("99"), &candidates).is_none());

        let self_ref = claim(Direction::Implies, "10", "Will A happen?");
        assert!(match_claim(&self_ref, &MarketId::new("10"), &candidates).is_none());
    }

    #[test]
    fn implied_by_covers_yes_with_no() {
        let cover_market = market("10", "Will A happen?");
        let c = claim(Direction::ImpliedBy, "10", "Will A happen?");
        let cover = to_cover(&c, &cover_market);
        assert_eq!(cover.target_position, Position::Yes);
        assert_eq!(cover.cover_position, Position::No);
        assert_eq!(cover.cover_probability, dec!(0.98));
    }

    #[test]
    fn implies_covers_no_with_yes() {
        let cover_market = market("10", "Will A happen?");
        let c = claim(Direction::Implies, "10", "Will A happen?");
        let cover = to_cover(&c, &cover_market);
        assert_eq!(cover.target_position, Position::No);
        assert_eq!(cover.cover_position, Position::Yes);
    }
}
