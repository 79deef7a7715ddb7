//! Implication extraction through the reasoning oracle.
//!
//! One oracle call per target market, against the full candidate list. The
//! completion is expected to be JSON but treated as hostile input: fenced,
//! prefixed with prose, or outright garbage. Anything unparseable yields an
//! empty claim set rather than an error, so one bad completion never stops a
//! scan.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{Direction, ImplicationClaim, Market};
use crate::error::Result;
use crate::port::oracle::{ChatMessage, Oracle};

const EXTRACTION_TEMPERATURE: f32 = 0.1;
const EXTRACTION_MAX_TOKENS: u32 = 4096;

const IMPLICATION_PROMPT_HEADER: &str = r#"Find ONLY logically necessary relationships between prediction market events.

## TARGET EVENT:
"#;

const IMPLICATION_PROMPT_RULES: &str = r#"
## WHAT IS "NECESSARY"?

A **NECESSARY** implication (A -> B) means: "If A is true, B MUST be true BY DEFINITION OR PHYSICAL LAW."

There must be ZERO possible scenarios where A=YES and B=NO. Not "unlikely" - IMPOSSIBLE.

## VALID NECESSARY RELATIONSHIPS (include these):
- "election held" -> "election called" (DEFINITION: can't hold without calling)
- "city captured" -> "military operation in city" (PHYSICAL: can't capture without entering)
- "person dies" -> "person was alive" (LOGICAL: death requires prior life)

## NOT NECESSARY - DO NOT INCLUDE:
- "war started" -> "peace talks failed" (WRONG: war can start without talks)
- "election called" -> "election held" (WRONG: can be cancelled)
- "ceasefire broken" -> "war escalates" (WRONG: could de-escalate)
- "candidate wins primary" -> "candidate wins general" (WRONG: can lose general)
- MUTUALLY EXCLUSIVE outcomes: if one happens the other does NOT; that is not an implication of YES.
- STRADDLES: two events in the same topic are NOT an implication.

## YOUR TASK

### 1. implied_by (OTHER -> TARGET): What GUARANTEES the target?
- "If OTHER=YES, then TARGET=YES is 100% CERTAIN"

### 2. implies (TARGET -> OTHER): What does the target GUARANTEE?
- "If TARGET=YES, then OTHER=YES is 100% CERTAIN"

## STRICT COUNTEREXAMPLE TEST (REQUIRED)

For EACH relationship, you MUST:
1. Try to construct a scenario that violates the implication
2. If you can imagine ANY such scenario (even unlikely), DO NOT INCLUDE IT
3. If you are guessing "if they do X, they will probably do Y", STOP. That is a correlation.

## OUTPUT FORMAT (JSON only):
```json
{
  "implied_by": [
    {
      "market_id": "exact id from list",
      "market_question": "exact question from list",
      "explanation": "why other=YES makes target=YES logically certain",
      "counterexample_attempt": "I tried to imagine [scenario] but it's impossible because [reason]"
    }
  ],
  "implies": []
}
```

## CRITICAL RULES:
1. QUALITY OVER QUANTITY - empty lists are fine, false positives are NOT
2. "Likely" or "usually" means DO NOT INCLUDE
3. Correlations are NOT implications
4. Political/social predictions are almost NEVER necessary
5. When in doubt, LEAVE IT OUT
"#;

#[derive(Debug, Default, Deserialize)]
struct RawClaims {
    #[serde(default)]
    implied_by: Vec<RawClaim>,
    #[serde(default)]
    implies: Vec<RawClaim>,
}

#[derive(Debug, Deserialize)]
struct RawClaim {
    #[serde(default)]
    market_id: String,
    #[serde(default)]
    market_question: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    counterexample_attempt: String,
}

impl RawClaim {
    fn into_claim(self, direction: Direction) -> ImplicationClaim {
        ImplicationClaim {
            direction,
            market_id: self.market_id,
            market_question: self.market_question,
            explanation: self.explanation,
            counterexample_attempt: self.counterexample_attempt,
        }
    }
}

/// Build the extraction prompt for one target against its candidate list.
fn build_prompt(target: &Market, candidates: &[Market]) -> String {
    let mut listing = String::new();
    for market in candidates {
        if market.id == target.id {
            continue;
        }
        listing.push_str(&format!(
            "- ID: {}, Question: {}\n",
            market.id, market.question
        ));
    }
    format!(
        "{IMPLICATION_PROMPT_HEADER}\"{}\"\n\n## AVAILABLE EVENTS:\n{listing}{IMPLICATION_PROMPT_RULES}",
        target.question
    )
}

/// Pull a claim set out of an oracle completion.
///
/// Fence markers are stripped, then a direct parse is attempted, then the
/// outermost brace span. Nothing parseable means no claims.
fn parse_claims(text: &str) -> Vec<ImplicationClaim> {
    let mut body = text.trim();
    if let Some(after) = body.split("```json").nth(1) {
        body = after;
    }
    if let Some(before) = body.split("```").next() {
        body = before;
    }
    let body = body.trim();

    let raw: RawClaims = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(_) => {
            let span = body
                .find('{')
                .and_then(|start| body.rfind('}').map(|end| (start, end)));
            match span {
                Some((start, end)) if start < end => {
                    serde_json::from_str(&body[start..=end]).unwrap_or_default()
                }
                _ => RawClaims::default(),
            }
        }
    };

    raw.implied_by
        .into_iter()
        .map(|c| c.into_claim(Direction::ImpliedBy))
        .chain(
            raw.implies
                .into_iter()
                .map(|c| c.into_claim(Direction::Implies)),
        )
        .collect()
}

/// Extracts implication claims for target markets.
pub struct ImplicationExtractor {
    oracle: Arc<dyn Oracle>,
}

impl ImplicationExtractor {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Ask the oracle for implications of `target` among `candidates`.
    ///
    /// Transport failures surface as errors; malformed completions do not.
    pub async fn extract(
        &self,
        target: &Market,
        candidates: &[Market],
    ) -> Result<Vec<ImplicationClaim>> {
        let prompt = build_prompt(target, candidates);
        let completion = self
            .oracle
            .complete(
                &[ChatMessage::user(prompt)],
                EXTRACTION_TEMPERATURE,
                EXTRACTION_MAX_TOKENS,
            )
            .await?;

        let claims = parse_claims(&completion);
        if claims.is_empty() {
            debug!(target = %target.id, "no claims extracted");
        } else {
            debug!(target = %target.id, count = claims.len(), "claims extracted");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConditionId, MarketId, TokenId};
    use crate::port::oracle::tests::MockOracle;
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

    const GOOD_COMPLETION: &str = r#"{
        "implied_by": [
            {
                "market_id": "2",
                "market_question": "Will the city be captured?",
                "explanation": "capture requires an operation",
                "counterexample_attempt": "impossible without entering"
            }
        ],
        "implies": []
    }"#;

    #[test]
    fn parses_plain_json() {
        let claims = parse_claims(GOOD_COMPLETION);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].direction, Direction::ImpliedBy);
        assert_eq!(claims[0].market_id, "2");
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let fenced = format!("Here is my analysis:\n```json\n{GOOD_COMPLETION}\n```\nDone.");
        let claims = parse_claims(&fenced);
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn parses_json_embedded_in_text() {
        let embedded = format!("The answer follows. {GOOD_COMPLETION} That is all.");
        let claims = parse_claims(&embedded);
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn garbage_yields_empty_claims() {
        assert!(parse_claims("I could not find any relationships.").is_empty());
        assert!(parse_claims("").is_empty());
        assert!(parse_claims("{ broken json").is_empty());
        assert!(parse_claims("[1, 2, 3]").is_empty());
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let claims = parse_claims(r#"{"implies": [{"market_id": "9"}]}"#);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].direction, Direction::Implies);
        assert!(claims[0].explanation.is_empty());
    }

    #[test]
    fn prompt_excludes_target_from_listing() {
        let target = market("1", "Will the operation happen?");
        let candidates = vec![target.clone(), market("2", "Will the city be captured?")];
        let prompt = build_prompt(&target, &candidates);
        assert!(prompt.contains("ID: 2"));
        assert!(!prompt.contains("ID: 1,"));
        assert!(prompt.contains("Will the operation happen?"));
    }

    #[tokio::test]
    async fn extraction_round_trip_through_oracle() {
        let oracle = Arc::new(MockOracle::replying(GOOD_COMPLETION));
        let extractor = ImplicationExtractor::new(oracle);
        let target = market("1", "Will the operation happen?");
        let candidates = vec![target.clone(), market("2", "Will the city be captured?")];

        let claims = extractor.extract(&target, &candidates).await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].market_question, "Will the city be captured?");
    }
}
