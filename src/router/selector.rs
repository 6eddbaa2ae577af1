use std::cmp::Ordering;

use crate::models::QuoteCandidate;

/// Ranking order: deeper liquidity first, then larger output.
pub fn compare(a: &QuoteCandidate, b: &QuoteCandidate) -> Ordering {
    b.liquidity
        .cmp(&a.liquidity)
        .then_with(|| b.amount_out.cmp(&a.amount_out))
}

/// Best viable, executable candidate. Equal-ranked candidates resolve to the
/// one discovered first.
pub fn select_best(candidates: &[QuoteCandidate]) -> Option<&QuoteCandidate> {
    candidates
        .iter()
        .filter(|c| c.is_viable() && c.is_executable())
        .min_by(|a, b| compare(a, b))
}

/// Candidates in ranking order; ties keep discovery order.
pub fn rank(candidates: &[QuoteCandidate]) -> Vec<&QuoteCandidate> {
    let mut ranked: Vec<&QuoteCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| compare(a, b));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::token;
    use alloy_primitives::U256;
    use proptest::prelude::*;

    fn concentrated(fee_tier: u32, liquidity: u128, amount_out: u64) -> QuoteCandidate {
        QuoteCandidate::concentrated(fee_tier, U256::from(amount_out), liquidity)
    }

    #[test]
    fn test_liquidity_beats_output() {
        let candidates = vec![concentrated(5, 10, 900), concentrated(30, 50, 880)];
        assert_eq!(select_best(&candidates).unwrap().fee_tier, Some(30));
    }

    #[test]
    fn test_output_breaks_liquidity_tie() {
        let candidates = vec![concentrated(5, 50, 870), concentrated(30, 50, 880)];
        assert_eq!(select_best(&candidates).unwrap().fee_tier, Some(30));
    }

    #[test]
    fn test_first_discovered_wins_full_tie() {
        let candidates = vec![concentrated(100, 50, 880), concentrated(30, 50, 880)];
        assert_eq!(select_best(&candidates).unwrap().fee_tier, Some(100));
        assert_eq!(rank(&candidates)[0].fee_tier, Some(100));
    }

    #[test]
    fn test_skips_unviable_and_unexecutable() {
        let mut multi_hop = concentrated(30, 1_000, 5_000);
        multi_hop.path = vec![token(1, "A"), token(2, "B"), token(3, "C")];
        let candidates = vec![concentrated(5, 900, 0), multi_hop, concentrated(100, 1, 1)];
        assert_eq!(select_best(&candidates).unwrap().fee_tier, Some(100));
        assert!(select_best(&candidates[..2]).is_none());
        assert!(select_best(&[]).is_none());
    }

    proptest! {
        #[test]
        fn test_winner_dominates(entries in prop::collection::vec((0u128..20, 1u64..20), 1..12)) {
            let candidates: Vec<QuoteCandidate> = entries
                .iter()
                .enumerate()
                .map(|(i, (liq, out))| concentrated(i as u32 + 1, *liq, *out))
                .collect();
            let best = select_best(&candidates).unwrap();
            let first_index = candidates
                .iter()
                .position(|c| c.liquidity == best.liquidity && c.amount_out == best.amount_out)
                .unwrap();
            prop_assert_eq!(best.fee_tier, candidates[first_index].fee_tier);
            for other in &candidates {
                prop_assert!(best.liquidity >= other.liquidity);
                if other.liquidity == best.liquidity {
                    prop_assert!(best.amount_out >= other.amount_out);
                }
            }
        }
    }
}
