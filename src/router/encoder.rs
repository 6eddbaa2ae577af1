//! Turns the winning candidate into the execution layout. Every per-format
//! field rule is checked here; a candidate that breaks one is rejected as
//! is, never patched up.

use alloy_primitives::Address;

use crate::error::EncodeError;
use crate::models::{
    apply_slippage, ExecutionRoute, PoolFormat, PoolKey, QuoteCandidate, QuoteRequest,
};

fn violation(candidate: &QuoteCandidate, field: &'static str, detail: String) -> EncodeError {
    tracing::error!(
        format = %candidate.format,
        field,
        detail = %detail,
        candidate = ?candidate,
        "route invariant violated"
    );
    EncodeError::InvariantViolation {
        format: candidate.format,
        field,
        detail,
    }
}

fn check(candidate: &QuoteCandidate, request: &QuoteRequest) -> Result<(), EncodeError> {
    if !candidate.is_viable() {
        return Err(violation(candidate, "amountOut", "zero output is not viable".to_string()));
    }

    let fee_tier = candidate.fee_tier.unwrap_or(0);
    match candidate.format {
        PoolFormat::ConstantProduct => {
            if candidate.path.len() < 2 {
                return Err(violation(
                    candidate,
                    "path",
                    format!("needs at least 2 tokens, got {}", candidate.path.len()),
                ));
            }
            let (first, last) = (&candidate.path[0], &candidate.path[candidate.path.len() - 1]);
            if !first.same_asset(&request.token_in) || !last.same_asset(&request.token_out) {
                return Err(violation(
                    candidate,
                    "path",
                    format!(
                        "path {} -> {} does not connect {} -> {}",
                        first, last, request.token_in, request.token_out
                    ),
                ));
            }
            if fee_tier != 0 {
                return Err(violation(candidate, "feeTier", format!("must be 0, got {}", fee_tier)));
            }
            if !candidate.route_data.is_empty() {
                return Err(violation(
                    candidate,
                    "routeData",
                    format!("must be empty, got {} bytes", candidate.route_data.len()),
                ));
            }
        }
        PoolFormat::Concentrated => {
            if !candidate.path.is_empty() {
                return Err(violation(
                    candidate,
                    "path",
                    format!("must be empty, got {} tokens", candidate.path.len()),
                ));
            }
            if fee_tier == 0 {
                return Err(violation(candidate, "feeTier", "must be positive".to_string()));
            }
            if !candidate.route_data.is_empty() {
                return Err(violation(
                    candidate,
                    "routeData",
                    format!("must be empty, got {} bytes", candidate.route_data.len()),
                ));
            }
        }
        PoolFormat::Hooked => {
            if !candidate.path.is_empty() {
                return Err(violation(
                    candidate,
                    "path",
                    format!("must be empty, got {} tokens", candidate.path.len()),
                ));
            }
            if fee_tier == 0 {
                return Err(violation(candidate, "feeTier", "must be positive".to_string()));
            }
            if candidate.hook.is_some() && candidate.route_data.is_empty() {
                return Err(violation(
                    candidate,
                    "routeData",
                    "hooked pool needs pool addressing".to_string(),
                ));
            }
            let data = &candidate.route_data;
            if !data.is_empty() && PoolKey::decode_all(data).is_none() {
                return Err(violation(
                    candidate,
                    "routeData",
                    format!("{} bytes is not a sequence of pool keys", data.len()),
                ));
            }
        }
    }
    Ok(())
}

/// Validate `candidate` and fold in the caller's execution parameters.
pub fn encode_route(
    candidate: &QuoteCandidate,
    request: &QuoteRequest,
) -> Result<ExecutionRoute, EncodeError> {
    check(candidate, request)?;
    Ok(ExecutionRoute {
        token_in: request.token_in.clone(),
        token_out: request.token_out.clone(),
        format: candidate.format,
        fee_tier: candidate.fee_tier.unwrap_or(0),
        path: candidate.path.iter().map(|token| token.address).collect::<Vec<Address>>(),
        route_data: candidate.route_data.clone(),
        hook_data: request.hook_data(),
        recipient: request.params.recipient,
        referral: request.params.referral,
        amount_in: request.amount_in,
        expected_amount_out: candidate.amount_out,
        min_amount_out: apply_slippage(candidate.amount_out, request.params.slippage_bps),
        slippage_bps: request.params.slippage_bps,
    })
}
