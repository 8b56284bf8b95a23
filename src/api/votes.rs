use actix_web::{HttpResponse, Responder, post, web};
use log::{info, warn};

use super::models::{AppState, VoteRequest, VoteResponse};
use crate::blockchain::{CancelToken, ChainError};

/// Marks a voter as in flight. Lives inside the blocking mining task, so
/// the voter stays reserved until that task has appended or given up.
struct VoterReservation {
    state: web::Data<AppState>,
    voter: String,
}

impl Drop for VoterReservation {
    fn drop(&mut self) {
        let mut pending = self.state.pending_voters.lock().expect("mutex poisoned");
        pending.remove(&self.voter);
    }
}

/// Stops the mining task when the request future goes away.
struct CancelOnDrop(CancelToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Record a vote:
/// - Refuse if the ledger no longer validates
/// - Refuse a voter already on the chain or currently being mined
/// - Mine the block on the blocking pool; the mining timeout starts once
///   the block is at the head of the append queue
#[post("/votes/")]
pub async fn post_vote(state: web::Data<AppState>, body: web::Json<VoteRequest>) -> impl Responder {
    let voter = body.voter.trim().to_string();
    let candidate = body.candidate.trim().to_string();
    if voter.is_empty() || candidate.is_empty() {
        return HttpResponse::BadRequest().body("voter and candidate required");
    }

    if let Err(e) = state.ledger.validate() {
        warn!("VOTE - refusing vote from {}: {}", voter, e);
        return HttpResponse::Conflict().body(format!("ledger failed validation: {e}"));
    }

    let reservation = {
        let mut pending = state.pending_voters.lock().expect("mutex poisoned");
        if pending.contains(&voter) || state.ledger.has_voted(&voter) {
            return HttpResponse::Conflict().body("voter has already voted");
        }
        pending.insert(voter.clone());
        VoterReservation {
            state: state.clone(),
            voter: voter.clone(),
        }
    };

    let cancel = CancelOnDrop(CancelToken::new());
    let token = cancel.0.clone();
    let ledger_state = state.clone();
    let timeout = state.mining_timeout;
    let result = web::block(move || {
        let _reservation = reservation;
        ledger_state
            .ledger
            .append_vote_within(&voter, &candidate, &token, timeout)
    })
    .await;
    drop(cancel);

    match result {
        Ok(Ok(block)) => {
            info!(
                "VOTE - recorded in block #{} (hash={})",
                block.index, block.hash
            );
            HttpResponse::Created().json(VoteResponse::from(block))
        }
        Ok(Err(e @ ChainError::MiningCancelled { .. })) => {
            warn!("VOTE - {}", e);
            HttpResponse::ServiceUnavailable().body(e.to_string())
        }
        Ok(Err(e @ ChainError::InvalidVote(_))) => HttpResponse::BadRequest().body(e.to_string()),
        Ok(Err(e)) => HttpResponse::InternalServerError().body(e.to_string()),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
