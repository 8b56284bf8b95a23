use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, ChainResponse, DifficultyResponse, ValidateResponse};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.ledger.snapshot();
    let resp = ChainResponse {
        length: bc.len(),
        difficulty: bc.difficulty(),
        chain: bc.chain,
    };
    HttpResponse::Ok().json(resp)
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.ledger.snapshot();
    let verdict = bc.validate();
    let resp = ValidateResponse {
        valid: verdict.is_ok(),
        length: bc.len(),
        difficulty: bc.difficulty(),
        error: verdict.err().map(|e| e.to_string()),
    };
    HttpResponse::Ok().json(resp)
}

/// Get the PoW difficulty (fixed for the lifetime of the ledger).
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: state.ledger.difficulty(),
    })
}

/// Get the tail of the chain.
#[get("/latest/")]
pub async fn get_latest(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.ledger.last_block())
}
