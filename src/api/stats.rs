use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, ResultsResponse};

/// Votes per candidate, counted from the chain.
#[get("/results/")]
pub async fn get_results(state: web::Data<AppState>) -> impl Responder {
    let results = state.ledger.tally();
    HttpResponse::Ok().json(ResultsResponse {
        total_votes: results.values().sum(),
        results,
    })
}
