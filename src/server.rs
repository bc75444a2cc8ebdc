use crate::data::{ScheduleOutput, SchedulingInput, SolveOptions};
use crate::error::SolveError;
use crate::pipeline;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolveRequest {
    #[serde(flatten)]
    input: SchedulingInput,
    #[serde(default)]
    options: SolveOptions,
}

async fn solve_handler(
    Json(request): Json<SolveRequest>,
) -> Result<Json<ScheduleOutput>, (StatusCode, String)> {
    match pipeline::solve_schedule(&request.input, &request.options) {
        Ok(output) => Ok(Json(output)),
        Err(e) => Err((status_for(&e), e.to_string())),
    }
}

fn status_for(error: &SolveError) -> StatusCode {
    match error {
        SolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SolveError::Infeasible(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SolveError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        SolveError::Solver(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/schedule/solve", post(solve_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
