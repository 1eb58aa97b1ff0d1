use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = job_id.into_inner();
    match state.status(&job_id).await {
        Some(status) => Ok(HttpResponse::Ok().json(status)),
        None => Err(ApiError::NotFound(format!("Job ID {} not found", job_id))),
    }
}
