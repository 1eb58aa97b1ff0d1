use crate::error::ApiError;
use crate::importer::ImportServices;
use crate::job_controller::state::{JobUpdate, JobsState};
use actix_web::{web, HttpResponse};
use common::error::ImportError;
use common::jobs::JobStatus;
use common::requests::{DispatchRequest, DispatchStarted};
use log::{info, warn};

pub(crate) async fn process(
    services: web::Data<ImportServices>,
    jobs_state: web::Data<JobsState>,
    req: web::Json<DispatchRequest>,
) -> Result<HttpResponse, ApiError> {
    let job_id = schedule_dispatch_job(&services, &jobs_state, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DispatchStarted { job_id }))
}

/// Validates the request, registers a job and runs the dispatch on its own
/// task. Progress is reported best-effort; the final status always lands.
async fn schedule_dispatch_job(
    services: &ImportServices,
    jobs_state: &JobsState,
    req: DispatchRequest,
) -> Result<String, ApiError> {
    if req.residents.is_empty() {
        return Err(ImportError::NothingSelected.into());
    }
    if req.context.building_id.trim().is_empty() {
        return Err(ApiError::BadRequest("A building is required".into()));
    }

    let job_id = jobs_state.register().await;
    info!(
        "job {}: {:?} for {} residents of building {}",
        job_id,
        req.mode,
        req.residents.len(),
        req.context.building_id
    );

    let dispatcher = services.dispatcher.clone();
    let tx = jobs_state.tx.clone();
    let value = job_id.clone();

    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let progress_id = value.clone();
        let result = dispatcher
            .dispatch(&req.context, req.mode, &req.residents, move |sent, total| {
                // a full channel only loses an intermediate report
                let _ = progress_tx.try_send(JobUpdate {
                    job_id: progress_id.clone(),
                    status: JobStatus::InProgress { sent, total },
                });
            })
            .await;

        let status = match result {
            Ok(batch) => JobStatus::Completed(batch),
            Err(e) => {
                warn!("job {} failed: {}", value, e);
                JobStatus::Failed(e.to_string())
            }
        };
        if tx
            .send(JobUpdate {
                job_id: value.clone(),
                status,
            })
            .await
            .is_err()
        {
            warn!("job {}: status updater is gone", value);
        }
    });

    Ok(job_id)
}
