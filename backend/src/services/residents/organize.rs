use crate::error::ApiError;
use crate::importer::ImportServices;
use crate::normalizer::normalize_free_text;
use actix_web::{web, HttpResponse};
use common::requests::{OrganizeRequest, ResidentsResponse};

pub(crate) async fn process(
    services: web::Data<ImportServices>,
    req: web::Json<OrganizeRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = organize_text(&services, &req.text).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn organize_text(services: &ImportServices, text: &str) -> Result<ResidentsResponse, ApiError> {
    let residents = normalize_free_text(services.organizer.as_ref(), text).await?;
    Ok(ResidentsResponse { residents })
}
