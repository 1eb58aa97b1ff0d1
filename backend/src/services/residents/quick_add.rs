use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use common::error::ImportError;
use common::quick_add::parse_email_list;
use common::requests::{QuickAddRequest, ResidentsResponse};

pub(crate) async fn process(req: web::Json<QuickAddRequest>) -> Result<HttpResponse, ApiError> {
    let residents = parse_email_list(&req.emails);
    if residents.is_empty() {
        return Err(ImportError::EmptyResult.into());
    }
    Ok(HttpResponse::Ok().json(ResidentsResponse { residents }))
}
