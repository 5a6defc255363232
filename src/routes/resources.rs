use actix_web::{web, HttpResponse};

use crate::core::MatchingError;
use crate::models::{ResourceListResponse, ResourceQuery};
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/resources", web::get().to(list_resources))
        .route("/resources/{id}", web::get().to(get_resource));
}

/// GET /api/v1/resources?category=transport&featured=true
async fn list_resources(
    state: web::Data<AppState>,
    query: web::Query<ResourceQuery>,
) -> HttpResponse {
    let mut resources = match query.category {
        Some(category) => state.resources.by_category(category),
        None => state.resources.all(),
    };
    if let Some(featured) = query.featured {
        resources.retain(|r| r.featured == featured);
    }

    HttpResponse::Ok().json(ResourceListResponse { resources })
}

/// GET /api/v1/resources/{id}
async fn get_resource(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let resource = state
        .resources
        .get(&id)
        .ok_or_else(|| MatchingError::NotFound(format!("resource {}", id)))?;

    Ok(HttpResponse::Ok().json(resource))
}
