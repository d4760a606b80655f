pub mod api;
pub mod ui;

use actix_web::{HttpResponse, error::InternalError, web};

use crate::endpoints::api::schema::ErrorResponse;

/// Registers every route. Shared state is added by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .limit(4096)
        .error_handler(|err, _req| {
            let body = ErrorResponse {
                error: err.to_string(),
            };
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        });

    cfg.app_data(json)
        .service(api::routes::gallery)
        .service(api::routes::edge_colors)
        .service(api::routes::rsvp)
        .service(api::routes::get_image)
        .service(ui::routes::index)
        .service(ui::routes::stylesheet)
        .service(ui::routes::script)
        .service(ui::routes::favicon);
}
