use std::sync::Arc;
use std::time::Duration;

use crate::asset_cache::{
    asset::etag,
    cache::{AssetCache, fetch_asset},
};
use crate::config::AppConfig;
use crate::content::WeddingContent;
use crate::edge_color::edge_colors_for;
use crate::endpoints::api::schema::{CompressQuery, EdgeColorQuery, RsvpAccepted};
use crate::gallery::selector::GallerySource;
use crate::rsvp::{RsvpError, form::RsvpRequest, notifier::SlackNotifier};
use actix_web::{
    HttpRequest, HttpResponse, Responder, get,
    http::header::{self, ContentType},
    post, web,
};
use log::{error, info};
use tokio::sync::Mutex;

#[get("/api/gallery")]
async fn gallery(
    config: web::Data<AppConfig>,
    content: web::Data<WeddingContent>,
) -> impl Responder {
    let selection = GallerySource::new(&config, &content).select_images(&mut rand::rng());

    HttpResponse::Ok()
        .content_type(ContentType::json())
        .json(selection)
}

#[get("/api/edge-colors")]
async fn edge_colors(
    config: web::Data<AppConfig>,
    cache: web::Data<Arc<Mutex<AssetCache>>>,
    query: web::Query<EdgeColorQuery>,
) -> impl Responder {
    let timeout = Duration::from_millis(config.sample_timeout_ms);
    let colors = edge_colors_for(&cache, &query.src, timeout).await;

    HttpResponse::Ok().json(colors)
}

#[post("/api/rsvp")]
async fn rsvp(
    content: web::Data<WeddingContent>,
    notifier: web::Data<SlackNotifier>,
    body: web::Json<RsvpRequest>,
) -> Result<HttpResponse, RsvpError> {
    if !content.rsvp.enabled {
        return Err(RsvpError::Disabled);
    }

    let submission = body.into_inner().validate(&content.rsvp)?;
    info!(
        "RSVP {} from {} ({})",
        submission.id,
        submission.name,
        submission.side.label()
    );

    if let Err(e) = notifier.notify(&submission).await {
        error!("RSVP {} was not delivered: {}", submission.id, e);
        return Err(e);
    }

    Ok(HttpResponse::Ok().json(RsvpAccepted {
        ok: true,
        id: submission.id,
    }))
}

#[get("/images/{path:.*}")]
async fn get_image(
    req: HttpRequest,
    cache: web::Data<Arc<Mutex<AssetCache>>>,
    path: web::Path<String>,
    query: web::Query<CompressQuery>,
) -> impl Responder {
    let key = format!("/images/{}", path.into_inner());
    let compressed = query.compress.is_some();

    match fetch_asset(&cache, &key, compressed).await {
        Ok(asset) => {
            let (content_type, image) = asset.into_body(compressed);
            let tag = etag(&image);
            let fresh = req
                .headers()
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .map(|v| v == tag)
                .unwrap_or(false);
            if fresh {
                return HttpResponse::NotModified()
                    .insert_header((header::ETAG, tag))
                    .finish();
            }

            HttpResponse::Ok()
                .content_type(content_type)
                .insert_header((header::ETAG, tag))
                .body(image)
        }
        Err(e) => {
            error!("Error with requested file {:?}", e);
            HttpResponse::NotFound().finish()
        }
    }
}
