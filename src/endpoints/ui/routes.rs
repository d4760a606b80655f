use crate::{
    asset_cache::cache::AssetCache,
    config::AppConfig,
    content::WeddingContent,
    edge_color::edge_colors_for,
    endpoints::ui::pages::IndexPage,
    gallery::{hero::resolve_main_image, selector::GallerySource},
};
use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use askama::Template;
use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

#[get("/")]
async fn index(
    config: web::Data<AppConfig>,
    content: web::Data<WeddingContent>,
    cache: web::Data<Arc<Mutex<AssetCache>>>,
) -> impl Responder {
    // Fresh picks on every render.
    let (hero_image, gallery) = {
        let mut rng = rand::rng();
        let hero = resolve_main_image(&config.manifest_path(), &content.main.image, &mut rng);
        let gallery = GallerySource::new(&config, &content).select_images(&mut rng);
        (hero, gallery)
    };

    let timeout = Duration::from_millis(config.sample_timeout_ms);
    let edge_colors = edge_colors_for(&cache, &hero_image, timeout).await;

    let page = IndexPage::new(&content, hero_image, edge_colors, gallery.images);
    match page.render() {
        Ok(page) => HttpResponse::Ok().content_type(ContentType::html()).body(page),
        Err(_) => HttpResponse::InternalServerError().body("Error templating invitation page"),
    }
}

#[get("/static/site.css")]
async fn stylesheet() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/css; charset=utf-8")
        .body(&include_bytes!("../../../static/site.css")[..])
}

#[get("/static/site.js")]
async fn script() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/javascript; charset=utf-8")
        .body(&include_bytes!("../../../static/site.js")[..])
}

#[get("/favicon.svg")]
async fn favicon() -> impl Responder {
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(&include_bytes!("../../../static/favicon.svg")[..])
}
