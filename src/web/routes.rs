use actix_web::web;
use crate::web::handlers;

const CONTACT_FORM_LIMIT: usize = 64 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(|err, _req| handlers::invalid_json(err).into()),
    )
    .app_data(
        web::FormConfig::default()
            .limit(CONTACT_FORM_LIMIT)
            .error_handler(handlers::invalid_form),
    )
    .route("/", web::get().to(handlers::index))
    .route("/about", web::get().to(handlers::about))
    .service(
        web::resource("/contact")
            .route(web::get().to(handlers::contact_page))
            .route(web::post().to(handlers::contact_submit)),
    )
    .route("/daily_posts", web::get().to(handlers::daily_posts))
    .route("/chat_box", web::get().to(handlers::chat_box))
    .route("/how_it_works", web::get().to(handlers::how_it_works))
    .route("/api/live-posts/", web::post().to(handlers::live_posts))
    .route("/chat-ai/", web::post().to(handlers::chat))
    .route("/health/", web::get().to(handlers::health_check));
}
