use actix_web::error::{InternalError, UrlencodedError};
use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use serde_json::json;
use tera::Context;
use uuid::Uuid;

use crate::contact::{ContactError, ContactForm};
use crate::error::ChatError;
use crate::news::NewsError;
use crate::state::AppState;
use crate::web::models::{ChatPayload, ChatResponse, ContactResponse, HealthReport};

fn render(data: &AppState, template: &str, context: &Context) -> HttpResponse {
    match data.tera.render(template, context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error in {}: {}", template, e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

fn page(data: &AppState, template: &str, name: &str) -> HttpResponse {
    let mut context = Context::new();
    context.insert("page", name);
    render(data, template, &context)
}

pub async fn index(data: web::Data<AppState>) -> impl Responder {
    page(&data, "home.html", "home")
}

pub async fn about(data: web::Data<AppState>) -> impl Responder {
    page(&data, "about.html", "about")
}

pub async fn daily_posts(data: web::Data<AppState>) -> impl Responder {
    page(&data, "daily_posts.html", "daily_posts")
}

pub async fn chat_box(data: web::Data<AppState>) -> impl Responder {
    page(&data, "chat_box.html", "chat_box")
}

pub async fn how_it_works(data: web::Data<AppState>) -> impl Responder {
    page(&data, "how_it_works.html", "how_it_works")
}

pub async fn contact_page(data: web::Data<AppState>) -> impl Responder {
    page(&data, "contact.html", "contact")
}

// Health check endpoint
pub async fn health_check(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthReport {
        status: "ok".to_string(),
        chat_configured: data.relay.is_configured(),
        news_configured: data.news.config().api_key.is_some(),
        news_filter_english: data.news.config().filter_english,
        email_configured: data.contact.is_configured(),
        method: req.method().to_string(),
        path: req.path().to_string(),
        request_id: Uuid::new_v4(),
    })
}

// Chat API endpoint
pub async fn chat(
    data: web::Data<AppState>,
    payload: web::Json<ChatPayload>,
) -> Result<HttpResponse, ChatError> {
    let payload = payload.into_inner();
    let request_id = Uuid::new_v4();
    info!(
        "Chat request {} (new chat: {}, {} chars)",
        request_id,
        payload.is_new_chat.unwrap_or(false),
        payload.message.as_deref().map_or(0, |m| m.chars().count())
    );

    let reply = data.relay.handle(payload.into()).await.map_err(|e| {
        error!("Chat request {} failed: {}", request_id, e);
        e
    })?;

    Ok(HttpResponse::Ok().json(ChatResponse { response: reply.text }))
}

// Live health news endpoint
pub async fn live_posts(data: web::Data<AppState>) -> impl Responder {
    match data.news.fetch().await {
        Ok(feed) => HttpResponse::Ok().json(feed),
        Err(NewsError::MissingApiKey) => {
            error!("NewsAPI key not found in environment variables");
            HttpResponse::InternalServerError().json(json!({
                "articles": [],
                "status": "error",
                "newsapi_message": NewsError::MissingApiKey.to_string(),
            }))
        }
        Err(e) => {
            error!("NewsAPI fetch error: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "articles": [],
                "error": "Failed to fetch news",
                "status": "error",
                "newsapi_message": e.to_string(),
            }))
        }
    }
}

fn wants_json(req: &HttpRequest) -> bool {
    let header_has = |name: header::HeaderName, needle: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(needle))
    };
    header_has(header::ACCEPT, "application/json")
        || header_has(header::HeaderName::from_static("x-requested-with"), "XMLHttpRequest")
}

// Contact form submission
pub async fn contact_submit(
    req: HttpRequest,
    data: web::Data<AppState>,
    form: web::Form<ContactForm>,
) -> impl Responder {
    let outcome = data.contact.submit(form.into_inner()).await;
    contact_outcome(&req, Some(data.get_ref()), outcome)
}

fn contact_outcome(
    req: &HttpRequest,
    data: Option<&AppState>,
    outcome: Result<(), ContactError>,
) -> HttpResponse {
    let data = match data {
        Some(data) if !wants_json(req) => data,
        _ => {
            return HttpResponse::Ok().json(ContactResponse {
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
            })
        }
    };

    let mut context = Context::new();
    context.insert("page", "contact");
    context.insert("success", &outcome.is_ok());
    match &outcome {
        Err(e) => {
            context.insert("error", &e.to_string());
            context.insert("reason", e.reason());
        }
        Ok(()) => context.insert("notice", "Thank you! Your message has been sent successfully."),
    }
    render(data, "contact.html", &context)
}

// Unreadable contact bodies (oversized, wrong content type) answer like invalid input
pub fn invalid_form(err: UrlencodedError, req: &HttpRequest) -> actix_web::Error {
    warn!("Unreadable contact form: {}", err);
    let data = req.app_data::<web::Data<AppState>>().map(|data| data.get_ref());
    let response = contact_outcome(req, data, Err(ContactError::InvalidInput));
    InternalError::from_response(err, response).into()
}

// Keeps body parse failures in the `{error}` shape
pub fn invalid_json(err: impl std::fmt::Display) -> ChatError {
    error!("Invalid JSON: {}", err);
    ChatError::Validation("Invalid JSON format".to_string())
}
