use crate::app_state::{AppState, SERVICE_MESSAGE};
use crate::config::ServiceConfig;
use crate::error::ValidationError;
use crate::io_struct::{HealthResponse, MessageResponse, PredictRequest, PredictResponse};
use actix_web::{HttpRequest, HttpResponse, HttpServer, error, get, post, web};

#[get("/")]
pub async fn root(_req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: SERVICE_MESSAGE.to_string(),
    })
}

// Liveness only; the inference engine is not consulted.
#[get("/health")]
pub async fn health(_req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
    })
}

#[post("/predict")]
pub async fn predict(
    _req: HttpRequest,
    req: web::Json<PredictRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let req = req.into_inner();
    req.validate()?;
    let prediction = app_state.pipeline.predict_url(&req.url).await?;
    Ok(HttpResponse::Ok().json(PredictResponse::from(prediction)))
}

/// Body parse failures become 422 with the same error body as other validation errors.
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ValidationError(err.to_string()).into()
}

/// Register routes and extractor config. Shared by `startup` and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(root)
        .service(health)
        .service(predict);
}

pub async fn startup(config: ServiceConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!("Starting server at {}:{}", config.host, config.port);

    let mut server = HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    server.bind((config.host, config.port))?.run().await?;

    std::io::Result::Ok(())
}
