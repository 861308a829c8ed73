use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::EmailSender;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    check_in, donations, email_batches, events, health, mailing_list, registrations, surveys,
};
use crate::services::{
    BatchEmailer, DonationWebhookProcessor, EmailService, EmailTemplates, Notifier, PaymentError,
    PaymentsClient,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to build email client: {0}")]
    Email(#[from] reqwest::Error),

    #[error("Failed to build payments client: {0}")]
    Payments(#[from] PaymentError),
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub notifier: Notifier,
    pub payments: PaymentsClient,
    pub donations: DonationWebhookProcessor,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// State backed by the configured email provider.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, StartupError> {
        let sender = EmailService::new(config.email.clone())?;
        Self::with_email_sender(config, pool, Arc::new(sender))
    }

    pub fn with_email_sender(
        config: Config,
        pool: PgPool,
        sender: Arc<dyn EmailSender>,
    ) -> Result<Self, StartupError> {
        let notifier = Notifier::new(
            pool.clone(),
            sender,
            EmailTemplates::from_config(&config.email),
        );
        let payments = PaymentsClient::new(config.payments.clone())?;
        let donations = DonationWebhookProcessor::new(pool.clone(), &config.payments.currency);
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            notifier,
            payments,
            donations,
            rate_limiter,
        })
    }

    pub fn batch_emailer(&self) -> BatchEmailer {
        BatchEmailer::new(self.pool.clone(), self.notifier.clone())
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Development: any origin.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    // Public form submissions, limited per client IP.
    let limited_routes = Router::new()
        .route("/api/registrations", post(registrations::create_registration))
        .route(
            "/api/registrations/cancel",
            post(registrations::cancel_registration),
        )
        .route(
            "/api/registrations/confirm-attendance",
            post(registrations::confirm_attendance),
        )
        .route("/api/subscribe", post(mailing_list::subscribe))
        .route("/api/unsubscribe", post(mailing_list::unsubscribe))
        .route(
            "/api/donations/create-checkout",
            post(donations::create_checkout),
        )
        .route("/api/surveys/respond", post(surveys::submit_response))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/api/events", get(events::list_events))
        .route("/api/events/:slug", get(events::get_event))
        .route("/api/registrations/cancel", get(registrations::get_for_cancel))
        .route(
            "/api/registrations/confirm-attendance",
            get(registrations::get_for_confirm),
        )
        .route("/api/surveys/:slug", get(surveys::get_survey))
        // Signed by the payment processor; not rate limited.
        .route("/api/donations/webhook", post(donations::webhook))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let admin_routes = Router::new()
        .route(
            "/api/registrations/export",
            get(registrations::export_registrations),
        )
        .route("/api/subscribers", get(mailing_list::list_subscribers))
        .route("/api/subscribers/add", post(mailing_list::add_subscriber))
        .route(
            "/api/subscribers/delete",
            post(mailing_list::delete_subscriber),
        )
        .route(
            "/api/email/send-reminders",
            get(email_batches::send_reminders).post(email_batches::send_reminders),
        )
        .route(
            "/api/email/send-attendance-confirmation",
            get(email_batches::send_attendance_confirmations)
                .post(email_batches::send_attendance_confirmations),
        )
        .route("/api/email/send-photos", post(email_batches::send_photos))
        .route("/api/admin/check-in", post(check_in::check_in))
        .route("/api/admin/check-in/bulk", post(check_in::bulk_check_in))
        .route(
            "/api/admin/registrations/:id/attended",
            post(check_in::set_attended),
        )
        .route(
            "/api/admin/events",
            get(events::admin_list_events).post(events::create_event),
        )
        .route("/api/admin/events/:id", put(events::update_event))
        .route(
            "/api/admin/events/:id/status",
            post(events::set_event_status),
        )
        .route(
            "/api/admin/events/:id/registrations",
            get(events::event_registrations),
        )
        .route("/api/admin/surveys", post(surveys::create_survey))
        .route(
            "/api/admin/surveys/:id/responses",
            get(surveys::list_responses),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Outermost layer runs first.
    Router::new()
        .merge(public_routes)
        .merge(limited_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
