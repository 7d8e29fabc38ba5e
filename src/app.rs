use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AdminCredential, CredentialVerifier};
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::DeliveryService;
use crate::store::{JsonFileStore, RecordStore, StorageError};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DeliveryService>,
    pub verifier: Arc<CredentialVerifier>,
}

impl AppState {
    pub fn new(service: DeliveryService, verifier: CredentialVerifier) -> Self {
        Self {
            service: Arc::new(service),
            verifier: Arc::new(verifier),
        }
    }

    /// Wire the JSON file store and admin credential described by `config`
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::new(&config.storage.data_file));
        let service = DeliveryService::open(store).await?;
        Ok(Self::new(service, verifier_from_config(config)))
    }
}

pub fn verifier_from_config(config: &AppConfig) -> CredentialVerifier {
    let security = &config.security;
    CredentialVerifier::new(
        AdminCredential {
            username: security.admin_username.clone(),
            password_hash: security.admin_password_hash.clone(),
        },
        security.jwt_secret.clone(),
        Duration::minutes(security.token_expiry_minutes),
    )
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/login", post(public::login))
        // Protected
        .merge(protected_routes(state.clone()))
        .fallback(public::not_found)
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{deliveries, patients};

    let patients_collection = get(patients::list_patients).post(patients::create_patient);
    let deliveries_collection = get(deliveries::list_deliveries).post(deliveries::create_delivery);

    Router::new()
        .route("/patients", patients_collection.clone())
        .route("/patients/", patients_collection)
        .route("/patients/:id", get(patients::get_patient))
        .route("/deliveries", deliveries_collection.clone())
        .route("/deliveries/", deliveries_collection)
        .route(
            "/deliveries/:id",
            get(deliveries::get_delivery)
                .patch(deliveries::update_delivery)
                .put(deliveries::update_delivery),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    base.allow_origin(parsed)
}
