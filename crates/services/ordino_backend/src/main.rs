use axum::{routing::get, Router};
use ordino_common::logging;
use ordino_common::services::{BoxedError, TokenRegistry};
use ordino_config::load_config;
use ordino_db::{DbClient, DeviceRegistrationRepository, SqlDeviceRegistrationRepository};
use ordino_fcm::{Dispatcher, FcmClient, LogOnlySink, NotifyState, ServiceAccountIssuer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    logging::init();

    let config = Arc::new(load_config().expect("Failed to load config"));

    let mut api_router = Router::new().route("/", get(|| async { "Welcome to the Ordino API!" }));

    if config.use_fcm {
        // Durable token registry. Missing credentials are startup failures;
        // a backend that cannot persist registrations has nothing to
        // dispatch to.
        let db_client = DbClient::new(&config)
            .await
            .expect("Failed to connect to the device database");
        let repository = SqlDeviceRegistrationRepository::new(db_client);
        repository
            .init_schema()
            .await
            .expect("Failed to initialize the devices schema");
        let registry: Arc<dyn TokenRegistry<Error = BoxedError>> = Arc::new(repository);

        let fcm_config = config
            .fcm
            .as_ref()
            .expect("Missing FCM configuration (project id / client email)");
        let issuer = Arc::new(
            ServiceAccountIssuer::from_env(fcm_config)
                .expect("Failed to load the FCM service-account credentials"),
        );
        let sender = Arc::new(FcmClient::new(fcm_config).expect("Failed to create the FCM client"));

        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            issuer,
            sender,
            Arc::new(LogOnlySink),
        ));

        api_router = api_router.merge(ordino_fcm::routes(NotifyState {
            dispatcher,
            registry,
        }));
    } else {
        warn!("FCM is disabled (use_fcm = false), notification endpoints not mounted");
    }

    #[allow(unused_mut)]
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use ordino_fcm::openapi::NotifyApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Ordino API",
                version = "0.1.0",
                description = "Order notification service API Docs"
            ),
            components(),
            tags( (name = "Ordino", description = "Core service endpoints")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(NotifyApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc.clone());
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
