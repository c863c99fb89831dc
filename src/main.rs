use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use odysea_api::config::AppConfig;
use odysea_api::db;
use odysea_api::middleware::auth::AuthMiddleware;
use odysea_api::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let config = AppConfig::from_env();
    let host = config.host.clone();
    let port = config.port;
    log::info!("Attempting to bind to {}:{}", host, port);

    let client = db::mongo::create_mongo_client(&config.mongodb_uri).await;
    log::info!("MongoDB connection established");

    log::info!("Starting HTTP server...");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.app_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(config.clone()))
            .route("/", web::get().to(routes::health::root))
            .route("/health", web::get().to(routes::health::health))
            .service(
                web::scope("/api")
                    // Public routes
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(routes::auth::register))
                            .route("/login", web::post().to(routes::auth::login))
                            .service(
                                web::scope("")
                                    .wrap(AuthMiddleware::new(config.jwt_secret.clone()))
                                    .route("/me", web::get().to(routes::auth::me)),
                            ),
                    )
                    // Protected routes
                    .service(
                        web::scope("/trips")
                            .wrap(AuthMiddleware::new(config.jwt_secret.clone()))
                            .route("", web::get().to(routes::trips::list_trips))
                            .route("", web::post().to(routes::trips::create_trip))
                            .route("/upcoming", web::get().to(routes::trips::upcoming_trips))
                            .route("/stats/overview", web::get().to(routes::trips::trip_stats))
                            .route("/{id}", web::get().to(routes::trips::get_trip))
                            .route("/{id}", web::put().to(routes::trips::update_trip))
                            .route("/{id}", web::delete().to(routes::trips::delete_trip)),
                    )
                    .service(
                        web::scope("/activities")
                            .wrap(AuthMiddleware::new(config.jwt_secret.clone()))
                            .route(
                                "/trip/{trip_id}/day/{day_id}",
                                web::get().to(routes::activities::list_day_activities),
                            )
                            .route(
                                "/trip/{trip_id}/day/{day_id}",
                                web::post().to(routes::activities::create_activity),
                            )
                            .route(
                                "/trip/{trip_id}/day/{day_id}/bulk",
                                web::post().to(routes::activities::bulk_create_activities),
                            )
                            .route(
                                "/trip/{trip_id}/day/{day_id}/reorder",
                                web::put().to(routes::activities::reorder_activities),
                            )
                            .route("/{id}", web::get().to(routes::activities::get_activity))
                            .route("/{id}", web::put().to(routes::activities::update_activity))
                            .route(
                                "/{id}",
                                web::delete().to(routes::activities::delete_activity),
                            ),
                    )
                    .service(
                        web::scope("/destinations")
                            .wrap(AuthMiddleware::new(config.jwt_secret.clone()))
                            .route("", web::get().to(routes::destinations::list_destinations))
                            .route("", web::post().to(routes::destinations::create_destination))
                            .route(
                                "/stats/overview",
                                web::get().to(routes::destinations::destination_stats),
                            )
                            .route("/{id}", web::get().to(routes::destinations::get_destination))
                            .route(
                                "/{id}",
                                web::put().to(routes::destinations::update_destination),
                            )
                            .route(
                                "/{id}",
                                web::delete().to(routes::destinations::delete_destination),
                            ),
                    )
                    .service(
                        web::scope("/ai")
                            .wrap(AuthMiddleware::new(config.jwt_secret.clone()))
                            .route("/generate", web::post().to(routes::ai::generate_trip)),
                    ),
            )
            .default_service(web::route().to(routes::health::not_found_handler))
    })
    .bind((host, port))?
    .run()
    .await
}
