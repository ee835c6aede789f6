use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod config;
mod db;
mod entities;
mod error;
mod images;
mod models;
mod shopping_list;

use config::Config;
use db::create_mysql_pool;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );
    let mysql_pool = create_mysql_pool(&config)
        .await
        .expect("Failed to create MySQL pool");

    log::info!("Database connection established");

    let openapi = api::ApiDoc::openapi();

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(mysql_pool.clone()))
            .route(
                "/api/docs",
                web::get().to(|| async {
                    actix_web::HttpResponse::PermanentRedirect()
                        .append_header(("Location", "/api/docs/"))
                        .finish()
                }),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(api::users::signup))
                            .route("/login", web::post().to(api::users::login)),
                    )
                    .service(
                        // Literal segments are registered ahead of `/{id}`
                        // so `me` and `subscriptions` resolve first.
                        web::scope("/users")
                            .route("", web::get().to(api::users::list_users))
                            .route("/me", web::get().to(api::users::me))
                            .route(
                                "/subscriptions",
                                web::get().to(api::users::subscriptions),
                            )
                            .route("/{id}", web::get().to(api::users::get_user))
                            .route("/{id}/subscribe", web::post().to(api::users::subscribe))
                            .route(
                                "/{id}/subscribe",
                                web::delete().to(api::users::unsubscribe),
                            ),
                    )
                    .service(
                        web::scope("/tags")
                            .route("", web::get().to(api::tags::list_tags))
                            .route("/{id}", web::get().to(api::tags::get_tag)),
                    )
                    .service(
                        web::scope("/ingredients")
                            .route("", web::get().to(api::ingredients::list_ingredients))
                            .route("/{id}", web::get().to(api::ingredients::get_ingredient)),
                    )
                    .service(
                        web::scope("/recipes")
                            .route("", web::post().to(api::recipes::create_recipe))
                            .route("", web::get().to(api::recipes::list_recipes))
                            .route(
                                "/download_shopping_cart",
                                web::get().to(api::recipes::download_shopping_cart),
                            )
                            .route("/{id}", web::get().to(api::recipes::get_recipe))
                            .route("/{id}", web::patch().to(api::recipes::update_recipe))
                            .route("/{id}", web::delete().to(api::recipes::delete_recipe))
                            .route(
                                "/{id}/favorite",
                                web::post().to(api::recipes::favorite_recipe),
                            )
                            .route(
                                "/{id}/favorite",
                                web::delete().to(api::recipes::unfavorite_recipe),
                            )
                            .route(
                                "/{id}/shopping_cart",
                                web::post().to(api::recipes::cart_add),
                            )
                            .route(
                                "/{id}/shopping_cart",
                                web::delete().to(api::recipes::cart_remove),
                            ),
                    ),
            )
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
