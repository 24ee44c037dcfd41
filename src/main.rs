use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deck_scheduler::{config, db, handlers};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deck_scheduler=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let app_config = config::load_config();
  let db_path = config::load_database_path(&app_config);
  let pool = db::init_db(&db_path).expect("Failed to initialize database");

  let bind_addr = config::server_bind_addr(&app_config.server);
  let port = app_config.server.port;
  let state = handlers::AppState::new(db::SqliteStore::new(pool), app_config);
  let app = handlers::router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", port);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
