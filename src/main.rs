use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_shelf::{config, handlers, paths, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "course_shelf=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = config::load();

  let courses_dir = paths::ensure_courses_dir(&config.data_dir).expect("Failed to create courses directory");
  tracing::info!("Courses stored in {}", courses_dir.display());

  let state = AppState::new(&config);
  let host = state.host.clone();
  let app = handlers::router(state);

  let bind_addr = config.server_bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server failed to start");

  // Release the course server port before exiting
  host.stop().await;
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("Failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
  tracing::info!("Shutting down");
}
