//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use goalboard::{
    build_router,
    config::{connect_pool, AppState, Repositories, Settings},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG, padrão "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let db_pool = connect_pool(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = settings.bind_addr.clone();
    let app_state = AppState::new(settings, Repositories::postgres(db_pool));
    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {bind_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Desligando o servidor...");
}
