// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        DivisionRepository, GoalRepository, MemoryStore, PgDivisionRepository, PgGoalRepository,
        PgTaskRepository, PgUserRepository, TaskRepository, UserRepository,
    },
    services::{
        auth::AuthService, division_service::DivisionService, export_service::ExportService,
        goal_service::GoalService, report_service::ReportService, task_service::TaskService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub pdf_font_dir: String,
    pub pdf_font_family: String,
}

impl Settings {
    /// Valores padrão para tudo que não é segredo.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            bind_addr: "0.0.0.0:3000".to_string(),
            database_max_connections: 5,
            jwt_expiration_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            pdf_font_dir: "./fonts".to_string(),
            pdf_font_family: "LiberationSans".to_string(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let mut settings = Self::new(database_url, jwt_secret);

        if let Ok(addr) = env::var("BIND_ADDR") {
            settings.bind_addr = addr;
        }
        if let Some(value) = parse_var("DATABASE_MAX_CONNECTIONS")? {
            settings.database_max_connections = value;
        }
        if let Some(value) = parse_var("JWT_EXPIRATION_HOURS")? {
            settings.jwt_expiration_hours = value;
        }
        if let Some(value) = parse_var("BCRYPT_COST")? {
            settings.bcrypt_cost = value;
        }
        if let Ok(dir) = env::var("PDF_FONT_DIR") {
            settings.pdf_font_dir = dir;
        }
        if let Ok(family) = env::var("PDF_FONT_FAMILY") {
            settings.pdf_font_family = family;
        }

        Ok(settings)
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{name} inválida: {raw}")),
        Err(_) => Ok(None),
    }
}

pub async fn connect_pool(settings: &Settings) -> anyhow::Result<PgPool> {
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&settings.database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(db_pool)
}

/// Os quatro repositórios, já como trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub divisions: Arc<dyn DivisionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            divisions: Arc::new(PgDivisionRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            goals: Arc::new(PgGoalRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool)),
        }
    }

    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            divisions: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            goals: Arc::new(store.clone()),
            tasks: Arc::new(store),
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth_service: AuthService,
    pub division_service: DivisionService,
    pub user_service: UserService,
    pub goal_service: GoalService,
    pub task_service: TaskService,
    pub report_service: ReportService,
    pub export_service: ExportService,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(settings: Settings, repos: Repositories) -> Self {
        let auth_service = AuthService::new(
            repos.users.clone(),
            repos.divisions.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_expiration_hours,
            settings.bcrypt_cost,
        );
        let division_service = DivisionService::new(repos.divisions.clone());
        let user_service = UserService::new(repos.users.clone(), repos.divisions.clone(), settings.bcrypt_cost);
        let goal_service = GoalService::new(repos.goals.clone(), repos.tasks.clone(), repos.users.clone());
        let task_service = TaskService::new(repos.tasks.clone(), repos.goals.clone(), repos.users.clone());
        let report_service = ReportService::new(repos.goals.clone(), repos.tasks.clone(), repos.users.clone());
        let export_service = ExportService::new(
            repos.tasks,
            settings.pdf_font_dir.clone(),
            settings.pdf_font_family.clone(),
        );

        Self {
            settings: Arc::new(settings),
            auth_service,
            division_service,
            user_service,
            goal_service,
            task_service,
            report_service,
            export_service,
        }
    }
}
