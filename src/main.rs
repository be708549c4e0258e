use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use pixelforge_backend::{
    config::Config,
    external::GeminiService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    storage::{JsonStore, StateStore},
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 打开存储并加载全部状态
    let kv = JsonStore::open(&config.storage.data_dir).expect("Failed to open data directory");
    let store = StateStore::open(kv);

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 创建外部服务
    let gemini_service = GeminiService::new(config.gemini.clone());

    // 创建服务
    let auth_service = AuthService::new(store.clone(), jwt_service.clone(), config.admin.clone());
    let user_service = UserService::new(store.clone());
    let payment_service = PaymentService::new(store.clone());
    let settings_service = SettingsService::new(store.clone());
    let generation_service = GenerationService::new(user_service.clone(), gemini_service);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(settings_service.clone()))
            .app_data(web::Data::new(generation_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::settings_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::generation_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await;

    // 关停前把内存状态落盘
    store.flush().await;
    log::info!("State store flushed, shutting down");

    result
}
