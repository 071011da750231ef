use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use rsvpserver::config::Config;
use rsvpserver::legacy::{HttpLegacyConnector, LegacyConnector, LocalOnlyConnector};
use rsvpserver::mailer::{LogMailer, Mailer, RelayMailer};
use rsvpserver::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsvpserver=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let db = rsvpserver::db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let legacy: Arc<dyn LegacyConnector> = match config.legacy {
        Some(ref legacy) => {
            let mut connector = HttpLegacyConnector::new(legacy.url.clone());
            if let Some(ref token) = legacy.token {
                connector = connector.with_auth_token(token.clone());
            }
            Arc::new(connector)
        }
        None => Arc::new(LocalOnlyConnector),
    };

    let mailer: Arc<dyn Mailer> = match config.mail_relay {
        Some(ref relay) => {
            let mut mailer = RelayMailer::new(relay.url.clone());
            if let Some(ref token) = relay.token {
                mailer = mailer.with_auth_token(token.clone());
            }
            Arc::new(mailer)
        }
        None => Arc::new(LogMailer),
    };

    let state = AppState {
        db,
        legacy,
        mailer,
        public_url: config.public_url.clone(),
        mail_from: config.mail_from.clone(),
        expiry: config.expiry,
        trust_proxy_headers: config.trust_proxy_headers,
        rate_limits: Arc::new(DashMap::new()),
    };

    let app = rsvpserver::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let legacy = match config.legacy {
        Some(ref legacy) => legacy.url.as_str(),
        None => "disabled (local codes only)",
    };
    let mail = match config.mail_relay {
        Some(ref relay) => relay.url.as_str(),
        None => "log only",
    };

    eprintln!();
    eprintln!("  \x1b[1;36mrsvp\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m     {}", config.database_url);
    eprintln!("  \x1b[2mpublic url\x1b[0m   {}", config.public_url);
    eprintln!("  \x1b[2mlegacy\x1b[0m       {legacy}");
    eprintln!("  \x1b[2mmail\x1b[0m         {mail}");
    eprintln!(
        "  \x1b[2mclient ip\x1b[0m    {}",
        if config.trust_proxy_headers {
            "X-Forwarded-For / X-Real-IP"
        } else {
            "peer address"
        }
    );
    eprintln!(
        "  \x1b[2mexpiry\x1b[0m       {} days before start, at least {} days",
        config.expiry.days_before_event, config.expiry.min_window_days
    );
    eprintln!();
}
