//! ostatic - a credential-gated static file gateway.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ostatic::{
    auth::{BackendAuthorizer, Claims, QueryTokenVerifier, TokenCodec, TokenIssuer, TokenResponse},
    config::{AuthMode, Cli, Command, IssueConfig, IssueOutputFormat, ServeConfig},
    files::StaticFiles,
    server::{create_router, RouterConfig, SharedVerifier},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Issue(config) => run_issue(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let mount = config.mount();

    info!("ostatic v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Directory: {}", config.directory.display());
    info!("  Mount path: {}", mount);

    match config.auth_mode {
        AuthMode::Token => {
            info!("  Auth: signed token ({})", config.token.token_algorithm);
            if config.token_endpoint_enabled() {
                info!(
                    "  Token endpoint: enabled (lifetime {} min, backend {})",
                    config.token.token_expire, config.backend_route
                );
            } else {
                info!("  Token endpoint: disabled");
            }
        }
        AuthMode::Backend => {
            info!(
                "  Auth: delegated to {} (expects {}, header {}, timeout {}s)",
                config.backend_route,
                config.backend_code,
                config.auth_header,
                config.backend_timeout
            );
        }
    }

    if config.auth_mode == AuthMode::Token && config.token.uses_default_secret() {
        warn!("  Token secret: using the built-in example secret");
        warn!("        Set --token-secret or OSTATIC_TOKEN_SECRET_KEY for any real deployment");
    }

    match config.cors_allow_origin {
        Some(ref origin) => info!("  CORS: {}", origin),
        None => info!("  CORS: disabled"),
    }

    // The served directory must exist before we accept requests
    match tokio::fs::metadata(&config.directory).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            error!("'{}' is not a directory", config.directory.display());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("Cannot read directory '{}': {}", config.directory.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let router = match build_router(&config) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to initialize gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    if config.token_endpoint_enabled() {
        info!("    curl -H 'Authorization: <credential>' http://{}/token", addr);
        info!("    curl 'http://{}{}/<file>?token=<token>'", addr, mount);
    } else if config.auth_mode == AuthMode::Backend {
        info!(
            "    curl -H '{}: <credential>' http://{}{}/<file>",
            config.auth_header, addr, mount
        );
    }
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "ostatic=debug,tower_http=debug"
    } else {
        "ostatic=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the router from the application ServeConfig.
fn build_router(config: &ServeConfig) -> Result<axum::Router, String> {
    let files = StaticFiles::new(&config.directory).with_cache_max_age(config.cache_max_age);

    let mut router_config = RouterConfig::new(config.mount()).with_tracing(!config.no_tracing);
    if let Some(ref origin) = config.cors_allow_origin {
        router_config = router_config.with_cors_allow_origin(origin.clone());
    }

    let backend = BackendAuthorizer::new(config.backend_config().map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;

    match config.auth_mode {
        AuthMode::Token => {
            let codec = TokenCodec::new(&config.token.token_secret, config.token.algorithm()?)
                .map_err(|e| e.to_string())?;

            let issuer = config.token_endpoint_enabled().then(|| {
                TokenIssuer::new(backend, codec.clone())
                    .with_lifetime(config.token.lifetime())
                    .with_subject(&config.token.token_subject)
            });

            let verifier: SharedVerifier = Arc::new(QueryTokenVerifier::new(codec));
            Ok(create_router(files, verifier, issuer, router_config))
        }
        AuthMode::Backend => {
            let verifier: SharedVerifier = Arc::new(backend);
            Ok(create_router(files, verifier, None, router_config))
        }
    }
}

// =============================================================================
// Issue Command
// =============================================================================

fn run_issue(config: IssueConfig) -> ExitCode {
    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let codec = match config
        .token
        .algorithm()
        .and_then(|alg| TokenCodec::new(&config.token.token_secret, alg).map_err(|e| e.to_string()))
    {
        Ok(codec) => codec,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let claims = Claims::expiring_in(&config.token.token_subject, config.token.lifetime());
    let token = match codec.encode(&claims) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Output based on format
    match config.format {
        IssueOutputFormat::Token => {
            println!("{}", token);
        }
        IssueOutputFormat::Json => match serde_json::to_string_pretty(&TokenResponse::bearer(token)) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    if config.token.uses_default_secret() {
        eprintln!();
        eprintln!("Warning: signed with the built-in example secret");
    }

    ExitCode::SUCCESS
}
