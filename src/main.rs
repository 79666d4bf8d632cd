use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "openapi")]
use std::fs;

use tracing::{info, warn};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;

use anyhow::anyhow;

use speak_relay::{
    ServerConfig,
    core::speech::{
        AugmentOutcome, BackendFactory, EngineConfig, EngineHandle, SpeechDispatcher,
        VoiceDescriptor, backend_factory,
    },
    routes,
    state::AppState,
};

/// Speak Relay - forwards text to the host text-to-speech engine
#[derive(Parser, Debug)]
#[command(name = "speak-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the voice catalog after augmentation
    Voices,

    /// Generate OpenAPI specification
    #[cfg(feature = "openapi")]
    Openapi {
        /// Output format (yaml or json)
        #[arg(short = 'f', long = "format", default_value = "yaml")]
        format: String,

        /// Output file path (prints to stdout if not specified)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    #[cfg(feature = "openapi")]
    if let Some(Commands::Openapi { format, output }) = &cli.command {
        // Generate the spec in the requested format
        let spec_content = match format.as_str() {
            "yaml" => speak_relay::docs::openapi::spec_yaml()
                .map_err(|e| anyhow!("Failed to generate OpenAPI YAML: {}", e))?,
            "json" => speak_relay::docs::openapi::spec_json()
                .map_err(|e| anyhow!("Failed to generate OpenAPI JSON: {}", e))?,
            _ => anyhow::bail!("Invalid format '{}'. Must be 'yaml' or 'json'", format),
        };

        // Write to file or stdout
        if let Some(output_path) = output {
            fs::write(output_path, &spec_content).map_err(|e| {
                anyhow!("Failed to write to {}: {}", output_path.display(), e)
            })?;
            println!("OpenAPI spec written to {}", output_path.display());
        } else {
            println!("{}", spec_content);
        }

        return Ok(());
    }

    // Load configuration from file or environment
    let config = if let Some(config_path) = &cli.config {
        ServerConfig::from_file(config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    // Without a speech subsystem the relay stays inert: no listener, no output
    let Some(factory) = backend_factory(config.speech_backend, &config.speech.voice) else {
        return Ok(());
    };

    if let Some(config_path) = &cli.config {
        info!("Loaded configuration from {}", config_path.display());
    }

    if let Some(Commands::Voices) = cli.command {
        return print_voices(factory, config.speech).await;
    }

    serve(factory, config).await
}

async fn serve(factory: BackendFactory, config: ServerConfig) -> anyhow::Result<()> {
    // Configure the engine, augment voices, select the voice and speak the
    // greeting before anything binds
    let (speech, summary) = SpeechDispatcher::start(factory, config.speech.clone())
        .await
        .map_err(|e| anyhow!("Speech engine startup failed: {}", e))?;

    if let AugmentOutcome::Unsupported(reason) = &summary.augment {
        warn!("Running with default voices only: {}", reason);
    }
    info!(
        "Using voice {} ({} voices available)",
        summary.selected_voice, summary.voice_count
    );

    let address = config.address();
    let tls_config = config.tls;
    println!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(speech.clone());

    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    let app: Router = routes::api::create_api_router()
        .with_state(app_state)
        .layer(security_headers);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    // Start server with or without TLS
    if let Some(tls) = tls_config {
        // Initialize crypto provider for TLS connections
        rustls::crypto::ring::default_provider()
            .install_default()
            .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

        // Load TLS configuration from certificate and key files
        let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to load TLS certificates from {} and {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                )
            })?;

        println!("Server listening on https://{} (TLS enabled)", socket_addr);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(5)));
        });

        axum_server::bind_rustls(socket_addr, rustls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .map_err(|e| anyhow!("TLS server error: {}", e))?;
    } else {
        println!("Server listening on http://{}", socket_addr);

        let listener = TcpListener::bind(&socket_addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    // Let already queued utterances finish
    speech.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Print every voice the engine knows after augmentation
async fn print_voices(factory: BackendFactory, speech: EngineConfig) -> anyhow::Result<()> {
    let voices = tokio::task::spawn_blocking(move || {
        let mut engine = EngineHandle::new(factory()?)?;
        let outcome = engine.augment_with_policy(&speech.voice_category, speech.augment)?;
        if let AugmentOutcome::Unsupported(reason) = outcome {
            warn!("Alternate voices unavailable: {}", reason);
        }
        Ok::<_, speak_relay::SpeechError>(engine.voices().iter().cloned().collect::<Vec<_>>())
    })
    .await?
    .map_err(|e| anyhow!("Failed to list voices: {}", e))?;

    println!("Installed voices -");
    for voice in &voices {
        print_voice(voice);
    }
    Ok(())
}

fn print_voice(voice: &VoiceDescriptor) {
    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    println!(" Name:          {}", voice.name);
    println!(" Culture:       {}", or_unknown(voice.culture.clone()));
    println!(" Age:           {}", or_unknown(voice.age.map(|a| format!("{a:?}"))));
    println!(" Gender:        {}", or_unknown(voice.gender.map(|g| format!("{g:?}"))));
    println!(" Description:   {}", or_unknown(voice.description.clone()));
    println!(" ID:            {}", voice.token_id);
    if voice.audio_formats.is_empty() {
        println!(" No supported audio formats found");
    } else {
        println!(" Audio formats: {}", voice.audio_formats.join(", "));
    }
    if !voice.additional_info.is_empty() {
        println!(" Additional Info -");
        for (key, value) in &voice.additional_info {
            println!("  {}: {}", key, value);
        }
    }
    println!();
}
