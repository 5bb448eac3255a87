use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use garbage_classifier::app_state::AppState;
use garbage_classifier::client::{self, DEFAULT_ENDPOINT, QueryOutcome};
use garbage_classifier::config::{DEFAULT_MODEL_PATH, ServiceConfig};
use garbage_classifier::fetch::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_USER_AGENT};
use garbage_classifier::io_struct::PredictResponse;
use garbage_classifier::logging::{init_logging, parse_level};
use garbage_classifier::preprocess::DEFAULT_IMAGE_SIZE;
use garbage_classifier::server;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "garbage-classifier")]
#[command(about = "Garbage classification service - classify an image URL into waste categories")]
#[command(long_about = r#"
Garbage classification service - classify an image URL into waste categories

Examples:
  # Serve the HTTP API on 0.0.0.0:8080
  garbage-classifier serve --model-path models/xception_v4_final.onnx

  # Classify a local image without starting a server
  garbage-classifier classify ./bottle.jpg --labels-path models/labels.json

  # Ask a running service about a remote image
  garbage-classifier query https://upload.wikimedia.org/wikipedia/commons/e/e3/Bouteille.jpg
"#)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP prediction service
    Serve(ServeArgs),
    /// Classify one local file or http(s) URL and print the result
    Classify(ClassifyArgs),
    /// Send an image URL to a running service and print its answer
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Path to the ONNX classification model
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// JSON label file (array, or {"0": "label", ...}); built-in labels when omitted
    #[arg(long)]
    labels_path: Option<PathBuf>,

    /// Square input resolution the model was trained with
    #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
    image_size: u32,

    /// ONNX Runtime intra-op threads
    #[arg(long)]
    intra_threads: Option<usize>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Timeout in seconds for downloading an image
    #[arg(long, default_value_t = 10)]
    fetch_timeout_secs: u64,

    /// Largest image body accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_BYTES)]
    max_image_bytes: usize,

    /// User-Agent header sent to image hosts
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind the server
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Number of HTTP worker threads
    #[arg(long)]
    workers: Option<usize>,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Local image path or http(s) URL
    source: String,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Image URL to classify
    image_url: String,

    /// Prediction endpoint of the running service
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

fn to_service_config(model: ModelArgs, fetch: FetchArgs) -> ServiceConfig {
    ServiceConfig {
        model_path: model.model_path,
        labels_path: model.labels_path,
        image_size: model.image_size,
        intra_threads: model.intra_threads,
        fetch_timeout_secs: fetch.fetch_timeout_secs,
        max_image_bytes: fetch.max_image_bytes,
        user_agent: fetch.user_agent,
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(parse_level(&args.log_level));

    match args.command {
        Command::Serve(serve) => {
            let config = ServiceConfig {
                host: serve.host,
                port: serve.port,
                workers: serve.workers,
                ..to_service_config(serve.model, serve.fetch)
            };
            let app_state = AppState::new(&config).context("failed to initialise service")?;
            actix_web::rt::System::new().block_on(server::startup(config, app_state))?;
        }
        Command::Classify(classify) => {
            let source = classify.source;
            let config = to_service_config(classify.model, classify.fetch);
            let app_state = AppState::new(&config).context("failed to initialise pipeline")?;
            let runtime = tokio::runtime::Runtime::new()?;
            let prediction = runtime.block_on(async {
                let pipeline = &app_state.pipeline;
                match Url::parse(&source) {
                    Ok(url) if matches!(url.scheme(), "http" | "https") => {
                        pipeline.predict_url(&url).await
                    }
                    _ => {
                        let image = pipeline
                            .fetcher()
                            .load_file(&PathBuf::from(&source))
                            .await?;
                        pipeline.classify(image).await
                    }
                }
            })?;
            print!(
                "{}",
                client::format_classification(&PredictResponse::from(prediction))
            );
        }
        Command::Query(query) => {
            let runtime = tokio::runtime::Runtime::new()?;
            let http = reqwest::Client::new();
            let outcome =
                runtime.block_on(client::query(&http, &query.endpoint, &query.image_url))?;
            match outcome {
                QueryOutcome::Prediction(prediction) => {
                    print!("{}", client::format_prediction(&prediction));
                }
                QueryOutcome::Failed { status, body } => {
                    println!("Error! Status Code: {}", status);
                    println!("Full Response Content:");
                    println!("{}", body);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
