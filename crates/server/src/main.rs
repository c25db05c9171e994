use std::sync::Arc;

use clap::Parser;
use tracing::info;

use jimini_audit::AuditChain;
use jimini_crypto::{HashAlgo, RecordSigner};
use jimini_forwarder::{
    AuditSink, DeadLetterQueue, ElasticSink, Forwarder, ForwarderConfig, SplunkHecSink,
    WebhookSink,
};
use jimini_gateway::GatewayBuilder;
use jimini_llm::{ClassifierConfig, HttpClassifier, TextClassifier};
use jimini_rules::{RuleStore, RuleWatcher};
use jimini_server::ServerConfig;
use jimini_server::api::{AppState, router};

/// Jimini policy gateway HTTP server.
#[derive(Parser, Debug)]
#[command(name = "jimini-server", about = "Inline policy enforcement gateway")]
struct Cli {
    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber from RUST_LOG or default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    // Rule store + hot-reload watcher.
    let rules = Arc::new(RuleStore::load(&config.gateway.rules_path)?);
    let _watcher_handle = RuleWatcher::new(Arc::clone(&rules)).spawn();

    // Audit chain.
    let hash_algo = HashAlgo::from_label(&config.gateway.hash_algo);
    let signer = RecordSigner::from_config(
        &config.gateway.sig_algo,
        &config.gateway.signing_key_path,
    );
    let chain = Arc::new(AuditChain::open(
        &config.gateway.audit_log_path,
        hash_algo,
        signer,
    )?);

    // Forwarder: sinks are optional, breaker + DLQ protect each one.
    let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
    if let Some(url) = &config.webhook_url {
        sinks.push(Arc::new(WebhookSink::new("webhook", url.clone())));
    }
    if let Some(splunk) = &config.splunk {
        sinks.push(Arc::new(SplunkHecSink::new(
            splunk.hec_url.clone(),
            splunk.hec_token.clone(),
        )));
    }
    if let Some(url) = &config.elastic_url {
        sinks.push(Arc::new(ElasticSink::new(url.clone())));
    }
    let sink_count = sinks.len();
    let dlq = Arc::new(DeadLetterQueue::new(&config.gateway.dlq_path));
    let forwarder = Forwarder::spawn(sinks, dlq, ForwarderConfig::default());

    // Optional external classifier.
    let classifier: Option<Arc<dyn TextClassifier>> = match &config.llm {
        Some(llm) => Some(Arc::new(HttpClassifier::new(ClassifierConfig::new(
            llm.url.clone(),
            llm.model.clone(),
            llm.api_key.clone(),
        ))?)),
        None => None,
    };

    let mut builder = GatewayBuilder::new()
        .shadow_mode(config.gateway.shadow_mode)
        .hash_algo(hash_algo)
        .rules(rules)
        .chain(chain)
        .forwarder(forwarder);
    if let Some(classifier) = classifier {
        builder = builder.classifier(classifier);
    }
    let gateway = Arc::new(builder.build()?);

    info!(
        rules = gateway.loaded_rules(),
        shadow = gateway.shadow_mode(),
        sinks = sink_count,
        hash_algo = hash_algo.label(),
        "jimini gateway assembled"
    );

    let state = AppState {
        gateway,
        api_key: Arc::new(config.api_key.clone()),
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
