use crate::Cli;
use anyhow::{Context, Result};
use insight_application::{
    CodeDissectionService, FileAnalysisService, Orchestrator, PromptLibrary, TextToJsonService,
};
use insight_core::config::AppConfig;
use insight_core::secret::Credential;
use insight_infrastructure::{
    FileTableParser, PdfExporter, SecretServiceImpl, load_config, resolve_credential,
};
use insight_interaction::{PredictionClient, ReplicateBackend};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a command needs to talk to the model.
pub struct AppContext {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator<ReplicateBackend>>,
    pub prompts: Arc<PromptLibrary>,
}

impl AppContext {
    /// Context whose predictions are canceled by Ctrl-C.
    pub async fn build(cli: &Cli) -> Result<Self> {
        Self::build_with_cancellation(cli, cancel_on_ctrl_c()).await
    }

    pub async fn build_with_cancellation(cli: &Cli, cancel: CancellationToken) -> Result<Self> {
        let config = load_config(cli.config.as_deref())?;
        let credential = load_credential(cli).await;
        if credential.is_missing() {
            eprintln!(
                "Warning: API token could not be loaded. Pass --token or set REPLICATE_API_TOKEN; generation will fail."
            );
        }

        let backend = ReplicateBackend::from_config(&config, &credential)?;
        let client = PredictionClient::new(backend, config.model_id.clone());
        let orchestrator = Orchestrator::new(client, config.poll_policy())
            .with_cancellation(cancel);
        let prompts = PromptLibrary::new().context("Failed to compile prompt templates")?;

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
            prompts: Arc::new(prompts),
        })
    }

    pub fn file_analysis(&self) -> FileAnalysisService<ReplicateBackend> {
        FileAnalysisService::new(
            self.orchestrator.clone(),
            self.prompts.clone(),
            Arc::new(FileTableParser::new()),
            Arc::new(PdfExporter::new()),
            self.config.sample_dir.clone(),
        )
    }

    pub fn code_dissection(&self) -> CodeDissectionService<ReplicateBackend> {
        CodeDissectionService::new(self.orchestrator.clone(), self.prompts.clone())
    }

    pub fn text_to_json(&self) -> TextToJsonService<ReplicateBackend> {
        TextToJsonService::new(
            self.orchestrator.clone(),
            self.prompts.clone(),
            self.config.extraction_poll_policy(),
        )
    }
}

async fn load_credential(cli: &Cli) -> Credential {
    let service = match &cli.secret_file {
        Some(path) => SecretServiceImpl::with_path(path.clone()),
        None => match SecretServiceImpl::new_default() {
            Ok(service) => service,
            Err(err) => {
                tracing::debug!(error = %err, "No default secret location");
                return Credential::resolve(
                    cli.token.as_deref(),
                    None,
                    std::env::var(insight_core::secret::TOKEN_ENV_VAR).ok().as_deref(),
                );
            }
        },
    };
    resolve_credential(&service, cli.token.as_deref()).await
}

/// Token fired by Ctrl-C; in-flight predictions are canceled remotely.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, canceling pending predictions");
            trigger.cancel();
        }
    });
    cancel
}
