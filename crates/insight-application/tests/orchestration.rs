use insight_application::{
    AnalysisSession, CodeDissectionService, CodeInput, CodeTask, ExtractionOutcome,
    FailurePolicy, FileAnalysisService, GENERATION_FAILED_MESSAGE, Orchestrator, PromptLibrary,
    SectionOutcome, TextToJsonService,
};
use insight_core::artifact::{FileFormat, InputArtifact};
use insight_core::catalog::Dialect;
use insight_core::error::Result;
use insight_core::prediction::{
    PollPolicy, PredictionBackend, PredictionHandle, PredictionRequest, PredictionSnapshot,
    PredictionStatus,
};
use insight_core::section::SectionId;
use insight_infrastructure::{FileTableParser, PdfExporter};
use insight_interaction::PredictionClient;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Answers every submission immediately. Queued replies are used first, then
// a default success echoing the call number.
#[derive(Default)]
struct CountingBackend {
    replies: Mutex<VecDeque<(PredictionStatus, Option<Vec<String>>)>>,
    prompts: Mutex<Vec<String>>,
    creates: AtomicUsize,
}

impl CountingBackend {
    fn with_replies(replies: Vec<(PredictionStatus, Option<Vec<String>>)>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl PredictionBackend for CountingBackend {
    async fn create_prediction(
        &self,
        _model_id: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionSnapshot> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let (status, output) = self.replies.lock().unwrap().pop_front().unwrap_or((
            PredictionStatus::Succeeded,
            Some(vec![format!("answer {n}")]),
        ));
        Ok(PredictionSnapshot {
            handle: PredictionHandle { id: format!("p-{n}") },
            status,
            output,
            error: None,
        })
    }

    async fn reload(&self, handle: &PredictionHandle) -> Result<PredictionSnapshot> {
        Ok(PredictionSnapshot {
            handle: handle.clone(),
            status: PredictionStatus::Pending,
            output: None,
            error: None,
        })
    }

    async fn cancel(&self, _handle: &PredictionHandle) -> Result<()> {
        Ok(())
    }
}

fn policy() -> PollPolicy {
    PollPolicy::new(1, Duration::ZERO)
}

fn orchestrator(backend: &Arc<CountingBackend>) -> Arc<Orchestrator<CountingBackend>> {
    let client = PredictionClient::from_shared(backend.clone(), "owner/model");
    Arc::new(Orchestrator::new(client, policy()))
}

fn csv(name: &str) -> InputArtifact {
    InputArtifact::uploaded(name, FileFormat::Csv, b"country,code\nSpain,ES\n".to_vec(), true)
}

fn explanation_request(artifact: &InputArtifact) -> Result<PredictionRequest> {
    Ok(PredictionRequest::new(
        format!("explain {}", artifact.identity()),
        0.2,
    ))
}

#[tokio::test]
async fn second_run_replays_without_network() {
    let backend = Arc::new(CountingBackend::default());
    let orchestrator = orchestrator(&backend);
    let mut session = AnalysisSession::new();
    let artifact = csv("a.csv");

    let first = orchestrator
        .run_section(&mut session, SectionId::Explanation, &artifact, explanation_request)
        .await;
    let second = orchestrator
        .run_section(&mut session, SectionId::Explanation, &artifact, explanation_request)
        .await;

    assert_eq!(first, SectionOutcome::Generated("answer 1".into()));
    assert_eq!(second, SectionOutcome::Replayed("answer 1".into()));
    assert_eq!(backend.creates(), 1);
    assert!(session.sections.is_valid_for(SectionId::Explanation, &artifact));
}

#[tokio::test]
async fn output_fragments_are_joined_in_order() {
    let backend = Arc::new(CountingBackend::with_replies(vec![(
        PredictionStatus::Succeeded,
        Some(vec!["b".into(), "a".into(), "c".into()]),
    )]));
    let orchestrator = orchestrator(&backend);
    let mut session = AnalysisSession::new();

    let outcome = orchestrator
        .run_section(&mut session, SectionId::Security, &csv("a.csv"), explanation_request)
        .await;

    assert_eq!(outcome.text(), Some("bac"));
}

#[tokio::test]
async fn renamed_artifact_is_not_valid() {
    let backend = Arc::new(CountingBackend::default());
    let orchestrator = orchestrator(&backend);
    let mut session = AnalysisSession::new();
    let original = csv("a.csv");
    let renamed = csv("b.csv");

    orchestrator
        .run_section(&mut session, SectionId::Explanation, &original, explanation_request)
        .await;

    assert!(!session.sections.is_valid_for(SectionId::Explanation, &renamed));
    let outcome = orchestrator
        .run_section(&mut session, SectionId::Explanation, &renamed, explanation_request)
        .await;
    assert!(matches!(outcome, SectionOutcome::Generated(_)));
    assert_eq!(backend.creates(), 2);
}

#[tokio::test]
async fn failure_then_retry_reaches_the_service_again() {
    let backend = Arc::new(CountingBackend::with_replies(vec![(
        PredictionStatus::Failed,
        None,
    )]));
    let orchestrator = orchestrator(&backend);
    let mut session = AnalysisSession::new();
    let artifact = csv("a.csv");

    let failed = orchestrator
        .run_section(&mut session, SectionId::Explanation, &artifact, explanation_request)
        .await;
    assert_eq!(
        failed,
        SectionOutcome::Failed(GENERATION_FAILED_MESSAGE.to_string())
    );
    assert!(!session.sections.is_valid_for(SectionId::Explanation, &artifact));
    assert!(session.cache.is_empty().await);

    let retried = orchestrator
        .run_section(&mut session, SectionId::Explanation, &artifact, explanation_request)
        .await;
    assert_eq!(retried, SectionOutcome::Generated("answer 2".into()));
    assert_eq!(backend.creates(), 2);
}

#[tokio::test]
async fn exhausted_polling_counts_as_failure() {
    let backend = Arc::new(CountingBackend::with_replies(vec![(
        PredictionStatus::Pending,
        None,
    )]));
    let orchestrator = orchestrator(&backend);
    let mut session = AnalysisSession::with_failure_policy(FailurePolicy::Skip);

    let outcome = orchestrator
        .run_section(&mut session, SectionId::Visualization, &csv("a.csv"), explanation_request)
        .await;

    assert!(!outcome.is_success());
    assert_eq!(session.sections.done_count(), 0);
}

#[tokio::test]
async fn prompt_errors_fail_without_network() {
    let backend = Arc::new(CountingBackend::default());
    let orchestrator = orchestrator(&backend);
    let mut session = AnalysisSession::new();

    let outcome = orchestrator
        .run_section(&mut session, SectionId::Explanation, &csv("a.csv"), |_| {
            Err(insight_core::InsightError::Template("broken".into()))
        })
        .await;

    assert!(!outcome.is_success());
    assert_eq!(backend.creates(), 0);
}

fn file_service(
    orchestrator: Arc<Orchestrator<CountingBackend>>,
    sample_dir: &std::path::Path,
) -> FileAnalysisService<CountingBackend> {
    FileAnalysisService::new(
        orchestrator,
        Arc::new(PromptLibrary::new().unwrap()),
        Arc::new(FileTableParser::new()),
        Arc::new(PdfExporter::new()),
        sample_dir,
    )
}

#[tokio::test]
async fn file_analysis_builds_report_and_document() {
    let backend = Arc::new(CountingBackend::default());
    let temp_dir = tempfile::TempDir::new().unwrap();
    let service = file_service(orchestrator(&backend), temp_dir.path());
    let mut session = AnalysisSession::new();

    let analysis = service.analyze(&mut session, &csv("a.csv")).await.unwrap();

    assert_eq!(analysis.preview.table.row_count(), 1);
    assert!(analysis.report.is_complete());
    assert_eq!(
        analysis.report.combined_markdown().unwrap(),
        "## CSV file data analysis\nanswer 1\n\n## Security issues\nanswer 2\n\n## Data visualization techniques\nanswer 3"
    );

    let document = analysis.document.unwrap();
    assert!(document.file_name.starts_with("data-analysis-"));
    assert!(document.file_name.ends_with(".pdf"));
    assert_eq!(document.mime_type, "application/pdf");
    assert!(document.bytes.starts_with(b"%PDF"));

    // Same file again: everything is replayed.
    let again = service.analyze(&mut session, &csv("a.csv")).await.unwrap();
    assert!(again
        .report
        .entries
        .iter()
        .all(|entry| matches!(entry.outcome, SectionOutcome::Replayed(_))));
    assert_eq!(backend.creates(), 3);
}

#[tokio::test]
async fn headerless_csv_uses_its_own_section() {
    let backend = Arc::new(CountingBackend::default());
    let temp_dir = tempfile::TempDir::new().unwrap();
    let service = file_service(orchestrator(&backend), temp_dir.path());
    let mut session = AnalysisSession::new();
    let artifact =
        InputArtifact::uploaded("raw.csv", FileFormat::Csv, b"Spain,ES\n".to_vec(), false);

    let analysis = service.analyze(&mut session, &artifact).await.unwrap();

    assert_eq!(analysis.report.entries[0].section, SectionId::ExplanationHeaderless);
    assert!(session.sections.is_valid_for(SectionId::ExplanationHeaderless, &artifact));
    assert!(!session.sections.is_valid_for(SectionId::Explanation, &artifact));
}

#[tokio::test]
async fn partial_report_offers_no_document() {
    let backend = Arc::new(CountingBackend::with_replies(vec![
        (PredictionStatus::Succeeded, Some(vec!["ok".into()])),
        (PredictionStatus::Failed, None),
    ]));
    let temp_dir = tempfile::TempDir::new().unwrap();
    let service = file_service(orchestrator(&backend), temp_dir.path());
    let mut session = AnalysisSession::new();

    let analysis = service.analyze(&mut session, &csv("a.csv")).await.unwrap();

    assert!(!analysis.report.is_complete());
    assert_eq!(analysis.report.failures().count(), 1);
    assert!(analysis.report.combined_markdown().is_none());
    assert!(analysis.document.is_none());
}

#[tokio::test]
async fn sample_files_are_analyzed_without_export() {
    let backend = Arc::new(CountingBackend::default());
    let temp_dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("country_codes.csv"),
        "country,code\nSpain,ES\nNorway,NO\n",
    )
    .unwrap();
    let service = file_service(orchestrator(&backend), temp_dir.path());
    let mut session = AnalysisSession::new();

    let analysis = service
        .analyze(&mut session, &InputArtifact::sample(FileFormat::Csv))
        .await
        .unwrap();

    assert!(analysis.report.is_complete());
    assert!(analysis.document.is_none());
    assert!(backend.last_prompt().contains("Norway"));
}

#[tokio::test]
async fn missing_sample_file_is_a_load_error() {
    let backend = Arc::new(CountingBackend::default());
    let temp_dir = tempfile::TempDir::new().unwrap();
    let service = file_service(orchestrator(&backend), temp_dir.path());
    let mut session = AnalysisSession::new();

    let err = service
        .analyze(&mut session, &InputArtifact::sample(FileFormat::Json))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(backend.creates(), 0);
}

#[tokio::test]
async fn editing_code_invalidates_every_code_section() {
    let backend = Arc::new(CountingBackend::default());
    let service =
        CodeDissectionService::new(orchestrator(&backend), Arc::new(PromptLibrary::new().unwrap()));
    let mut session = AnalysisSession::new();
    let input = CodeInput::new(Dialect::PostgreSql, "SELECT * FROM t");

    let report = service.generate_all(&mut session, &input).await;
    assert!(report.is_complete());
    assert_eq!(session.sections.done_count(), 3);

    let replayed = service.generate(&mut session, &input, CodeTask::Optimize).await;
    assert!(matches!(replayed, SectionOutcome::Replayed(_)));

    let edited = input.clone().with_observations("t has 1B rows");
    let fresh = service.generate(&mut session, &edited, CodeTask::Explain).await;
    assert_eq!(fresh, SectionOutcome::Generated("answer 4".into()));
    assert!(backend.last_prompt().ends_with("Note the following observations: t has 1B rows"));
    assert_eq!(session.sections.done_count(), 1);
}

fn json_service(backend: &Arc<CountingBackend>) -> TextToJsonService<CountingBackend> {
    TextToJsonService::new(
        orchestrator(backend),
        Arc::new(PromptLibrary::new().unwrap()),
        PollPolicy::new(3, Duration::ZERO),
    )
}

#[tokio::test]
async fn extraction_returns_structured_json() {
    let backend = Arc::new(CountingBackend::with_replies(vec![(
        PredictionStatus::Succeeded,
        Some(vec!["{\"Michael\": ".into(), "{\"apples\": 2}}".into()]),
    )]));
    let service = json_service(&backend);
    let mut session = AnalysisSession::new();

    let outcome = service.extract(&mut session, "Michael bought 2 apples").await;

    match &outcome {
        ExtractionOutcome::Structured { value, .. } => {
            assert_eq!(value["Michael"]["apples"], 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(outcome.download().is_some());
}

#[tokio::test]
async fn non_json_extraction_shows_raw_text() {
    let backend = Arc::new(CountingBackend::with_replies(vec![(
        PredictionStatus::Succeeded,
        Some(vec!["Michael bought apples.".into()]),
    )]));
    let service = json_service(&backend);
    let mut session = AnalysisSession::new();

    let outcome = service.extract(&mut session, "Michael bought 2 apples").await;

    assert!(matches!(outcome, ExtractionOutcome::Raw { ref text, .. } if text == "Michael bought apples."));
    assert!(outcome.download().is_none());
}

#[tokio::test]
async fn extraction_reset_forces_regeneration() {
    let backend = Arc::new(CountingBackend::default());
    let service = json_service(&backend);
    let mut session = AnalysisSession::new();

    service.extract(&mut session, "").await;
    assert!(backend.last_prompt().ends_with("Jenna bought 12 oranges, 4 kiwis, and 2 melons."));
    service.extract(&mut session, "").await;
    assert_eq!(backend.creates(), 1);

    service.reset(&mut session);
    service.extract(&mut session, "").await;
    // The result cache still holds the first answer.
    assert_eq!(backend.creates(), 1);
    assert!(session.sections.is_valid_for(
        SectionId::JsonExtraction,
        &InputArtifact::text(insight_application::prompts::EXTRACTION_EXAMPLE_TEXT)
    ));
}

#[tokio::test]
async fn failed_extraction_reports_message() {
    let backend = Arc::new(CountingBackend::with_replies(vec![(
        PredictionStatus::Canceled,
        None,
    )]));
    let service = json_service(&backend);
    let mut session = AnalysisSession::new();

    let outcome = service.extract(&mut session, "Ann owns 3 cats").await;

    assert_eq!(
        outcome,
        ExtractionOutcome::Failed(GENERATION_FAILED_MESSAGE.to_string())
    );
    assert_eq!(session.sections.done_count(), 0);
}
