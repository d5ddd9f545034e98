use async_trait::async_trait;
use exam_segmenter::error::{AppError, AppResult, ServiceError};
use exam_segmenter::services::{
    ConvertedDocument, DocumentConverter, JsonFileStore, LlmClient, RecordSink, WarnWriter,
};
use exam_segmenter::workflow::{DocumentCtx, DocumentFlow, Method};
use exam_segmenter::{App, Config, SegmenterConfig, SourceKind};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SAMPLE: &str = include_str!("fixtures/exam_2025_a.txt");

/// 不读磁盘，直接返回固定内容
struct FixedConverter(String, SourceKind);

#[async_trait]
impl DocumentConverter for FixedConverter {
    async fn convert(&self, _path: &Path) -> AppResult<ConvertedDocument> {
        Ok(ConvertedDocument {
            content: self.0.clone(),
            kind: self.1,
            converter: "fixed",
        })
    }
}

struct CannedLlm(Result<String, ()>);

#[async_trait]
impl LlmClient for CannedLlm {
    fn model(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
        self.0.clone().map_err(|_| ServiceError::LlmFailed {
            model: "canned".to_string(),
            attempts: 3,
            message: "offline".to_string(),
        })
    }
}

#[derive(Default)]
struct MemorySink {
    written: Mutex<Vec<(String, String, Value)>>,
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn persist(&self, collection: &str, id: &str, document: &Value) -> Result<(), ServiceError> {
        self.written
            .lock()
            .unwrap()
            .push((collection.to_string(), id.to_string(), document.clone()));
        Ok(())
    }
}

fn flow(
    content: &str,
    llm: Option<Arc<dyn LlmClient>>,
    sink: Arc<MemorySink>,
    warn_path: &Path,
) -> DocumentFlow {
    DocumentFlow::new(
        Arc::new(FixedConverter(content.to_string(), SourceKind::Text)),
        llm,
        sink,
        WarnWriter::with_path(warn_path.to_string_lossy()),
        SegmenterConfig::default(),
    )
}

#[tokio::test]
async fn test_pattern_pipeline_persists_exam_and_questions() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::default());
    let flow = flow(SAMPLE, None, sink.clone(), &dir.path().join("warn.txt"));

    let report = flow
        .run(&DocumentCtx::new("input/exam_2025_a.txt", 1))
        .await
        .unwrap();

    assert_eq!(report.method, Method::Pattern);
    assert_eq!(report.exam.name, "exam_2025_a");
    assert_eq!(report.exam.total_questions, 9);
    assert_eq!(report.exam.multiple_choice_count, 8);
    assert_eq!(report.exam.fill_in_count, 1);
    assert_eq!(report.exam.total_points, 19);

    let written = sink.written.lock().unwrap();
    assert_eq!(written.len(), 10);
    assert_eq!(written[0].0, "exams");
    assert_eq!(written[0].1, "exam_2025_a");
    assert_eq!(written[0].2["method"], "pattern");
    assert!(written[1..]
        .iter()
        .all(|(collection, _, _)| collection == "exams/exam_2025_a/questions"));
    assert_eq!(written[9].1, "fill_in_2.1");
    assert_eq!(written[9].2["parts"][0]["partNumber"], 1);

    // 全部完整，不写 warn.txt
    assert!(!dir.path().join("warn.txt").exists());
}

#[tokio::test]
async fn test_placeholder_reply_falls_back_to_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::default());
    let reply = r#"[{"id":"mc_1","type":"multiple_choice","questionNumber":1,
        "text":"[Энд бодит асуултын текст байна]","points":1}]"#;
    let llm: Arc<dyn LlmClient> = Arc::new(CannedLlm(Ok(reply.to_string())));
    let flow = flow(SAMPLE, Some(llm), sink, &dir.path().join("warn.txt"));

    let report = flow.run(&DocumentCtx::new("a.txt", 1)).await.unwrap();
    assert_eq!(report.method, Method::Pattern);
    assert_eq!(report.records.len(), 9);
}

#[tokio::test]
async fn test_llm_failure_falls_back_to_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let llm: Arc<dyn LlmClient> = Arc::new(CannedLlm(Err(())));
    let flow = flow(
        SAMPLE,
        Some(llm),
        Arc::new(MemorySink::default()),
        &dir.path().join("warn.txt"),
    );

    let report = flow.run(&DocumentCtx::new("a.txt", 1)).await.unwrap();
    assert_eq!(report.method, Method::Pattern);
}

#[tokio::test]
async fn test_llm_success_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let reply = r#"```json
    [{"id":"mc_7","type":"multiple_choice","questionNumber":7,
      "text":"Логарифм тэгшитгэлийг бодоорой.",
      "options":[{"letter":"A","text":"1"},{"letter":"B","text":"2"}],"points":1}]
    ```"#;
    let llm: Arc<dyn LlmClient> = Arc::new(CannedLlm(Ok(reply.to_string())));
    let flow = flow(
        SAMPLE,
        Some(llm),
        Arc::new(MemorySink::default()),
        &dir.path().join("warn.txt"),
    );

    let report = flow.run(&DocumentCtx::new("a.txt", 1)).await.unwrap();
    assert_eq!(report.method, Method::Llm);
    assert_eq!(report.records.len(), 1);
    assert!(!report.records[0].complete);

    // 不完整题目写入 warn.txt
    let warn = std::fs::read_to_string(dir.path().join("warn.txt")).unwrap();
    assert!(warn.contains("mc_7"));
}

#[tokio::test]
async fn test_no_records_is_an_error_and_nothing_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::default());
    let flow = flow(
        "Зөвхөн тайлбар текст.",
        None,
        sink.clone(),
        &dir.path().join("warn.txt"),
    );

    let err = flow.run(&DocumentCtx::new("empty.txt", 1)).await.unwrap_err();
    assert!(matches!(err, AppError::Segment(_)));
    assert!(sink.written.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_run_over_folder() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("exam_2025_a.txt"), SAMPLE).unwrap();
    std::fs::write(
        input.path().join("quiz.html"),
        "<p>1. Илэрхийллийн утгыг олоорой.</p><p>A. 1 B. 2 C. 3</p>",
    )
    .unwrap();
    std::fs::write(input.path().join("notes.txt"), "Асуулт байхгүй.").unwrap();
    std::fs::write(input.path().join("ignored.docx"), "x").unwrap();

    let config = Config {
        input_folder: input.path().to_string_lossy().into_owned(),
        output_folder: output.path().join("db").to_string_lossy().into_owned(),
        warn_file: output.path().join("warn.txt").to_string_lossy().into_owned(),
        output_log_file: output.path().join("output.txt").to_string_lossy().into_owned(),
        max_concurrent_documents: 2,
        ..Config::default()
    };

    let stats = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.questions, 10);

    let store = JsonFileStore::new(output.path().join("db"));
    let exam: Value = serde_json::from_str(
        &std::fs::read_to_string(store.document_path("exams", "exam_2025_a")).unwrap(),
    )
    .unwrap();
    assert_eq!(exam["totalQuestions"], 9);
    assert!(store
        .document_path("exams/quiz/questions", "mc_1")
        .exists());
    assert!(!store.document_path("exams", "notes").exists());

    let warn = std::fs::read_to_string(output.path().join("warn.txt")).unwrap();
    assert_eq!(warn.lines().count(), 1);
    assert!(warn.contains("quiz"));

    let log = std::fs::read_to_string(output.path().join("output.txt")).unwrap();
    assert!(log.contains("试卷切分日志"));
}

#[test]
fn test_json_store_blocking_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    tokio_test::block_on(store.persist("exams", "demo", &serde_json::json!({"name": "demo"})))
        .unwrap();
    assert!(dir.path().join("exams/demo.json").exists());
}
