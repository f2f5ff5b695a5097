mod common;

use std::sync::Arc;
use std::time::Duration;

use common::model_server::{MockModelServer, ServiceState, fast_config, find_available_port, spawn_model_server};
use resemble::candidate::{Candidate, MethodShape, Parameter};
use resemble::corpus::{self, CorpusUnit, Occurrence};
use resemble::gateway::{
    EmbeddingClient, GenerativeClient, ModelGateway, ModelKind, RelatednessClient,
};
use resemble::pipeline::{ModelBackends, Pipeline, PipelineError, PipelineSettings};
use resemble::report::{InMemoryReport, ReportSink};
use resemble::verdict::{Decision, Verdict};

const QUERY: &str = "add an element to a list";
const ADD: &str = "java.util.List add(..)";
const SIZE: &str = "java.util.List size(..)";

struct Services {
    embedding: MockModelServer,
    relatedness: MockModelServer,
    generative: MockModelServer,
}

impl Services {
    async fn spawn(yes_probability: f64) -> Self {
        let embedding = ServiceState::default()
            .vector(QUERY, vec![0.0, 0.0])
            .vector("boolean add(E e)", vec![0.1, 0.0])
            .vector("int size()", vec![3.0, 4.0]);
        let relatedness = ServiceState::with_default_verdict(-1)
            .verdict("list.add(1)", 1)
            .verdict("list.add(2)", 0);
        Self {
            embedding: spawn_model_server(ModelKind::Embedding, embedding)
                .await
                .unwrap(),
            relatedness: spawn_model_server(ModelKind::Relatedness, relatedness)
                .await
                .unwrap(),
            generative: spawn_model_server(
                ModelKind::Generative,
                ServiceState::with_yes_probability(yes_probability),
            )
            .await
            .unwrap(),
        }
    }

    fn backends(&self) -> ModelBackends {
        backends_at(
            self.embedding.gateway_config(ModelKind::Embedding),
            self.relatedness.gateway_config(ModelKind::Relatedness),
            self.generative.gateway_config(ModelKind::Generative),
        )
    }
}

fn backends_at(
    embedding: resemble::gateway::GatewayConfig,
    relatedness: resemble::gateway::GatewayConfig,
    generative: resemble::gateway::GatewayConfig,
) -> ModelBackends {
    let gateway = |config| Arc::new(ModelGateway::new(config).unwrap());
    ModelBackends {
        embedding: Arc::new(EmbeddingClient::new(gateway(embedding))),
        relatedness: Arc::new(RelatednessClient::new(gateway(relatedness))),
        generative: Arc::new(GenerativeClient::new(gateway(generative))),
    }
}

fn corpus() -> Vec<CorpusUnit> {
    let size = MethodShape {
        declaring_type: Some("java.util.List".to_string()),
        name: "size".to_string(),
        return_type: Some("int".to_string()),
        parameters: vec![],
    };
    let mut second = CorpusUnit::new("src/B.java")
        .with_occurrence(Occurrence::new("list.size()", SIZE))
        .with_occurrence(Occurrence::new("list.add(3)", ADD));
    second
        .candidates
        .push(corpus::CandidateSpec::Shape(size));

    vec![
        CorpusUnit::new("src/A.java")
            .with_candidate(Candidate::new("boolean add(E e)", ADD))
            .with_occurrence(Occurrence::new("list.add(1)", ADD))
            .with_occurrence(Occurrence::new("list.add(2)", ADD)),
        second,
    ]
}

#[tokio::test]
async fn test_search_over_http_services() {
    let services = Services::spawn(0.9).await;
    let report = Arc::new(InMemoryReport::new());
    let sink: Arc<dyn ReportSink> = report.clone();
    let pipeline = Pipeline::new(
        PipelineSettings::new(QUERY).with_top_k(1),
        services.backends(),
        sink,
    );

    let outcome = pipeline.run(&corpus()).await.unwrap();

    assert_eq!(outcome.top_k.len(), 1);
    assert_eq!(outcome.top_k.entries()[0].candidate.pattern, ADD);

    let verdicts: Vec<Verdict> = outcome
        .decisions
        .iter()
        .map(|d| d.classification.embedding_verdict)
        .collect();
    assert_eq!(
        verdicts,
        vec![Verdict::Positive, Verdict::Uncertain, Verdict::Negative]
    );
    let decisions: Vec<Decision> = outcome
        .decisions
        .iter()
        .map(|d| d.classification.decision)
        .collect();
    assert_eq!(
        decisions,
        vec![Decision::Match, Decision::Match, Decision::NoMatch]
    );
    assert_eq!(outcome.escalations(), 1);
    assert_eq!(outcome.units[1].skipped, 1);
    assert!(outcome.failures.is_empty());

    // Query plus two distinct signatures; occurrences go to the relatedness model.
    assert_eq!(services.embedding.state.calls(), 3);
    assert_eq!(services.relatedness.state.calls(), 3);
    assert_eq!(services.generative.state.calls(), 1);

    let prompt = services.generative.state.bodies()[0]["prompt"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(prompt.contains(QUERY));
    assert!(prompt.contains("list.add(2)"));
    assert!(prompt.ends_with("ANS:"));

    let snapshot = report.snapshot();
    assert_eq!(snapshot.code_search.len(), 3);
    assert_eq!(snapshot.suggested_patterns.len(), 2);
    assert_eq!(snapshot.top_k.len(), 1);
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["code_search"][0]["decision"], "MATCH");
    assert_eq!(json["code_search"][0]["embedding_verdict"], 1);
}

#[tokio::test]
async fn test_generative_no_keeps_uncertain_out() {
    let services = Services::spawn(0.2).await;
    let pipeline = Pipeline::new(
        PipelineSettings::new(QUERY).with_top_k(1),
        services.backends(),
        Arc::new(InMemoryReport::new()),
    );

    let outcome = pipeline.run(&corpus()).await.unwrap();

    assert_eq!(outcome.matches().count(), 1);
    assert_eq!(outcome.matches().next().unwrap().occurrence, "list.add(1)");
}

#[tokio::test]
async fn test_unreachable_generative_service_aborts_run() {
    let services = Services::spawn(0.9).await;
    let port = find_available_port().await.unwrap();
    let dead = fast_config(ModelKind::Generative, &format!("http://127.0.0.1:{port}"))
        .with_probe_policy(Duration::from_millis(10), 2);
    let backends = backends_at(
        services.embedding.gateway_config(ModelKind::Embedding),
        services.relatedness.gateway_config(ModelKind::Relatedness),
        dead,
    );
    let pipeline = Pipeline::new(
        PipelineSettings::new(QUERY).with_top_k(1),
        backends,
        Arc::new(InMemoryReport::new()),
    );

    let err = pipeline.run(&corpus()).await.unwrap_err();

    assert!(matches!(err, PipelineError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_parameterized_shape_candidate() {
    let shape = MethodShape {
        declaring_type: Some("java.util.List<E>".to_string()),
        name: "add".to_string(),
        return_type: Some("boolean".to_string()),
        parameters: vec![Parameter {
            type_name: "E".to_string(),
            name: "e".to_string(),
        }],
    };
    let services = Services::spawn(0.9).await;
    let mut unit = CorpusUnit::new("src/C.java")
        .with_occurrence(Occurrence::new("list.add(1)", "java.util.List<String> add(..)"));
    unit.candidates.push(corpus::CandidateSpec::Shape(shape));
    let pipeline = Pipeline::new(
        PipelineSettings::new(QUERY),
        services.backends(),
        Arc::new(InMemoryReport::new()),
    );

    let outcome = pipeline.run(&[unit]).await.unwrap();

    assert_eq!(outcome.decisions.len(), 1);
    assert_eq!(outcome.decisions[0].classification.decision, Decision::Match);
}
