//! 인코딩 → forward → 디코딩 → 순위화 전체 파이프라인 통합 테스트.

use std::io::Write;

use fino_forecast::{
    decode, encode, rank, ArtifactSource, ForecastError, Lifecycle, MockSequenceModel,
    ModelBackend, ModelConfig, ModelFactory, ModelTier, SequenceModel, TransactionRecord,
    Vocabulary,
};

fn missing_artifacts() -> ArtifactSource {
    ArtifactSource {
        vocab_uri: "missing/vocab.json".to_string(),
        scaler_uri: "missing/scaler.json".to_string(),
        labels_uri: None,
    }
}

fn out_of_range_history() -> Vec<TransactionRecord> {
    (0..80)
        .map(|i| TransactionRecord {
            amount: -(i as f64),
            category_id: if i % 2 == 0 { -17 } else { 10_000 },
            merchant_id: if i % 3 == 0 { i64::MIN } else { i64::MAX },
            ..Default::default()
        })
        .collect()
}

#[test]
fn mock_pipeline_is_total() {
    let config = ModelConfig::default();
    let vocab = Vocabulary::default();
    let model = SequenceModel::Mock(MockSequenceModel::new(config.clone(), &vocab, None));

    for history in [Vec::new(), out_of_range_history()] {
        let input = encode(
            &history,
            config.sequence_length,
            config.num_categories,
            config.num_merchants,
        );
        let output = model.forward(&input).expect("mock forward never fails");
        let predictions = decode(&output, &vocab, None);
        assert_eq!(predictions.len(), config.forecast_horizon);

        let forecast = rank(&predictions);
        assert!(forecast.top_predictions.len() <= 5);
        assert!(vocab
            .merchants
            .contains(&forecast.most_likely_purchase.merchant));
    }
}

#[test]
fn zero_horizon_yields_fallback_forecast() {
    let config = ModelConfig {
        forecast_horizon: 0,
        ..Default::default()
    };
    let vocab = Vocabulary::default();
    let model = SequenceModel::Mock(MockSequenceModel::new(config.clone(), &vocab, Some(1)));

    let output = model
        .forward(&encode(&[], config.sequence_length, 41, 230))
        .unwrap();
    let predictions = decode(&output, &vocab, None);
    assert!(predictions.is_empty());

    let forecast = rank(&predictions);
    assert_eq!(forecast.most_likely_purchase.merchant, "Migros");
    assert_eq!(forecast.insights.total_predicted_spending, 450.0);
}

#[tokio::test]
async fn dispose_then_predict_fails() {
    let factory = ModelFactory::new("missing", missing_artifacts(), ModelConfig::default());
    let model = factory.create(ModelTier::Small, true);

    model.load().await.unwrap();
    model.predict(&out_of_range_history()).await.unwrap();
    model.dispose().await;

    for _ in 0..3 {
        assert!(matches!(
            model.predict(&[]).await,
            Err(ForecastError::UseAfterDispose)
        ));
    }
}

#[tokio::test]
async fn real_model_failure_engages_mock() {
    let dir = tempfile::tempdir().unwrap();
    // 그래프 파일은 있지만 유효하지 않음
    let mut graph = std::fs::File::create(dir.path().join("fin-o-large.onnx")).unwrap();
    graph.write_all(b"corrupted").unwrap();

    let factory = ModelFactory::new(dir.path(), missing_artifacts(), ModelConfig::default())
        .with_mock_seed(Some(99));
    let model = factory.create(ModelTier::Large, false);
    let mut status_rx = model.subscribe_status();

    model.load().await.unwrap();
    status_rx.changed().await.unwrap();

    let status = status_rx.borrow().clone();
    assert_eq!(status.backend, Some(ModelBackend::Mock));
    assert_eq!(status.lifecycle, Lifecycle::Ready);
    assert!(status.fallback_reason.is_some());

    let forecast = model.forecast(&[]).await.unwrap();
    assert!(forecast.most_likely_purchase.confidence >= 0.69);

    model.dispose().await;
    assert_eq!(model.status().lifecycle, Lifecycle::Disposed);
}

#[tokio::test]
async fn concurrent_predictions_share_loaded_model() {
    let factory = ModelFactory::new("missing", missing_artifacts(), ModelConfig::default());
    let model = std::sync::Arc::new(factory.create(ModelTier::Small, true));
    model.load().await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let model = std::sync::Arc::clone(&model);
            tokio::spawn(async move { model.predict(&[]).await.map(|p| p.len()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 10);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dispose_waits_for_in_flight_predictions() {
    let factory = ModelFactory::new("missing", missing_artifacts(), ModelConfig::default())
        .with_mock_seed(Some(21));
    let model = std::sync::Arc::new(factory.create(ModelTier::Small, true));
    model.load().await.unwrap();

    let history = out_of_range_history();
    let handles: Vec<_> = (0..64)
        .map(|_| {
            let model = std::sync::Arc::clone(&model);
            let history = history.clone();
            tokio::spawn(async move { model.predict(&history).await.map(|p| p.len()) })
        })
        .collect();

    let disposer = {
        let model = std::sync::Arc::clone(&model);
        tokio::spawn(async move { model.dispose().await })
    };

    let (mut completed, mut rejected) = (0, 0);
    for handle in handles {
        match handle.await.expect("prediction task must not panic") {
            Ok(len) => {
                assert_eq!(len, 10);
                completed += 1;
            }
            Err(ForecastError::UseAfterDispose) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    disposer.await.unwrap();

    assert_eq!(completed + rejected, 64);
    assert_eq!(model.status().lifecycle, Lifecycle::Disposed);
    assert!(matches!(model.load().await, Err(ForecastError::UseAfterDispose)));
    assert!(matches!(
        model.predict(&history).await,
        Err(ForecastError::UseAfterDispose)
    ));
}
