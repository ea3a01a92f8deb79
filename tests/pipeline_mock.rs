//! End-to-end pipeline tests against mocked PokeAPI and ntfy servers
//!
//! Configuration is loaded from layered YAML files exactly as in production;
//! only the base URLs point at local wiremock servers.

mod common;

use common::{STARTERS, expect_ntfy_posts, mount_pokemon, mount_status, write_config_files};
use poke_analysis::{Error, Event, Pipeline, Statistic};
use wiremock::MockServer;

#[tokio::test]
async fn three_starters_end_to_end() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    for mon in &STARTERS {
        mount_pokemon(&api, mon).await;
    }
    expect_ntfy_posts(&ntfy, "poke-done", 1).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        "poke_id_start_of_range: 1\npoke_id_end_of_range: 3\n",
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();

    let report = pipeline.run().await.unwrap();
    let stats = &report.statistics;

    assert_eq!(report.dataset.shape(), (3, 7));
    let mean_height = stats.get(Statistic::Mean, "height").unwrap();
    assert!((mean_height - 12.3333).abs() < 1e-4, "mean height {mean_height}");
    assert_eq!(stats.get(Statistic::Median, "weight"), Some(130.0));
    assert_eq!(stats.get(Statistic::Min, "base_experience"), Some(64.0));
    assert_eq!(stats.get(Statistic::Max, "base_experience"), Some(263.0));
}

#[tokio::test]
async fn missing_key_shrinks_dataset() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    mount_pokemon(&api, &STARTERS[0]).await;
    mount_status(&api, 2, 404).await;
    mount_pokemon(&api, &STARTERS[2]).await;
    expect_ntfy_posts(&ntfy, "poke-done", 1).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        "poke_id_start_of_range: 1\npoke_id_end_of_range: 3\n",
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();
    let mut events = pipeline.subscribe();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.dataset.len(), 2);
    let ids: Vec<u32> = report.summary.skipped.iter().map(|id| id.get()).collect();
    assert_eq!(ids, vec![2]);

    let mut skipped = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::RecordSkipped { id, .. } = event {
            skipped.push(id.get());
        }
    }
    assert_eq!(skipped, vec![2]);
}

#[tokio::test]
async fn all_keys_missing_fails_analysis_without_notifying() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    mount_status(&api, 1, 404).await;
    mount_status(&api, 2, 500).await;
    expect_ntfy_posts(&ntfy, "poke-done", 0).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        "poke_id_start_of_range: 1\npoke_id_end_of_range: 2\n",
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::EmptyDataset));
}

#[tokio::test]
async fn always_policy_reports_failure_to_ntfy() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    mount_status(&api, 1, 404).await;
    expect_ntfy_posts(&ntfy, "poke-done", 1).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        &format!(
            "poke_id_start_of_range: 1\npoke_id_end_of_range: 1\n\
             notifications:\n  server: {}\n  notify_on: always\n",
            ntfy.uri()
        ),
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();

    assert!(pipeline.run().await.is_err());
}

#[tokio::test]
async fn concurrent_fetching_matches_sequential_result() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    for mon in &STARTERS {
        mount_pokemon(&api, mon).await;
    }
    mount_status(&api, 4, 404).await;
    expect_ntfy_posts(&ntfy, "poke-done", 1).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        &format!(
            "poke_id_start_of_range: 1\npoke_id_end_of_range: 4\n\
             api:\n  base_url: {}\n  max_concurrent_fetches: 3\n",
            api.uri()
        ),
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();
    assert_eq!(pipeline.config().api.max_concurrent_fetches, 3);

    let report = pipeline.run().await.unwrap();

    let species: Vec<&str> = report
        .dataset
        .rows()
        .iter()
        .map(|r| r.species.as_str())
        .collect();
    assert_eq!(species, vec!["bulbasaur", "ivysaur", "venusaur"]);
}

#[tokio::test]
async fn fail_fast_policy_aborts_the_run() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    mount_pokemon(&api, &STARTERS[0]).await;
    mount_status(&api, 2, 404).await;
    expect_ntfy_posts(&ntfy, "poke-done", 0).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        &format!(
            "poke_id_start_of_range: 1\npoke_id_end_of_range: 2\n\
             api:\n  base_url: {}\n  partial_fetch_policy: fail_fast\n",
            api.uri()
        ),
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::FetchFailed { ref id, .. } if id.get() == 2));
}

#[tokio::test]
async fn report_lands_in_job_dir() {
    let api = MockServer::start().await;
    let ntfy = MockServer::start().await;
    mount_pokemon(&api, &STARTERS[0]).await;
    expect_ntfy_posts(&ntfy, "poke-done", 1).await;

    let files = write_config_files(
        &api.uri(),
        &ntfy.uri(),
        "poke-done",
        "poke_id_start_of_range: 1\npoke_id_end_of_range: 1\nanalysis:\n  write_report: true\n",
    );
    let pipeline = Pipeline::from_files(&files.loader, &files.job).unwrap();

    pipeline.run().await.unwrap();

    let report_path = files.dir.path().join("job").join("analysis_report.json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(json["dataset"]["rows"][0]["species"], "bulbasaur");
    assert_eq!(json["statistics"]["median"]["weight"], 69.0);
}
