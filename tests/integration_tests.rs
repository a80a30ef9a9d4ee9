use httpmock::prelude::*;
use poke_etl::{CliConfig, EtlEngine, EtlError, FetchError, LocalStorage, PokemonPipeline};
use std::path::Path;
use tempfile::TempDir;

const TYPES: [&str; 4] = ["fire", "water", "grass", "electric"];

fn detail_body(id: u32) -> serde_json::Value {
    let primary = TYPES[(id as usize) % TYPES.len()];
    let mut types = vec![serde_json::json!({"slot": 1, "type": {"name": primary}})];
    if id % 5 == 0 {
        types.push(serde_json::json!({"slot": 2, "type": {"name": "flying"}}));
    }

    serde_json::json!({
        "id": id,
        "name": format!("mon-{}", id),
        "base_experience": id * 2,
        "types": types,
        "stats": [
            {"base_stat": 40 + id, "stat": {"name": "hp"}},
            {"base_stat": 50 + id, "stat": {"name": "attack"}},
            {"base_stat": 60 + id, "stat": {"name": "defense"}},
            {"base_stat": 70, "stat": {"name": "speed"}}
        ]
    })
}

fn mock_catalog(server: &MockServer, ids: &[u32]) {
    let results: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "name": format!("mon-{}", id),
                "url": server.url(format!("/pokemon/{}/", id)),
            })
        })
        .collect();

    server.mock(|when, then| {
        when.method(GET).path("/pokemon");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"count": ids.len(), "results": results}));
    });
}

fn config_for(server: &MockServer, output_dir: &str, limit: u32) -> CliConfig {
    CliConfig {
        base_url: server.base_url(),
        limit,
        concurrency: 8,
        timeout_secs: 5,
        output_dir: output_dir.to_string(),
        ..CliConfig::default()
    }
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

#[tokio::test]
async fn test_end_to_end_full_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("reports");
    let output_path = output_dir.to_str().unwrap().to_string();

    let server = MockServer::start();
    let ids: Vec<u32> = (1..=100).collect();
    mock_catalog(&server, &ids);
    for id in &ids {
        let id = *id;
        server.mock(|when, then| {
            when.method(GET).path(format!("/pokemon/{}/", id));
            then.status(200).json_body(detail_body(id));
        });
    }

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = PokemonPipeline::new(storage, config_for(&server, &output_path, 100));
    let outputs = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(outputs.len(), 5);
    for name in [
        "type_distribution.png",
        "top5_base_experience.csv",
        "type_stats.csv",
        "pokemon.csv",
        "run_summary.json",
    ] {
        assert!(output_dir.join(name).exists(), "missing {}", name);
    }

    // 完整資料表依 id 排序
    let dataset = read(&output_dir, "pokemon.csv");
    let ids_in_file: Vec<u32> = dataset
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids_in_file, ids);

    // 每種屬性一列，依名稱排序
    let stats = read(&output_dir, "type_stats.csv");
    let type_names: Vec<&str> = stats
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(type_names, vec!["electric", "fire", "flying", "grass", "water"]);

    let summary: serde_json::Value =
        serde_json::from_str(&read(&output_dir, "run_summary.json")).unwrap();
    assert_eq!(summary["catalog_entries"], 100);
    assert_eq!(summary["succeeded"], 100);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["table_rows"], 100);
    assert_eq!(summary["distinct_types"], 5);

    // 屬性展開後總數至少等於記錄數；每 5 筆多一個 flying
    let type_count = summary["type_count"].as_object().unwrap();
    let expanded: u64 = type_count.values().map(|v| v.as_u64().unwrap()).sum();
    assert!(expanded >= 100);
    assert_eq!(expanded, 120);
    assert_eq!(type_count["flying"], 20);
    assert_eq!(type_count["fire"], 25);

    let top = read(&output_dir, "top5_base_experience.csv");
    let top_names: Vec<&str> = top
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(top_names, vec!["Mon-100", "Mon-99", "Mon-98", "Mon-97", "Mon-96"]);

    let chart = std::fs::read(output_dir.join("type_distribution.png")).unwrap();
    assert!(chart.starts_with(&[0x89, b'P', b'N', b'G']));

    assert!(Path::new(&outputs[0]).starts_with(&output_dir));
}

#[tokio::test]
async fn test_partial_failures_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let ids: Vec<u32> = (1..=10).collect();
    mock_catalog(&server, &ids);

    let mut failing = Vec::new();
    for id in &ids {
        let id = *id;
        if id % 3 == 0 {
            failing.push(server.mock(|when, then| {
                when.method(GET).path(format!("/pokemon/{}/", id));
                then.status(500);
            }));
        } else {
            server.mock(|when, then| {
                when.method(GET).path(format!("/pokemon/{}/", id));
                then.status(200).json_body(detail_body(id));
            });
        }
    }

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = PokemonPipeline::new(storage, config_for(&server, &output_path, 10));
    let result = EtlEngine::new(pipeline).run().await;

    assert!(result.is_ok());
    for mock in &failing {
        mock.assert();
    }

    let dataset = read(temp_dir.path(), "pokemon.csv");
    assert_eq!(dataset.lines().count(), 1 + 7);
    assert!(!dataset.contains("Mon-3,"));

    let summary: serde_json::Value =
        serde_json::from_str(&read(temp_dir.path(), "run_summary.json")).unwrap();
    assert_eq!(summary["succeeded"], 7);
    assert_eq!(summary["failed"], 3);
}

#[tokio::test]
async fn test_catalog_failure_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("never").to_str().unwrap().to_string();

    let server = MockServer::start();
    let catalog_mock = server.mock(|when, then| {
        when.method(GET).path("/pokemon");
        then.status(503);
    });

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = PokemonPipeline::new(storage, config_for(&server, &output_path, 100));
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    catalog_mock.assert();
    assert!(matches!(
        err,
        EtlError::CatalogFetch(FetchError::Http { status: 503, .. })
    ));
    assert!(!Path::new(&output_path).exists());
}

#[tokio::test]
async fn test_empty_catalog_still_writes_reports() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    mock_catalog(&server, &[]);

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = PokemonPipeline::new(storage, config_for(&server, &output_path, 100));
    let outputs = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(outputs.len(), 5);
    assert_eq!(
        read(temp_dir.path(), "type_stats.csv"),
        "type,mean_hp,mean_attack,mean_defense\n"
    );
}
