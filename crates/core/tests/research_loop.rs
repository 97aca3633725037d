use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;

use serde_json::json;
use sleuth_core::snapshot::{self, Snapshot};
use sleuth_core::{
    ContentFetcher, EngineBuilder, FetchedPage, Phase, ResearchRequest,
    RoutingTable,
};
use sleuth_test_model::TestModelProvider;

#[derive(Debug)]
struct NotFound;

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "not found")
    }
}

impl Error for NotFound {}

/// Serves every page except the crates.io search.
struct Web;

impl ContentFetcher for Web {
    type Error = NotFound;

    fn fetch(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<FetchedPage, Self::Error>> + Send + 'static
    {
        let result = if url.starts_with("https://crates.io") {
            Err(NotFound)
        } else {
            Ok(FetchedPage::new(format!("Notes from {url}")))
        };
        ready(result)
    }
}

const ROUTES: &str = r#"{
    "routes": [
        {
            "keywords": ["rust"],
            "urls": [
                "https://doc.rust-lang.org/std/?search={query}",
                "https://crates.io/search?q={query}",
                "https://users.rust-lang.org"
            ]
        }
    ],
    "fallback": ["https://en.wikipedia.org/wiki/{slug}"]
}"#;

fn script(provider: &TestModelProvider) {
    provider.add_text_response("QUERY: rust async\nTOPICS: futures\nTYPE: howto");
    provider.add_text_response("- Futures are lazy.\n- Executors poll them.");
    provider.add_text_response(
        "CONFIDENCE: 40\nREASONING: Runtimes are missing.\n\
         NEXT_QUERY: rust async runtime",
    );
    provider.add_text_response("- Tokio is a popular runtime.");
    provider.add_text_response(
        "CONFIDENCE: 90\nREASONING: Enough to answer.\nNEXT_QUERY: none",
    );
    provider.add_text_response("Async Rust runs lazy futures on a runtime.");
}

#[tokio::test]
async fn test_refined_research_over_custom_routes() {
    let provider = TestModelProvider::default();
    script(&provider);
    let (reporter, mut snapshot_rx) = snapshot::channel();
    let engine = EngineBuilder::new(provider.clone(), Web)
        .with_routing_table(RoutingTable::from_json(ROUTES).unwrap())
        .with_reporter(reporter)
        .build();

    let request = ResearchRequest::new("How does async Rust work?").with_limit(2);
    let result = engine.run(request).await.unwrap();

    assert!(result.answered);
    assert_eq!(
        result.final_summary,
        "Async Rust runs lazy futures on a runtime."
    );
    assert_eq!(
        result.findings().collect::<Vec<_>>(),
        vec![
            "Futures are lazy.",
            "Executors poll them.",
            "Tokio is a popular runtime.",
        ]
    );
    assert_eq!(result.fetched_source_count(), 2);
    assert_eq!(
        result.provenance(),
        "Based on 2 analyzed sources from 2 search iterations."
    );
    assert_eq!(provider.pending_responses(), 0);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["answered"], json!(true));
    assert_eq!(value["iterations"][1]["query"], json!("rust async runtime"));
    assert_eq!(
        value["iterations"][1]["bulletPoints"],
        json!(["Tokio is a popular runtime."])
    );
    assert_eq!(
        value["sources"],
        json!([
            {
                "url": "https://doc.rust-lang.org/std/?search=rust%20async",
                "title": "doc.rust-lang.org",
                "status": "fetched"
            },
            {
                "url": "https://crates.io/search?q=rust%20async",
                "title": "crates.io",
                "status": "failed"
            },
            {
                "url": "https://users.rust-lang.org",
                "title": "users.rust-lang.org",
                "status": "fetched"
            }
        ])
    );

    let mut snapshots: Vec<Snapshot> = vec![];
    while let Ok(snapshot) = snapshot_rx.try_recv() {
        snapshots.push(snapshot);
    }
    let phases: Vec<_> = snapshots.iter().map(|s| s.phase).collect();
    let round = [
        Phase::Searching,
        Phase::Scraping,
        Phase::Summarizing,
        Phase::Assessing,
        Phase::IterationDone,
    ];
    let expected: Vec<_> = [Phase::Planning]
        .into_iter()
        .chain(round)
        .chain(round)
        .chain([Phase::Done])
        .collect();
    assert_eq!(phases, expected);

    let searching: Vec<_> = snapshots
        .iter()
        .filter(|s| s.phase == Phase::IterationDone)
        .map(|s| s.is_searching)
        .collect();
    assert_eq!(searching, vec![true, false]);

    let done = serde_json::to_value(snapshots.last().unwrap()).unwrap();
    assert_eq!(done["phase"], json!("done"));
    assert_eq!(done["isSearching"], json!(false));
    assert_eq!(
        done["finalSummary"],
        json!("Async Rust runs lazy futures on a runtime.")
    );
    assert_eq!(done["allSources"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unmatched_request_uses_fallback() {
    let table = RoutingTable::from_json(ROUTES).unwrap();
    let picked = table.select("Ada Lovelace", 0, 5);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].url(), "https://en.wikipedia.org/wiki/Ada_Lovelace");
    assert_eq!(table.select("Ada Lovelace", 0, 5), picked);
    assert!(table.select("Ada Lovelace", 1, 5).is_empty());
}
