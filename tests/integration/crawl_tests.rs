//! Integration tests for the crawler
//!
//! These tests use wiremock to serve result pages and a temporary SQLite
//! file for the catalog, and drive the full crawl cycle end-to-end.

use saramin_crawler::config::{CommitPolicy, Config, CrawlerConfig, FetcherConfig, OutputConfig};
use saramin_crawler::crawler::{run_crawl, StopReason};
use saramin_crawler::model::NewJob;
use saramin_crawler::storage::{SqliteStorage, Storage};
use saramin_crawler::CrawlError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, target_count: u32, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            keyword: "backend".to_string(),
            target_count,
            max_pages: None,
            min_delay_ms: 0, // No pacing in tests
            max_delay_ms: 0,
            commit_policy: CommitPolicy::WholeRun,
        },
        fetcher: FetcherConfig {
            search_url: format!("{}/zf_user/search/recruit", server.uri()),
            max_retries: 3,
            backoff_step_ms: 0,
            ..FetcherConfig::default()
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            summary_path: db_path
                .with_extension("md")
                .to_string_lossy()
                .into_owned(),
        },
    }
}

/// One result block in the markup the parser expects
fn listing(company: &str, title: &str, job_id: u32, skills: &[&str]) -> String {
    let tags: String = skills
        .iter()
        .map(|skill| format!("<a>{}</a>", skill))
        .collect();
    format!(
        r#"<div class="item_recruit">
            <div class="area_corp"><strong class="corp_name"><a href="/company/{job_id}">{company}</a></strong></div>
            <div class="area_job">
                <h2 class="job_tit"><a href="/zf_user/jobs/relay/view?rec_idx={job_id}" title="{title}">{title}</a></h2>
                <div class="job_date"><span class="date">~ 11/30(토)</span></div>
                <div class="job_condition">
                    <span><a>서울</a> <a>강남구</a></span>
                    <span>경력 3년↑</span>
                    <span>대학교(4년)↑</span>
                    <span>정규직</span>
                </div>
                <div class="job_sector">{tags}</div>
            </div>
        </div>"#
    )
}

fn result_page(blocks: &[String]) -> String {
    format!(
        "<html><body><div class=\"content\">{}</div></body></html>",
        blocks.concat()
    )
}

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/zf_user/search/recruit"))
        .and(query_param("searchword", "backend"))
        .and(query_param("recruitPage", page.to_string().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn open(db_path: &Path) -> SqliteStorage {
    SqliteStorage::new(db_path).expect("Failed to reopen catalog")
}

fn job_link(server: &MockServer, job_id: u32) -> String {
    format!("{}/zf_user/jobs/relay/view?rec_idx={}", server.uri(), job_id)
}

#[tokio::test]
async fn test_crawl_reaches_target() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[
            listing("Acme", "Backend Engineer", 1, &["Rust", "AWS"]),
            listing("Globex", "Platform Engineer", 2, &["Go"]),
            listing("Initech", "API Developer", 3, &["Java"]),
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&server, 2, &db_path);

    let report = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::TargetReached);
    assert_eq!(report.jobs_saved, 2);
    assert_eq!(report.pages_fetched, 1);

    let storage = open(&db_path);
    assert_eq!(storage.count_jobs().unwrap(), 2);
    assert_eq!(storage.count_companies().unwrap(), 2);

    let job = storage
        .find_job_by_link(&job_link(&server, 1))
        .unwrap()
        .expect("first listing should be stored");
    assert_eq!(job.title, "Backend Engineer");
    assert_eq!(job.location, "서울 강남구");
    assert_eq!(job.employment_type, "정규직");
    assert_eq!(job.skills, vec!["Rust".to_string(), "AWS".to_string()]);
    assert_eq!(job.views, 0);
    assert_eq!(storage.get_company(job.company_id).unwrap().name, "Acme");

    assert!(storage
        .find_job_by_link(&job_link(&server, 3))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_crawl_recovers_from_transient_failure() {
    let server = MockServer::start().await;

    // First request fails, retry succeeds
    Mock::given(method("GET"))
        .and(path("/zf_user/search/recruit"))
        .and(query_param("recruitPage", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        1,
        result_page(&[listing("Acme", "Backend Engineer", 1, &["Rust"])]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&server, 1, &db_path);

    let report = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(report.jobs_saved, 1);
    assert_eq!(open(&db_path).count_jobs().unwrap(), 1);
}

#[tokio::test]
async fn test_permanent_failure_rolls_back_whole_run() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[
            listing("Acme", "Backend Engineer", 1, &["Rust"]),
            listing("Globex", "Platform Engineer", 2, &["Go"]),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/zf_user/search/recruit"))
        .and(query_param("recruitPage", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&server, 10, &db_path);

    let result = run_crawl(config).await;

    assert!(matches!(result, Err(CrawlError::Fetch { page: 2, .. })));

    let storage = open(&db_path);
    assert_eq!(storage.count_jobs().unwrap(), 0);
    assert_eq!(storage.count_companies().unwrap(), 0);
}

#[tokio::test]
async fn test_per_listing_policy_keeps_earlier_writes() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[listing("Acme", "Backend Engineer", 1, &["Rust"])]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/zf_user/search/recruit"))
        .and(query_param("recruitPage", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let mut config = create_test_config(&server, 10, &db_path);
    config.crawler.commit_policy = CommitPolicy::PerListing;

    let result = run_crawl(config).await;

    assert!(result.is_err());
    assert_eq!(open(&db_path).count_jobs().unwrap(), 1);
}

#[tokio::test]
async fn test_existing_job_left_unchanged() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[
            listing("Acme", "Backend Engineer (renamed)", 1, &["Rust"]),
            listing("Acme", "Platform Engineer", 2, &["Go"]),
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");

    // Seed the catalog with the first posting
    {
        let mut storage = open(&db_path);
        let company_id = storage.insert_or_get_company("Acme").unwrap().id();
        storage
            .insert_job(&NewJob {
                company_id,
                title: "Backend Engineer".to_string(),
                link: job_link(&server, 1),
                location: "서울".to_string(),
                experience: String::new(),
                education: String::new(),
                employment_type: String::new(),
                deadline: String::new(),
                sector: String::new(),
                salary: String::new(),
                skills: vec![],
            })
            .unwrap();
        storage.close().unwrap();
    }

    let config = create_test_config(&server, 1, &db_path);
    let report = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(report.duplicates, 1);
    assert_eq!(report.jobs_saved, 1);
    assert_eq!(report.companies_created, 0);

    let storage = open(&db_path);
    assert_eq!(storage.count_jobs().unwrap(), 2);
    assert_eq!(storage.count_companies().unwrap(), 1);

    let existing = storage
        .find_job_by_link(&job_link(&server, 1))
        .unwrap()
        .unwrap();
    assert_eq!(existing.title, "Backend Engineer");
    assert!(existing.skills.is_empty());
}

#[tokio::test]
async fn test_company_shared_across_listings() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[
            listing("Acme", "Backend Engineer", 1, &["Rust"]),
            listing("Acme", "Frontend Engineer", 2, &["TypeScript"]),
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&server, 2, &db_path);

    let report = run_crawl(config).await.expect("Crawl failed");
    assert_eq!(report.companies_created, 1);

    let storage = open(&db_path);
    assert_eq!(storage.count_companies().unwrap(), 1);

    let first = storage.find_job_by_link(&job_link(&server, 1)).unwrap().unwrap();
    let second = storage.find_job_by_link(&job_link(&server, 2)).unwrap().unwrap();
    assert_eq!(first.company_id, second.company_id);
}

#[tokio::test]
async fn test_empty_page_ends_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[listing("Acme", "Backend Engineer", 1, &["Rust"])]),
    )
    .await;
    mount_page(&server, 2, result_page(&[])).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&server, 10, &db_path);

    let report = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::NoMoreListings);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.jobs_saved, 1);
    assert_eq!(open(&db_path).count_jobs().unwrap(), 1);
}

#[tokio::test]
async fn test_page_limit_respected() {
    let server = MockServer::start().await;
    for page in 1..=3 {
        mount_page(
            &server,
            page,
            result_page(&[listing("Acme", "Backend Engineer", page, &["Rust"])]),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let mut config = create_test_config(&server, 10, &db_path);
    config.crawler.max_pages = Some(2);

    let report = run_crawl(config).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::PageLimit);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(open(&db_path).count_jobs().unwrap(), 2);
}

#[tokio::test]
async fn test_second_run_only_adds_new_postings() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        result_page(&[
            listing("Acme", "Backend Engineer", 1, &["Rust"]),
            listing("Globex", "Platform Engineer", 2, &["Go"]),
        ]),
    )
    .await;
    mount_page(&server, 2, result_page(&[])).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");

    let first = run_crawl(create_test_config(&server, 10, &db_path))
        .await
        .expect("First crawl failed");
    let second = run_crawl(create_test_config(&server, 10, &db_path))
        .await
        .expect("Second crawl failed");

    assert_eq!(first.jobs_saved, 2);
    assert_eq!(second.jobs_saved, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(open(&db_path).count_jobs().unwrap(), 2);
}
