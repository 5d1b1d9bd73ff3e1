//! End-to-end pipeline: index → discovery → archive → assemble → document.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use labbook_archiver::Archiver;
use labbook_discovery::discover_labs;
use labbook_shared::{ArchivedPage, PageOutcome, Result, RunConfig, build_client};

use crate::assembler::{self, AssembleConfig, AssembleResult};

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Lab links found on the index page.
    pub links_found: usize,
    /// Pages written to the download directory, in archive order.
    pub archived: Vec<ArchivedPage>,
    /// Pages that could not be fetched (URL, reason).
    pub failed: Vec<(String, String)>,
    /// Assembly outcome.
    pub assembled: AssembleResult,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the index page has been parsed.
    fn links_found(&self, count: usize);
    /// Called after a page is written to disk.
    fn page_archived(&self, page: &ArchivedPage, current: usize, total: usize);
    /// Called when a page fetch fails and the page is skipped.
    fn page_failed(&self, url: &str, reason: &str, current: usize, total: usize);
    /// Called once the combined document is written.
    fn assembled(&self, result: &AssembleResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn links_found(&self, _count: usize) {}
    fn page_archived(&self, _page: &ArchivedPage, _current: usize, _total: usize) {}
    fn page_failed(&self, _url: &str, _reason: &str, _current: usize, _total: usize) {}
    fn assembled(&self, _result: &AssembleResult) {}
}

/// Run the full pipeline.
///
/// 1. Discovery: fetch the index page and collect lab links (fatal on failure)
/// 2. Archive: fetch each lab page sequentially, skipping failed fetches
/// 3. Assemble: extract fragments from the archived pages into the template
#[instrument(skip_all, fields(index = %config.index_url))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();
    let client = build_client(config)?;
    let archiver = Archiver::new(client.clone(), &config.download_dir)?;

    // --- Phase 1: Discovery ---
    progress.phase("Discovering labs");
    let links = discover_labs(&client, &config.index_url, &config.base_url).await?;
    progress.links_found(links.len());

    // --- Phase 2: Archive ---
    progress.phase("Downloading labs");
    let total = links.len();
    let mut archived = Vec::new();
    let mut failed = Vec::new();

    for (index, url) in links.iter().enumerate() {
        let current = index + 1;
        match archiver.archive_page(current, url).await? {
            PageOutcome::Archived(page) => {
                progress.page_archived(&page, current, total);
                archived.push(page);
            }
            PageOutcome::Failed { url, reason } => {
                progress.page_failed(&url, &reason, current, total);
                failed.push((url, reason));
            }
        }
    }

    if !failed.is_empty() {
        warn!(failed = failed.len(), "some labs could not be downloaded");
    }

    // --- Phase 3: Assemble ---
    progress.phase("Assembling document");
    let paths: Vec<PathBuf> = archived.iter().map(|page| page.path.clone()).collect();
    let assembled = assembler::assemble(&assemble_config(config), &paths)?;
    progress.assembled(&assembled);

    let summary = RunSummary {
        links_found: total,
        archived,
        failed,
        assembled,
        elapsed: start.elapsed(),
    };

    info!(
        links = summary.links_found,
        archived = summary.archived.len(),
        failed = summary.failed.len(),
        fragments = summary.assembled.fragment_count,
        elapsed_ms = summary.elapsed.as_millis(),
        "run complete"
    );

    Ok(summary)
}

/// Rebuild the document from the pages already in the download directory.
#[instrument(skip_all, fields(dir = %config.download_dir.display()))]
pub fn reassemble(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<AssembleResult> {
    progress.phase("Assembling document");
    let pages = assembler::list_archive(&config.download_dir)?;
    info!(pages = pages.len(), "assembling from existing archive");

    let assembled = assembler::assemble(&assemble_config(config), &pages)?;
    progress.assembled(&assembled);
    Ok(assembled)
}

fn assemble_config(config: &RunConfig) -> AssembleConfig {
    AssembleConfig {
        site_origin: config.site_origin.clone(),
        template_path: config.template_path.clone(),
        output_path: config.output_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use labbook_shared::{AppConfig, LabbookError};

    use super::*;

    /// Records every progress event as a line of text.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.push(format!("phase {name}"));
        }
        fn links_found(&self, count: usize) {
            self.push(format!("found {count}"));
        }
        fn page_archived(&self, page: &ArchivedPage, current: usize, total: usize) {
            self.push(format!("archived {} {current}/{total}", page.file_name()));
        }
        fn page_failed(&self, _url: &str, reason: &str, current: usize, total: usize) {
            self.push(format!("failed {reason} {current}/{total}"));
        }
        fn assembled(&self, result: &AssembleResult) {
            self.push(format!("assembled {}", result.fragment_count));
        }
    }

    const TEMPLATE: &str = "<html><body>\n{{ content }}\n</body></html>\n";

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lb-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ResultTemplate.html"), TEMPLATE).unwrap();
        dir
    }

    fn run_config(server: &wiremock::MockServer, root: &Path) -> RunConfig {
        let mut app = AppConfig::default();
        app.site.base_url = server.uri();
        RunConfig::resolve(&app, Some(root)).unwrap()
    }

    async fn mount(server: &wiremock::MockServer, path: &str, template: wiremock::ResponseTemplate) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(template)
            .mount(server)
            .await;
    }

    fn index_page(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|href| format!(r#"<div class="widgetcontainer-lab-link"><a href="{href}">lab</a></div>"#))
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    fn lab_page(title: &str, expert: bool) -> String {
        let label = if expert {
            r#"<span class="label-purple-small">EXPERT</span>"#
        } else {
            r#"<span class="label-light-blue-small">APPRENTICE</span>"#
        };
        format!(
            r#"<html><body><div class="section theme-white"><h1>{title}</h1>{label}<details><summary>Hint</summary></details><a href="/academy">academy</a></div></body></html>"#
        )
    }

    #[tokio::test]
    async fn success_and_404_end_to_end() {
        let server = wiremock::MockServer::start().await;
        mount(
            &server,
            "/web-security/all-labs",
            wiremock::ResponseTemplate::new(200)
                .set_body_string(index_page(&["/labs/lab-one", "/labs/lab-two"])),
        )
        .await;
        mount(
            &server,
            "/labs/lab-one",
            wiremock::ResponseTemplate::new(200).set_body_string(lab_page("Lab one", false)),
        )
        .await;
        mount(&server, "/labs/lab-two", wiremock::ResponseTemplate::new(404)).await;

        let root = temp_root();
        let config = run_config(&server, &root);
        let progress = RecordingProgress::default();
        let summary = run(&config, &progress).await.unwrap();

        assert_eq!(summary.links_found, 2);
        assert_eq!(summary.archived.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].0.ends_with("/labs/lab-two"));

        let files: Vec<_> = std::fs::read_dir(root.join("labs"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["001-lab-one.html"]);

        let document = std::fs::read_to_string(root.join("PortSwiggerAllLabs.html")).unwrap();
        assert_eq!(document.matches(r#"<div class="section theme-white">"#).count(), 1);
        assert_eq!(document.matches("<hr>").count(), 1);
        assert!(document.contains("(001-lab-one)</h1>"));
        assert!(document.contains("<details open>"));
        assert!(document.contains(&format!(r#"href="{}/academy""#, server.uri())));

        assert_eq!(
            progress.events(),
            vec![
                "phase Discovering labs".to_string(),
                "found 2".into(),
                "phase Downloading labs".into(),
                "archived 001-lab-one.html 1/2".into(),
                "failed HTTP 404 Not Found 2/2".into(),
                "phase Assembling document".into(),
                "assembled 1".into(),
            ]
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn numbering_follows_discovery_position() {
        let server = wiremock::MockServer::start().await;
        mount(
            &server,
            "/web-security/all-labs",
            wiremock::ResponseTemplate::new(200).set_body_string(index_page(&[
                "/gone/lab-a",
                "/x/lab-b",
                "/y/lab-b/",
            ])),
        )
        .await;
        mount(&server, "/gone/lab-a", wiremock::ResponseTemplate::new(500)).await;
        mount(
            &server,
            "/x/lab-b",
            wiremock::ResponseTemplate::new(200).set_body_string(lab_page("B one", false)),
        )
        .await;
        mount(
            &server,
            "/y/lab-b/",
            wiremock::ResponseTemplate::new(200).set_body_string(lab_page("B two", false)),
        )
        .await;

        let root = temp_root();
        let config = run_config(&server, &root);
        let summary = run(&config, &SilentProgress).await.unwrap();

        let names: Vec<String> = summary.archived.iter().map(ArchivedPage::file_name).collect();
        assert_eq!(names, vec!["002-lab-b.html", "003-lab-b.html"]);
        assert_eq!(summary.assembled.fragment_count, 2);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn expert_lab_excluded_from_document() {
        let server = wiremock::MockServer::start().await;
        mount(
            &server,
            "/web-security/all-labs",
            wiremock::ResponseTemplate::new(200)
                .set_body_string(index_page(&["/labs/easy", "/labs/hard"])),
        )
        .await;
        mount(
            &server,
            "/labs/easy",
            wiremock::ResponseTemplate::new(200).set_body_string(lab_page("Easy lab", false)),
        )
        .await;
        mount(
            &server,
            "/labs/hard",
            wiremock::ResponseTemplate::new(200).set_body_string(lab_page("Hard lab", true)),
        )
        .await;

        let root = temp_root();
        let config = run_config(&server, &root);
        let summary = run(&config, &SilentProgress).await.unwrap();

        assert_eq!(summary.archived.len(), 2);
        assert_eq!(summary.assembled.fragment_count, 1);
        assert_eq!(summary.assembled.expert_skipped, 1);

        let document = std::fs::read_to_string(&config.output_path).unwrap();
        assert!(document.contains("Easy lab"));
        assert!(!document.contains("Hard lab"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn index_failure_aborts_run() {
        let server = wiremock::MockServer::start().await;
        mount(&server, "/web-security/all-labs", wiremock::ResponseTemplate::new(500)).await;

        let root = temp_root();
        let config = run_config(&server, &root);
        let progress = RecordingProgress::default();
        let err = run(&config, &progress).await.unwrap_err();

        assert!(matches!(err, LabbookError::Network(_)));
        assert!(!config.output_path.exists());
        assert_eq!(progress.events(), vec!["phase Discovering labs".to_string()]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn reassemble_reads_existing_archive() {
        let root = temp_root();
        let labs = root.join("labs");
        std::fs::create_dir_all(&labs).unwrap();
        std::fs::write(labs.join("002-second.html"), lab_page("Second", false)).unwrap();
        std::fs::write(labs.join("001-first.html"), lab_page("First", false)).unwrap();

        let config = RunConfig::resolve(&AppConfig::default(), Some(root.as_path())).unwrap();
        let result = reassemble(&config, &SilentProgress).unwrap();
        assert_eq!(result.page_count, 2);
        assert_eq!(result.fragment_count, 2);

        let document = std::fs::read_to_string(&config.output_path).unwrap();
        let first = document.find("(001-first)").unwrap();
        let second = document.find("(002-second)").unwrap();
        assert!(first < second);
        assert!(document.contains(r#"href="https://portswigger.net/academy""#));

        let _ = std::fs::remove_dir_all(&root);
    }
}
