//! CLI command implementations

use crate::output::{format_bytes, format_time, state_icon, truncate};
use crate::progress::DownloadProgress;
use crate::{ConfigAction, OutputFormat};
use anyhow::{anyhow, Result};
use console::style;
use elimu_core::{ElimuCore, LibraryError};
use elimu_types::{LocalFile, Resource, ResourceState, Settings};
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Catalog Commands
// ============================================================================

#[derive(Serialize)]
struct CatalogEntry<'a> {
    #[serde(flatten)]
    resource: &'a Resource,
    state: ResourceState,
}

pub async fn show_catalog(
    core: &ElimuCore,
    grade: Option<u8>,
    subject: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let library = core.library();
    let catalog: Vec<Resource> = core
        .load_catalog()
        .await?
        .into_iter()
        .filter(|r| grade.map_or(true, |g| r.grade == g))
        .filter(|r| {
            subject
                .as_ref()
                .map_or(true, |s| r.subject.eq_ignore_ascii_case(s))
        })
        .collect();

    let mut entries = Vec::with_capacity(catalog.len());
    for resource in &catalog {
        let state = library.state(&resource.id).await?;
        entries.push(CatalogEntry { resource, state });
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct ResourceRow {
                id: String,
                title: String,
                kind: String,
                subject: String,
                grade: u8,
                curriculum: String,
                size: String,
                state: String,
            }

            let rows: Vec<ResourceRow> = entries
                .iter()
                .map(|e| ResourceRow {
                    id: e.resource.id.clone(),
                    title: truncate(&e.resource.title, 30),
                    kind: e.resource.kind.to_string(),
                    subject: e.resource.subject.clone(),
                    grade: e.resource.grade,
                    curriculum: e.resource.curriculum.to_string(),
                    size: format_bytes(e.resource.file_size),
                    state: e.state.to_string(),
                })
                .collect();

            println!("{}", Table::new(rows));
        }
        OutputFormat::Human => {
            if entries.is_empty() {
                println!(
                    "{}",
                    style(format!("No resources in {}", core.catalog_path().display())).dim()
                );
                return Ok(());
            }

            for entry in &entries {
                let r = entry.resource;
                println!(
                    "{} {} {} [{}]",
                    state_icon(entry.state),
                    style(&r.title).bold(),
                    style(format!("{} · {} · grade {} · {}", r.kind, r.subject, r.grade, r.curriculum)).dim(),
                    style(&r.id).dim()
                );
                if r.premium {
                    println!("    {}", style("Premium").yellow());
                }
            }
            println!();
            println!("{} resource(s)", style(entries.len()).bold());
        }
    }

    Ok(())
}

// ============================================================================
// Download Commands
// ============================================================================

pub async fn download_resources(core: &ElimuCore, ids: Vec<String>, format: OutputFormat) -> Result<()> {
    let mut resources = Vec::with_capacity(ids.len());
    for id in &ids {
        resources.push(core.find_resource(id).await?);
    }

    run_downloads(core, resources, format).await
}

pub async fn fetch_url(
    core: &ElimuCore,
    url: &str,
    id: &str,
    title: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let title = title.unwrap_or_else(|| id.to_string());
    let resource = Resource::adhoc(id, title, url);
    run_downloads(core, vec![resource], format).await
}

/// Download resources concurrently, one bar per resource
async fn run_downloads(core: &ElimuCore, resources: Vec<Resource>, format: OutputFormat) -> Result<()> {
    let library = core.library();
    let progress = DownloadProgress::new();
    let mut handles = Vec::with_capacity(resources.len());

    for resource in resources {
        let bar = progress.add(&truncate(&resource.title, 30));
        let library = library.clone();
        handles.push(tokio::spawn(async move {
            let result = library.download(&resource, bar.callback()).await;
            match &result {
                Ok(path) => bar.finish(path),
                Err(e) => bar.fail(&e.to_string()),
            }
            (resource.id, result)
        }));
    }

    let mut failures = 0;
    let mut completed = Vec::new();
    for handle in handles {
        let (id, result) = handle.await?;
        match result {
            Ok(path) => completed.push(serde_json::json!({ "resourceId": id, "localPath": path })),
            Err(e) => {
                failures += 1;
                if let OutputFormat::Json = format {
                    completed.push(serde_json::json!({ "resourceId": id, "error": e.to_string() }));
                } else if e.is_retryable() {
                    eprintln!("{} {}: {} (retry may help)", style("✗").red().bold(), id, e);
                } else {
                    eprintln!("{} {}: {}", style("✗").red().bold(), id, e);
                }
            }
        }
    }

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&completed)?);
    }

    if failures > 0 {
        return Err(anyhow!("{} download(s) failed", failures));
    }
    Ok(())
}

// ============================================================================
// Library Commands
// ============================================================================

pub async fn list_files(core: &ElimuCore, format: OutputFormat) -> Result<()> {
    let library = core.library();
    let files = library.list().await?;
    let missing: Vec<String> = library
        .missing_files()
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct FileRow {
                id: String,
                filename: String,
                downloaded: String,
                on_disk: String,
            }

            let rows: Vec<FileRow> = files
                .iter()
                .map(|f| FileRow {
                    id: f.id.clone(),
                    filename: truncate(&f.filename, 40),
                    downloaded: format_time(f.downloaded_at_utc()),
                    on_disk: if missing.contains(&f.id) { "No" } else { "Yes" }.to_string(),
                })
                .collect();

            println!("{}", Table::new(rows));
        }
        OutputFormat::Human => {
            if files.is_empty() {
                println!("{}", style("No downloaded files").dim());
                return Ok(());
            }

            for file in &files {
                print_file_summary(file, missing.contains(&file.id));
            }
            println!();
            println!("{} file(s) in {}", style(files.len()).bold(), library.storage_dir().display());
        }
    }

    Ok(())
}

fn print_file_summary(file: &LocalFile, is_missing: bool) {
    let icon = if is_missing {
        style("!").yellow()
    } else {
        style("✓").green()
    };

    println!(
        "{} {} {} [{}]",
        icon,
        style(&file.filename).bold(),
        style(format_time(file.downloaded_at_utc())).dim(),
        style(&file.id).dim()
    );
    if is_missing {
        println!("    {}", style("File is missing from disk, download it again").yellow());
    }
}

pub async fn show_status(core: &ElimuCore, id: &str, format: OutputFormat) -> Result<()> {
    let state = core.library().state(id).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "resourceId": id, "state": state }));
        }
        _ => {
            println!("{} {}: {}", state_icon(state), id, state);
        }
    }

    Ok(())
}

pub async fn delete_file(core: &ElimuCore, id: &str, yes: bool, format: OutputFormat) -> Result<()> {
    let library = core.library();

    let Some(file) = library.get(id).await? else {
        match format {
            OutputFormat::Json => println!("{}", delete_report(id, None)),
            _ => println!("{}", style(format!("No local file {}", id)).dim()),
        }
        return Ok(());
    };

    if !yes {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}?", file.filename))
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    library.delete(id).await?;

    match format {
        OutputFormat::Json => println!("{}", delete_report(id, Some(&file))),
        _ => println!("{} Deleted {}", style("✓").green().bold(), file.filename),
    }
    Ok(())
}

fn delete_report(id: &str, deleted: Option<&LocalFile>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "deleted": deleted.is_some(),
        "filename": deleted.map(|f| f.filename.as_str()),
    })
}

pub async fn open_file(core: &ElimuCore, id: &str, format: OutputFormat) -> Result<()> {
    match core.library().open(id).await {
        Ok(path) => {
            match format {
                OutputFormat::Json => println!("{}", open_report(id, &path)),
                _ => println!("{} Opened {}", style("✓").green().bold(), path.display()),
            }
            Ok(())
        }
        Err(LibraryError::FileMissing { id, path }) => Err(anyhow!(
            "{} is gone from disk; run `elimu download {}` to get it again",
            path.display(),
            id
        )),
        Err(e) => Err(e.into()),
    }
}

fn open_report(id: &str, path: &Path) -> serde_json::Value {
    serde_json::json!({ "id": id, "opened": true, "localPath": path })
}

// ============================================================================
// Recommendation Commands
// ============================================================================

pub async fn recommend(
    core: &ElimuCore,
    grade: u8,
    weak: Vec<String>,
    completed: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let catalog = core.load_catalog().await?;
    let recommendations = elimu_core::recommend_now(grade, &weak, &completed, &catalog);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&recommendations)?);
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct RecommendationRow {
                id: String,
                title: String,
                score: u8,
                reason: String,
            }

            let rows: Vec<RecommendationRow> = recommendations
                .iter()
                .map(|rec| RecommendationRow {
                    id: rec.resource_id.clone(),
                    title: catalog
                        .iter()
                        .find(|r| r.id == rec.resource_id)
                        .map(|r| truncate(&r.title, 30))
                        .unwrap_or_default(),
                    score: rec.score,
                    reason: rec.reason.clone(),
                })
                .collect();

            println!("{}", Table::new(rows));
        }
        OutputFormat::Human => {
            if recommendations.is_empty() {
                println!("{}", style("Nothing to recommend for this grade").dim());
                return Ok(());
            }

            for rec in &recommendations {
                let title = catalog
                    .iter()
                    .find(|r| r.id == rec.resource_id)
                    .map(|r| r.title.as_str())
                    .unwrap_or(rec.resource_id.as_str());
                println!(
                    "{} {} {}",
                    style(format!("{:>3}", rec.score)).cyan(),
                    style(title).bold(),
                    style(&rec.reason).dim()
                );
            }
        }
    }

    Ok(())
}

// ============================================================================
// Config Commands
// ============================================================================

pub async fn config_action(
    core: &ElimuCore,
    action: Option<ConfigAction>,
    format: OutputFormat,
) -> Result<()> {
    match action {
        None | Some(ConfigAction::Show) => {
            let settings = core.settings();

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(settings)?);
                }
                _ => {
                    println!("Elimu Configuration:");
                    println!();
                    println!("  Data directory: {}", core.data_dir().display());
                    println!(
                        "  Storage area: {}",
                        settings.storage_dir(core.data_dir()).display()
                    );
                    println!("  Catalog: {}", core.catalog_path().display());
                    println!("  Index backend: {}", settings.store_backend);
                    println!(
                        "  Request timeout: {}",
                        settings
                            .request_timeout_secs
                            .map(|s| format!("{}s", s))
                            .unwrap_or_else(|| "transport default".to_string())
                    );
                    println!("  User agent: {}", settings.user_agent);
                }
            }
        }

        Some(ConfigAction::Get { key }) => {
            let value = core
                .settings()
                .get(&key)
                .ok_or_else(|| anyhow!("Unknown config key: {} (known: {})", key, Settings::KEYS.join(", ")))?;
            println!("{}", value);
        }

        Some(ConfigAction::Set { key, value }) => {
            let mut settings = core.settings().clone();
            settings.set(&key, &value).map_err(|e| anyhow!(e))?;

            core.save_settings(&settings).await?;
            println!("{} Config updated", style("✓").green().bold());
        }

        Some(ConfigAction::Reset) => {
            use dialoguer::Confirm;

            let confirmed = Confirm::new()
                .with_prompt("Reset all settings to defaults?")
                .default(false)
                .interact()?;

            if confirmed {
                core.save_settings(&Settings::default()).await?;
                println!("{} Settings reset to defaults", style("✓").green().bold());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delete_report_json() {
        let file = LocalFile::new("r1", PathBuf::from("/tmp/a.pdf"), "a.pdf".to_string());

        let report = delete_report("r1", Some(&file));
        assert_eq!(report["id"], "r1");
        assert_eq!(report["deleted"], true);
        assert_eq!(report["filename"], "a.pdf");

        let report = delete_report("nope", None);
        assert_eq!(report["deleted"], false);
        assert!(report["filename"].is_null());
    }

    #[test]
    fn open_report_json() {
        let report = open_report("r1", Path::new("/tmp/a.pdf"));
        assert_eq!(report["opened"], true);
        assert_eq!(report["localPath"], "/tmp/a.pdf");
    }
}
