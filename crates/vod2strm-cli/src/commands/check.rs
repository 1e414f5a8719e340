use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::path::PathBuf;
use vod_export_core::check_root;
use vod_export_models::Account;
use vod_export_sources::{filter_accounts, parse_patterns, CatalogSource};

pub async fn run_check(accounts: Option<String>, output: &Output) -> Result<()> {
    let (_paths, config, creds) = super::load_setup()?;

    let patterns = match &accounts {
        Some(raw) => parse_patterns(raw),
        None => config.export.accounts.clone(),
    };

    // Roots without an account placeholder are shared; with one, each
    // account gets its own tree and we need the account list to expand it.
    let templated = config.export.movies_dir.contains("{XC_NAME}")
        || config.export.series_dir.contains("{XC_NAME}");
    let selected: Vec<Account> = if templated {
        let client = super::connect(&config, &creds).await?;
        let accounts = client
            .list_accounts()
            .await
            .map_err(|e| eyre!("Failed to list accounts: {}", e))?;
        filter_accounts(accounts, &patterns)
    } else {
        Vec::new()
    };

    let mut roots: Vec<PathBuf> = Vec::new();
    for template in [&config.export.movies_dir, &config.export.series_dir] {
        if template.contains("{XC_NAME}") {
            for account in &selected {
                let name = vod_export_core::sanitize::safe_account_name(&account.display_name());
                roots.push(PathBuf::from(template.replace("{XC_NAME}", &name)));
            }
        } else {
            roots.push(PathBuf::from(template.as_str()));
        }
    }

    let mut total_scanned = 0usize;
    let mut total_issues = 0usize;

    for root in roots {
        if !root.exists() {
            output.warn(format!("Root does not exist, skipping: {}", root.display()));
            continue;
        }

        let report =
            check_root(&root).map_err(|e| eyre!("Check failed under {}: {}", root.display(), e))?;
        total_scanned += report.scanned;
        total_issues += report.issues.len();

        output.info(format!(
            "{}: {} marker(s), {} issue(s)",
            root.display(),
            report.scanned,
            report.issues.len()
        ));
        for (path, problem) in &report.issues {
            output.warn(format!("  {}: {}", path.display(), problem));
        }
        output.json(&json!({
            "root": root.display().to_string(),
            "scanned": report.scanned,
            "issues": report
                .issues
                .iter()
                .map(|(path, problem)| json!({
                    "path": path.display().to_string(),
                    "problem": problem.to_string(),
                }))
                .collect::<Vec<_>>(),
        }));
    }

    if total_issues == 0 {
        output.success(format!("Checked {} marker(s), no issues found", total_scanned));
        Ok(())
    } else {
        output.error(format!(
            "Checked {} marker(s), found {} issue(s)",
            total_scanned, total_issues
        ));
        Err(eyre!("{} issue(s) found", total_issues))
    }
}
