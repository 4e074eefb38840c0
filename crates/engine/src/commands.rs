//! Stateless commands: everything that answers in one round trip.

use std::path::Path;

use armory_shared::Reply;

use crate::errors::HandlerError;
use crate::infrastructure::ports::CatalogStore;
use crate::render;

/// Lines of the log file returned by the `log` command.
const LOG_EXCERPT_LINES: usize = 30;

/// Greeting plus entry menu, for `/start` and home navigation.
pub fn greeting(is_admin: bool) -> Vec<Reply> {
    let body = if is_admin {
        "Welcome back to Armory.".to_string()
    } else {
        concat!(
            "Welcome to Armory!\n\n",
            "Here you can:\n",
            " - browse Warzone weapon builds\n",
            " - filter by type and module count\n",
            " - page through matches with photo and author\n\n",
            "Press \"Warzone builds\" to start.\n\n",
            "Adding builds is restricted to administrators.",
        )
        .to_string()
    };
    vec![Reply::text_with_keyboard(body, render::main_menu(is_admin))]
}

pub fn help() -> Vec<Reply> {
    vec![Reply::text(
        "Questions, problems or ideas? Message the maintainers - \
         the bot is updated regularly.",
    )]
}

/// Plain-text listing of every record.
pub async fn show_all(catalog: &dyn CatalogStore) -> Result<Vec<Reply>, HandlerError> {
    let builds = catalog.load().await?;
    if builds.is_empty() {
        return Ok(vec![Reply::text("The build list is empty.")]);
    }

    let mut lines = vec!["Warzone builds:".to_string()];
    for (idx, build) in builds.iter().enumerate() {
        lines.push(render::build_summary(idx + 1, build));
    }
    Ok(vec![Reply::text_with_keyboard(
        lines.join("\n\n"),
        render::with_home(Default::default()),
    )])
}

/// Aggregate counts plus a summary of the most recent record.
pub async fn status(catalog: &dyn CatalogStore) -> Result<Vec<Reply>, HandlerError> {
    let builds = catalog.load().await?;
    let mut body = format!("Total builds: {}\n", builds.len());
    match builds.last() {
        Some(last) => {
            body.push_str(&format!(
                "\nLatest build:\n├ Weapon: {}\n├ Type: {}\n├ Modules: {}\n└ Author: {}",
                last.weapon_name,
                last.weapon_type,
                last.module_count(),
                last.author,
            ));
        }
        None => body.push_str("\nNo builds recorded."),
    }
    Ok(vec![Reply::text(body)])
}

/// Last lines of the operational log file, if one is configured.
pub async fn log_excerpt(log_file: Option<&Path>) -> Vec<Reply> {
    let Some(path) = log_file else {
        return vec![Reply::text("Logs are unavailable: no log file configured.")];
    };
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(LOG_EXCERPT_LINES);
            let excerpt = lines[start..].join("\n");
            if excerpt.is_empty() {
                vec![Reply::text("The log is empty.")]
            } else {
                vec![Reply::text(format!(
                    "Last {} log lines:\n\n{excerpt}",
                    lines.len() - start
                ))]
            }
        }
        Err(e) => {
            tracing::warn!("Failed to read log file {}: {e}", path.display());
            vec![Reply::text("Logs are unavailable.")]
        }
    }
}

/// Run the configured deployment-refresh command and report its output.
/// The caller follows up by writing the restart marker and shutting down.
pub async fn run_update(update_cmd: Option<&str>) -> Vec<Reply> {
    let Some(cmd) = update_cmd else {
        return vec![Reply::text(
            "No update command configured; restarting as-is.",
        )];
    };

    match tokio::process::Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .output()
        .await
    {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            let text = text.trim();
            let body = if text.is_empty() {
                "Update finished with no output.".to_string()
            } else {
                format!("Update finished:\n\n{text}")
            };
            vec![Reply::text(body)]
        }
        Err(e) => {
            tracing::error!("Update command failed to run: {e}");
            vec![Reply::text("Update failed to run; restarting as-is.")]
        }
    }
}
