//! `n8n-sync workflows`: workflow sync and management commands.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use n8n_sync::reconcile::find_by_identifier;
use n8n_sync::{FileFormat, Reconciler, RefreshOptions, RunReport, SyncOptions, WorkflowClient, WorkflowRecord};
use std::path::PathBuf;

use super::connect;

#[derive(Subcommand)]
pub enum WorkflowsCommand {
    /// Push local workflow files to n8n
    Sync {
        /// Directory holding the workflow files
        #[arg(short, long)]
        directory: PathBuf,
        /// Print what would change without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Delete remote workflows that no local file tracks
        #[arg(long)]
        prune: bool,
        /// Scan subdirectories too
        #[arg(short, long)]
        recursive: bool,
        /// Activate every pushed workflow
        #[arg(long)]
        activate_all: bool,
        /// Ignore null and empty fields when comparing
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        minimal: bool,
    },

    /// Pull workflows from n8n into local files
    Refresh {
        /// Directory holding the workflow files
        #[arg(short, long)]
        directory: PathBuf,
        /// Print what would change without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Rewrite files at their name-derived path and replace existing files
        #[arg(long)]
        overwrite: bool,
        /// Output format (json or yaml); converts tracked files of the other format
        #[arg(short, long)]
        output: Option<FileFormat>,
        /// Also write workflows no local file tracks yet
        #[arg(long)]
        all: bool,
        /// Pull a single workflow by ID; an untracked one is written to the directory root
        #[arg(long)]
        workflow_id: Option<String>,
        /// Scan subdirectories too
        #[arg(short, long)]
        recursive: bool,
        /// Strip null and empty fields from written files
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        minimal: bool,
    },

    /// List workflows on the n8n instance
    List,

    /// Activate a workflow by ID or name
    Activate { workflow: String },

    /// Deactivate a workflow by ID or name
    Deactivate { workflow: String },
}

pub async fn run(command: WorkflowsCommand, url: Option<String>, api_key: Option<String>) -> Result<()> {
    let client = connect(url, api_key)?;

    match command {
        WorkflowsCommand::Sync {
            directory,
            dry_run,
            prune,
            recursive,
            activate_all,
            minimal,
        } => {
            let options = SyncOptions {
                directory,
                dry_run,
                prune,
                recursive,
                minimal,
                activate_all,
            };
            let report = Reconciler::new(client)
                .sync(&options)
                .await
                .context("sync failed")?;
            summarize(&report);
            Ok(())
        }
        WorkflowsCommand::Refresh {
            directory,
            dry_run,
            overwrite,
            output,
            all,
            workflow_id,
            recursive,
            minimal,
        } => {
            let options = RefreshOptions {
                directory,
                dry_run,
                overwrite,
                recursive,
                minimal,
                output,
                all,
                workflow_id,
            };
            let report = Reconciler::new(client)
                .refresh(&options)
                .await
                .context("refresh failed")?;
            summarize(&report);
            Ok(())
        }
        WorkflowsCommand::List => list(&client).await,
        WorkflowsCommand::Activate { workflow } => set_active(&client, &workflow, true).await,
        WorkflowsCommand::Deactivate { workflow } => set_active(&client, &workflow, false).await,
    }
}

fn summarize(report: &RunReport) {
    if report.has_failures() {
        eprintln!("{} workflow(s) failed; see warnings above", report.failures.len());
    }
}

async fn list<C: WorkflowClient>(client: &C) -> Result<()> {
    let workflows = client.list_workflows().await.context("failed to list workflows")?;
    if workflows.is_empty() {
        println!("No workflows found in n8n instance");
        return Ok(());
    }
    print!("{}", render_table(&workflows));
    Ok(())
}

/// Aligned `ID  NAME  ACTIVE` table
fn render_table(workflows: &[WorkflowRecord]) -> String {
    let id_width = workflows
        .iter()
        .map(|w| w.id().unwrap_or("-").len())
        .chain(std::iter::once("ID".len()))
        .max()
        .unwrap_or(2);
    let name_width = workflows
        .iter()
        .map(|w| w.name.chars().count())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);

    let mut table = format!("{:<id_width$}  {:<name_width$}  ACTIVE\n", "ID", "NAME");
    for workflow in workflows {
        table.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {}\n",
            workflow.id().unwrap_or("-"),
            workflow.name,
            if workflow.is_active() { "yes" } else { "no" },
        ));
    }
    table
}

async fn set_active<C: WorkflowClient>(client: &C, identifier: &str, active: bool) -> Result<()> {
    let workflow = find_by_identifier(client, identifier)
        .await
        .with_context(|| format!("failed to resolve workflow '{}'", identifier))?;
    let Some(id) = workflow.id() else {
        bail!("workflow '{}' has no ID", workflow.name);
    };

    if active {
        client.activate_workflow(id).await?;
        println!("Activated workflow '{}' (ID: {})", workflow.name, id);
    } else {
        client.deactivate_workflow(id).await?;
        println!("Deactivated workflow '{}' (ID: {})", workflow.name, id);
    }
    Ok(())
}
