use clap::Subcommand;
use pomofocus_core::TaskProvider;

use super::{block_on, print_json, Backend, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks, newest first
    List,
    /// Show one task
    Get {
        /// Task ID
        id: String,
    },
    /// Create a task
    Create {
        /// Task name
        name: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a task or change its description
    Update {
        /// Task ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let backend = Backend::open()?;

    match action {
        TaskAction::List => {
            let tasks = block_on(backend.list())??;
            print_json(&tasks)?;
        }
        TaskAction::Get { id } => {
            let task = match &backend {
                Backend::Remote(client) => block_on(client.get_task(&id))??,
                Backend::Local(db) => db
                    .get_task(&id)?
                    .ok_or_else(|| format!("task not found: {id}"))?,
            };
            print_json(&task)?;
        }
        TaskAction::Create { name, description } => {
            if name.trim().is_empty() {
                return Err("task name cannot be empty".into());
            }
            let description = description.as_deref();
            let task = match &backend {
                Backend::Remote(client) => block_on(client.create_task(&name, description))??,
                Backend::Local(db) => db.create_task(&name, description)?,
            };
            print_json(&task)?;
        }
        TaskAction::Update {
            id,
            name,
            description,
        } => {
            let current = match &backend {
                Backend::Remote(client) => block_on(client.get_task(&id))??,
                Backend::Local(db) => db
                    .get_task(&id)?
                    .ok_or_else(|| format!("task not found: {id}"))?,
            };
            let name = name.unwrap_or(current.name);
            let description = match description {
                Some(d) if d.is_empty() => None,
                Some(d) => Some(d),
                None => current.description,
            };
            let task = match &backend {
                Backend::Remote(client) => {
                    block_on(client.update_task(&id, &name, description.as_deref()))??
                }
                Backend::Local(db) => db.update_task(&id, &name, description.as_deref())?,
            };
            print_json(&task)?;
        }
        TaskAction::Delete { id } => {
            match &backend {
                Backend::Remote(client) => block_on(client.delete_task(&id))??,
                Backend::Local(db) => db.delete_task(&id)?,
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
