//! Command dispatch: maps parsed arguments onto the category service

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::services::CategoryService;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Category, CategoryId, CategoryNode, CategoryPatch, ListQuery, NewCategory};
use crate::infrastructure::di::ServiceContainer;

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `catree --help`".to_string(),
        ));
    };

    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(Some(cwd.as_path()))?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    debug!("settings: {:?}", settings);

    match command {
        Commands::Config { command } => return config_command(command, &settings, &cwd),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let container = ServiceContainer::new(settings)?;
    let service = &container.categories;

    match command {
        Commands::Create {
            name,
            description,
            parent,
        } => {
            let parent_id = parent.as_deref().map(|r| resolve(service, r)).transpose()?;
            let mut new = NewCategory {
                name: name.clone(),
                description: None,
                parent_id,
                created_by: container.settings.created_by.clone(),
            };
            if let Some(d) = description {
                new = new.with_description(d.clone());
            }
            let created = service.create(new)?;
            output::action("Created", &format!("{} ({})", created.name, created.id));
        }
        Commands::Update {
            category,
            name,
            description,
            parent,
            root,
            active,
        } => {
            let id = resolve(service, category)?;
            let mut patch = CategoryPatch::default();
            if let Some(n) = name {
                patch = patch.name(n.clone());
            }
            if let Some(d) = description {
                patch = patch.description(d.clone());
            }
            if *root {
                patch = patch.parent(None);
            } else if let Some(p) = parent {
                patch = patch.parent(Some(resolve(service, p)?));
            }
            if let Some(a) = active {
                patch = patch.active(*a);
            }
            if patch.is_empty() {
                return Err(CliError::InvalidArgs("nothing to update".to_string()));
            }
            let updated = service.update(id, patch)?;
            output::action("Updated", &format!("{} ({})", updated.name, updated.id));
        }
        Commands::Delete { category } => {
            let id = resolve(service, category)?;
            let outcome = service.delete(id)?;
            output::action("Deleted", &outcome.removed.name);
            if !outcome.reparented.is_empty() {
                output::detail(&format!(
                    "{} subcategories moved up one level",
                    outcome.reparented.len()
                ));
            }
        }
        Commands::Show { category, json } => {
            let detail = service.detail(resolve(service, category)?)?;
            if *json {
                return print_json(&detail);
            }
            output::header(&detail.path.join(&container.settings.path_separator));
            output::detail(&format!("id:          {}", detail.category.id));
            if let Some(d) = &detail.category.description {
                output::detail(&format!("description: {d}"));
            }
            output::detail(&format!("active:      {}", detail.category.is_active));
            output::detail(&format!("items:       {}", detail.items_count));
            output::detail(&format!("created by:  {}", detail.category.created_by));
            output::detail(&format!("updated:     {}", detail.category.updated_at));
            for sub in &detail.subcategories {
                print_category(sub);
            }
        }
        Commands::List {
            search,
            all,
            page,
            limit,
            json,
        } => {
            let query = ListQuery {
                search: search.clone(),
                include_inactive: *all,
                page: *page,
                limit: limit.unwrap_or(container.settings.page_size),
            };
            let result = service.list(&query)?;
            if *json {
                return print_json(&result);
            }
            for category in &result.categories {
                print_category(category);
            }
            output::info(&format!(
                "page {}/{} ({} total)",
                result.page,
                result.pages.max(1),
                result.total
            ));
        }
        Commands::Roots => {
            for root in service.roots()? {
                output::info(&format!("{} ({})", root.category.name, root.items_count));
            }
        }
        Commands::Top { limit } => {
            let limit = limit.unwrap_or(container.settings.top_limit);
            for (rank, entry) in service.top(limit)?.iter().enumerate() {
                output::info(&format!(
                    "{:>3}. {} ({})",
                    rank + 1,
                    entry.category.name,
                    entry.items_count
                ));
            }
        }
        Commands::Path { category } => {
            output::info(&service.path_display(resolve(service, category)?)?);
        }
        Commands::Tree { parent, json } => {
            let parent_id = parent.as_deref().map(|r| resolve(service, r)).transpose()?;
            let forest = service.tree(parent_id)?;
            if *json {
                return print_json(&forest);
            }
            let label = match parent_id {
                Some(id) => service.get(id)?.name,
                None => "categories".to_string(),
            };
            output::info(&render_forest(label, &forest));
        }
        Commands::Descendants { category } => {
            for descendant in service.descendants(resolve(service, category)?)? {
                print_category(&descendant);
            }
        }
        Commands::Verify => {
            let issues = service.verify()?;
            if issues.is_empty() {
                output::success("hierarchy is consistent");
            } else {
                for issue in &issues {
                    output::warning(issue);
                }
                return Err(CliError::Unhealthy(issues.len()));
            }
        }
        Commands::Config { .. } | Commands::Completion { .. } => {}
    }
    Ok(())
}

/// Resolve a command-line reference: an id, or a name ignoring case.
#[instrument(level = "debug", skip(service))]
fn resolve(service: &CategoryService, reference: &str) -> CliResult<CategoryId> {
    if let Ok(id) = reference.parse::<CategoryId>() {
        return Ok(id);
    }
    service
        .find_by_name(reference)?
        .map(|c| c.id)
        .ok_or_else(|| CliError::UnknownRef(reference.to_string()))
}

fn print_category(category: &Category) {
    let line = format!("{}  {}", category.id, category.name);
    if category.is_active {
        output::detail(&line);
    } else {
        output::inactive(&format!("{line} (inactive)"));
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    output::info(&serde_json::to_string_pretty(value)?);
    Ok(())
}

fn node_label(node: &CategoryNode) -> String {
    format!("{} ({})", node.name, node.items_count)
}

/// Render nested nodes as a termtree without recursion.
pub fn render_forest(label: String, forest: &[CategoryNode]) -> Tree<String> {
    let mut root = Tree::new(label);
    for node in forest {
        root.push(render_node(node));
    }
    root
}

fn render_node(node: &CategoryNode) -> Tree<String> {
    let mut stack: Vec<(&CategoryNode, Vec<Tree<String>>)> = vec![(node, Vec::new())];
    while let Some((current, leaves)) = stack.pop() {
        if leaves.len() < current.children.len() {
            let next = &current.children[leaves.len()];
            stack.push((current, leaves));
            stack.push((next, Vec::new()));
            continue;
        }
        let tree = Tree::new(node_label(current)).with_leaves(leaves);
        match stack.last_mut() {
            Some((_, parent_leaves)) => parent_leaves.push(tree),
            None => return tree,
        }
    }
    Tree::new(node_label(node))
}

fn config_command(command: &ConfigCommands, settings: &Settings, cwd: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Init { global } => {
            let target: PathBuf = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(cwd)
            };
            if target.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            if let Some(dir) = target.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&target, Settings::template())?;
            output::action("Created", &target.display());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::detail(&format!("global: {}", p.display())),
                None => output::detail("global: (unavailable)"),
            }
            output::detail(&format!("local:  {}", local_config_path(cwd).display()));
            output::detail(&format!("store:  {}", settings.store_path.display()));
        }
    }
    Ok(())
}
