//! Argument parsing

use clap::{CommandFactory, Parser};

use catree::cli::args::{Cli, Commands, ConfigCommands};

#[test]
fn given_cli_definition_when_asserted_then_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn given_update_with_root_flag_when_parsing_then_root_set() {
    let cli = Cli::try_parse_from(["catree", "-vv", "update", "Laptops", "--root", "--active", "false"])
        .unwrap();

    assert_eq!(cli.verbose, 2);
    match cli.command {
        Some(Commands::Update {
            category,
            root,
            active,
            parent,
            ..
        }) => {
            assert_eq!(category, "Laptops");
            assert!(root);
            assert_eq!(active, Some(false));
            assert!(parent.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn given_parent_and_root_when_parsing_then_conflict() {
    let result = Cli::try_parse_from(["catree", "update", "A", "--root", "--parent", "B"]);
    assert!(result.is_err());
}

#[test]
fn given_config_init_global_when_parsing_then_flag_set() {
    let cli = Cli::try_parse_from(["catree", "config", "init", "--global"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommands::Init { global: true }
        })
    ));
}

#[test]
fn given_list_without_page_when_parsing_then_first_page() {
    let cli = Cli::try_parse_from(["catree", "list", "-a", "-s", "lap"]).unwrap();
    match cli.command {
        Some(Commands::List {
            page, all, search, limit, ..
        }) => {
            assert_eq!(page, 1);
            assert!(all);
            assert_eq!(search.as_deref(), Some("lap"));
            assert!(limit.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
