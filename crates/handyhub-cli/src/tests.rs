use super::*;

#[test]
fn parses_list_command_without_filter() {
    let cli = Cli::try_parse_from(["handyhub-cli", "list"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::List {
            status: None,
            search: None
        })
    ));
}

#[test]
fn parses_list_command_with_status() {
    let cli = Cli::try_parse_from(["handyhub-cli", "list", "--status", "in_progress"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::List {
            status: Some(RequestStatus::InProgress),
            ..
        })
    ));
}

#[test]
fn rejects_unknown_status() {
    assert!(Cli::try_parse_from(["handyhub-cli", "list", "--status", "archived"]).is_err());
}

#[test]
fn parses_set_status_command() {
    let cli = Cli::try_parse_from(["handyhub-cli", "set-status", "12", "accepted"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::SetStatus {
            ref id,
            status: RequestStatus::Accepted
        }) if id == "12"
    ));
}

#[test]
fn parses_migrate_and_catalog_commands() {
    let migrate = Cli::try_parse_from(["handyhub-cli", "migrate"]).expect("migrate");
    assert!(matches!(migrate.command, Some(Commands::Migrate)));

    let catalog = Cli::try_parse_from(["handyhub-cli", "catalog"]).expect("catalog");
    assert!(matches!(catalog.command, Some(Commands::Catalog)));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["handyhub-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn builtin_catalog_is_used_without_path() {
    let catalog = catalog::resolve_catalog(None).expect("builtin");
    assert_eq!(catalog.service_count(), 21);
}

#[test]
fn memory_backend_is_refused_for_store_commands() {
    let err = ensure_shared_backend(StoreBackend::Memory).unwrap_err();
    assert!(err.to_string().contains("HANDYHUB_STORE is memory"));

    assert!(ensure_shared_backend(StoreBackend::JsonFile).is_ok());
    assert!(ensure_shared_backend(StoreBackend::Postgres).is_ok());
}
