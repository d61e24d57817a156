//! Administrative commands: connection test, install, upgrade.

use super::{CommandResult, StoreArgs};
use log::info;
use wiki_core::{SqliteWikiRepository, WikiRepository};

/// Execute connection test
pub fn test(store: &StoreArgs) -> CommandResult {
    let settings = store.resolve()?;
    let repo = SqliteWikiRepository::start(settings.clone())?;
    repo.test(settings.data_store_type, &settings.connection_string)?;
    println!(
        "✓ Connection ok ({}, {})",
        settings.data_store_type, settings.connection_string
    );
    Ok(())
}

/// Execute install
pub fn install(store: &StoreArgs) -> CommandResult {
    let settings = store.resolve()?;
    let repo = SqliteWikiRepository::start(settings.clone())?;
    repo.install(settings.data_store_type, &settings.connection_string)?;
    info!("event=cli_install module=cli status=ok");
    println!("✓ Installed schema at {}", settings.connection_string);
    Ok(())
}

/// Execute upgrade
pub fn upgrade(store: &StoreArgs) -> CommandResult {
    let settings = store.resolve()?;
    let mut repo = SqliteWikiRepository::start(settings.clone())?;
    repo.upgrade(&settings)?;
    repo.dispose()?;
    info!("event=cli_upgrade module=cli status=ok");
    println!("✓ Upgraded to {}", wiki_core::core_version());
    Ok(())
}
