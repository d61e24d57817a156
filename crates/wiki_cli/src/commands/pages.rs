//! Page commands
//!
//! Usage: wiki pages <list|show|add|delete> ...

use super::{CommandResult, StoreArgs};
use clap::{Args, Subcommand};
use wiki_core::{PageService, PageView, SqliteWikiRepository, WikiRepository};

#[derive(Debug, Args)]
pub struct PagesArgs {
    #[command(subcommand)]
    pub command: PagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PagesCommand {
    /// List all pages
    List {
        /// Only pages whose tags contain this text
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show one page with its latest content
    Show { id: i64 },
    /// Create a page
    Add(AddArgs),
    /// Delete a page and all of its versions
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    /// Comma or semicolon separated tags
    #[arg(long, default_value = "")]
    pub tags: String,

    #[arg(long, default_value = "")]
    pub text: String,

    #[arg(long, default_value = "admin")]
    pub editor: String,
}

/// Execute pages command
pub fn execute(store: &StoreArgs, args: PagesArgs) -> CommandResult {
    let settings = store.resolve()?;
    let mut service = PageService::new(SqliteWikiRepository::start(settings)?);

    match args.command {
        PagesCommand::List { tag } => {
            let pages = match tag {
                Some(tag) => service.find_by_tag(&tag)?,
                None => service.all_pages()?,
            };
            for page in pages {
                println!("{}\t{}\t{}", page.id, page.title, page.raw_tags);
            }
        }
        PagesCommand::Show { id } => match service.get_by_id(id, true)? {
            Some(page) => {
                println!("# {} (v{})", page.title, page.version_number);
                println!("tags: {}", page.raw_tags);
                println!();
                println!("{}", page.content);
            }
            None => return Err(format!("page {id} not found").into()),
        },
        PagesCommand::Add(add) => {
            let model = PageView {
                title: add.title,
                raw_tags: add.tags,
                content: add.text,
                ..PageView::default()
            };
            let page = service.add_page(&model, &add.editor)?;
            println!("✓ Created page {} ({})", page.id, page.title);
        }
        PagesCommand::Delete { id } => {
            service.delete_page(id)?;
            println!("✓ Deleted page {id}");
        }
    }

    service.into_repository().dispose()?;
    Ok(())
}

/// Execute tags command
pub fn tags(store: &StoreArgs) -> CommandResult {
    let settings = store.resolve()?;
    let service = PageService::new(SqliteWikiRepository::start(settings)?);
    for tag in service.all_tags()? {
        println!("{tag}");
    }
    Ok(())
}
