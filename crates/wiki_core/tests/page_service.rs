use wiki_core::service::page_service::parse_tags;
use wiki_core::{
    ApplicationSettings, DataStoreType, PageService, PageServiceError, PageView,
    SqliteWikiRepository, WikiRepository,
};

fn service() -> PageService<SqliteWikiRepository> {
    let repo = SqliteWikiRepository::start(ApplicationSettings::new(
        DataStoreType::Sqlite,
        ":memory:",
    ))
    .unwrap();
    repo.install(DataStoreType::Sqlite, ":memory:").unwrap();
    PageService::new(repo)
}

fn model(title: &str, tags: &str, content: &str) -> PageView {
    PageView {
        title: title.to_string(),
        raw_tags: tags.to_string(),
        content: content.to_string(),
        ..PageView::default()
    }
}

#[test]
fn add_page_normalizes_tags_and_returns_first_version() {
    let mut service = service();

    let created = service
        .add_page(&model("  Hello world ", "tag1;tag2, TAG1", "Hi"), "admin")
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.title, "Hello world");
    assert_eq!(created.raw_tags, "tag1, tag2");
    assert_eq!(created.content, "Hi");
    assert_eq!(created.version_number, 1);
    assert_eq!(created.created_by, "admin");
    assert_eq!(created.tags(), vec!["tag1".to_string(), "tag2".to_string()]);
}

#[test]
fn add_page_rejects_blank_title() {
    let mut service = service();

    let err = service.add_page(&model("   ", "", "text"), "admin").unwrap_err();

    assert!(matches!(err, PageServiceError::InvalidTitle));
    assert!(service.all_pages().unwrap().is_empty());
}

#[test]
fn get_by_id_loads_content_on_request() {
    let mut service = service();
    let created = service
        .add_page(&model("Page", "", "Body"), "admin")
        .unwrap();

    let bare = service.get_by_id(created.id, false).unwrap().unwrap();
    assert!(bare.content.is_empty());
    assert_eq!(bare.version_number, 0);

    let full = service.get_by_id(created.id, true).unwrap().unwrap();
    assert_eq!(full.content, "Body");

    assert!(service.get_by_id(99, true).unwrap().is_none());
}

#[test]
fn update_page_appends_a_new_version() {
    let mut service = service();
    let created = service
        .add_page(&model("Draft", "a", "first"), "alice")
        .unwrap();

    let edit = PageView {
        title: "Final".to_string(),
        raw_tags: "b, c".to_string(),
        content: "second".to_string(),
        ..created.clone()
    };
    let updated = service.update_page(&edit, "bob").unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.content, "second");
    assert_eq!(updated.version_number, 2);
    assert_eq!(updated.created_by, "alice");
    assert_eq!(updated.modified_by, "bob");

    let versions = service
        .repository()
        .find_page_contents_by_page_id(created.id)
        .unwrap();
    assert_eq!(versions.len(), 2);
    let first = service
        .repository()
        .get_page_content_by_page_id_and_version_number(created.id, 1)
        .unwrap()
        .unwrap();
    assert_eq!(first.text, "first");
}

#[test]
fn update_page_refuses_version_overflow_without_writing() {
    let mut service = service();
    let created = service
        .add_page(&model("Busy", "a", "first"), "alice")
        .unwrap();
    let stored = service
        .repository()
        .get_page_by_id(created.id)
        .unwrap()
        .unwrap();
    let mut repo = service.into_repository();
    repo.add_new_page_content_version(&stored, "last", "alice", i64::MAX, i32::MAX)
        .unwrap()
        .unwrap();
    let mut service = PageService::new(repo);

    let edit = PageView {
        title: "Renamed".to_string(),
        content: "overflow".to_string(),
        ..created.clone()
    };
    let err = service.update_page(&edit, "bob").unwrap_err();

    assert!(matches!(err, PageServiceError::VersionOverflow(id) if id == created.id));
    let after = service.get_by_id(created.id, true).unwrap().unwrap();
    assert_eq!(after.title, "Busy");
    assert_eq!(after.content, "last");
    assert_eq!(
        service
            .repository()
            .find_page_contents_by_page_id(created.id)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn update_page_reports_missing_page() {
    let mut service = service();
    let missing = PageView {
        id: 99,
        ..model("Ghost", "", "text")
    };

    let err = service.update_page(&missing, "admin").unwrap_err();

    assert!(matches!(err, PageServiceError::PageNotFound(99)));
}

#[test]
fn delete_page_removes_page_and_versions() {
    let mut service = service();
    let created = service.add_page(&model("Gone", "", "v1"), "admin").unwrap();
    service.update_page(&created, "admin").unwrap();

    service.delete_page(created.id).unwrap();

    assert!(service.get_by_id(created.id, true).unwrap().is_none());
    assert!(service.repository().all_page_contents().unwrap().is_empty());
}

#[test]
fn tag_views_cover_search_and_distinct_listing() {
    let mut service = service();
    service
        .add_page(&model("One", "Rust, wiki", "1"), "admin")
        .unwrap();
    service.add_page(&model("Two", "wiki", "2"), "admin").unwrap();

    let found = service.find_by_tag("WIKI").unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(service.find_by_tag("rust").unwrap().len(), 1);
    assert!(service.find_by_tag("  ").unwrap().is_empty());

    assert_eq!(
        service.all_tags().unwrap(),
        vec!["rust".to_string(), "wiki".to_string()]
    );
}

#[test]
fn parse_tags_handles_mixed_separators() {
    assert_eq!(
        parse_tags("a;b,,c ; a"),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}
