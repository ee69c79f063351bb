use std::sync::Arc;

use object_store::{path::Path, ObjectStore, PutPayload};
use pager_engine::{FileRow, FileSource, ObjectFileStore, SourceError, SourceSpec};

async fn put(store: &ObjectFileStore, name: &str, body: &str) {
    store
        .object_store()
        .put(&Path::from(name), PutPayload::from(body.to_string()))
        .await
        .unwrap();
}

async fn sample_store() -> ObjectFileStore {
    let store = ObjectFileStore::in_memory();
    put(&store, "tables/article/article1.csv", "id,title\n1,a\n2,b\n").await;
    put(&store, "tables/article/article2.csv", "id,title\n3,c\n").await;
    put(&store, "tables/article/article3.csv", "id,title\n4,d\n").await;
    put(&store, "tables/user/partition=1/user1.jsonl", "{\"id\": 1, \"name\": \"ann\"}\n").await;
    put(&store, "tables/user/partition=0/user2.jsonl", "{\"id\": 2, \"name\": \"bob\"}\n").await;
    put(&store, "other/ignored.csv", "id\n1\n").await;
    store
}

fn source(store: ObjectFileStore, spec: SourceSpec) -> Arc<FileSource> {
    Arc::new(FileSource::from_spec(Arc::new(store), spec).unwrap())
}

#[tokio::test]
async fn lists_tables_under_the_prefix() {
    let source = source(sample_store().await, SourceSpec::default());
    assert_eq!(source.tables().await.unwrap(), vec!["article", "user"]);
}

#[tokio::test]
async fn assigns_partitions_to_files() {
    let spec = SourceSpec {
        partition_count: Some(2),
        ..SourceSpec::default()
    };
    let source = source(sample_store().await, spec);

    let rows: Vec<FileRow> = source
        .list_files("article")
        .await
        .unwrap()
        .iter()
        .map(FileRow::from)
        .collect();
    let parts: Vec<_> = rows.iter().map(|row| (row.file.as_str(), row.partition)).collect();
    assert_eq!(
        parts,
        vec![
            ("tables/article/article1.csv", 0),
            ("tables/article/article2.csv", 1),
            ("tables/article/article3.csv", 0),
        ]
    );
    assert!(rows.iter().all(|row| row.table == "article" && row.size > 0));

    let users = source.list_files("user").await.unwrap();
    let parts: Vec<_> = users.iter().map(|info| info.partition).collect();
    assert_eq!(parts, vec![0, 1]);
}

#[tokio::test]
async fn resolves_table_columns() {
    let source = source(sample_store().await, SourceSpec::default());

    let table = source.resolve_table("article").await.unwrap();
    assert_eq!(table.columns, vec!["id", "title"]);
    assert_eq!(table.files, 3);

    let err = source.resolve_table("nope").await.unwrap_err();
    assert!(matches!(err, SourceError::TableNotFound(name) if name == "nope"));
}

#[tokio::test]
async fn pages_through_an_object_store_table() {
    let source = source(sample_store().await, SourceSpec::default());
    let mut pager = source.pager("user");
    pager.assign_partition(1);

    let mut names = Vec::new();
    while let Some(record) = pager.next_record().await {
        names.push(record.get_str("name").unwrap().to_string());
    }
    assert_eq!(names, vec!["ann"]);
    assert!(pager.last_error().is_none());
}

#[tokio::test]
async fn local_directory_store() {
    let dir = tempfile::tempdir().unwrap();
    let table_dir = dir.path().join("data").join("points");
    std::fs::create_dir_all(&table_dir).unwrap();
    std::fs::write(table_dir.join("p1.csv"), "x,y\n1,2\n3,4\n").unwrap();

    let store = ObjectFileStore::local(dir.path()).unwrap();
    let spec = SourceSpec {
        prefix: "data".to_string(),
        ..SourceSpec::default()
    };
    let source = source(store, spec);

    assert_eq!(source.tables().await.unwrap(), vec!["points"]);
    let mut pager = source.pager("points");
    let mut xs = Vec::new();
    while let Some(record) = pager.next_record().await {
        xs.push(record.get_i64("x").unwrap());
    }
    assert_eq!(xs, vec![1, 3]);
}

#[tokio::test]
async fn files_with_reserved_characters_are_scanned() {
    let store = ObjectFileStore::in_memory();
    put(&store, "tables/t/a#1.csv", "id,name\n1,first\n").await;
    put(&store, "tables/t/b.csv", "id,name\n2,second\n").await;
    let source = source(store, SourceSpec::default());

    let mut pager = source.pager("t");
    let mut names = Vec::new();
    while let Some(record) = pager.next_record().await {
        names.push(record.get_str("name").unwrap().to_string());
    }
    assert_eq!(names, vec!["first", "second"]);
    assert!(pager.last_error().is_none());
}
