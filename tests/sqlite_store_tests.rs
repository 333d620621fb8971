use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use docmapper::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct User {
    username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Comment {
    content: String,
    author: User,
    updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Post {
    title: String,
    author: User,
    tags: Vec<String>,
    comments: Vec<Comment>,
    favorite_count: i64,
    is_published: bool,
    updated: DateTime<Utc>,
}

impl Document for Post {
    fn table_name() -> &'static str {
        "Posts"
    }

    fn schema() -> docmapper::Result<Schema> {
        Schema::builder("Post")
            .object(
                ObjectType::new("Post")
                    .field("Title", FieldType::string())
                    .field("Author", FieldType::object("User"))
                    .field("Tags", FieldType::array(FieldType::string()))
                    .field("Comments", FieldType::array(FieldType::object("Comment")))
                    .field("FavoriteCount", FieldType::int())
                    .field("IsPublished", FieldType::bool())
                    .field("Updated", FieldType::datetime()),
            )
            .object(
                ObjectType::new("Comment")
                    .field("Content", FieldType::string())
                    .field("Author", FieldType::object("User"))
                    .field("Updated", FieldType::datetime()),
            )
            .object(ObjectType::new("User").field("Username", FieldType::string()))
            .build()
    }
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
}

fn user(name: &str) -> User {
    User {
        username: name.to_string(),
    }
}

fn post(title: &str, author: &str, tags: &[&str], comments: Vec<Comment>, favorites: i64, published: bool, updated: u32) -> Post {
    Post {
        title: title.to_string(),
        author: user(author),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        comments,
        favorite_count: favorites,
        is_published: published,
        updated: day(updated),
    }
}

fn comment(content: &str, author: &str, updated: u32) -> Comment {
    Comment {
        content: content.to_string(),
        author: user(author),
        updated: day(updated),
    }
}

async fn seeded() -> Result<Collection<Post>> {
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory()?);
    let posts = Collection::<Post>::open(store).await?;

    posts
        .insert(&post("p1", "alice", &["tag1", "tag2"], vec![comment("first", "admin", 3)], 2, true, 1))
        .await?;
    posts
        .insert(&post("p2", "bob", &["tag2"], vec![comment("second", "user", 5)], 0, false, 2))
        .await?;
    posts
        .insert(&post("p3", "alice", &[], vec![], 5, true, 4))
        .await?;

    Ok(posts)
}

fn titles(found: &[Stored<Post>]) -> Vec<&str> {
    found.iter().map(|s| s.document.title.as_str()).collect()
}

#[tokio::test]
async fn test_array_predicate_selects_matching_document() -> Result<()> {
    let posts = seeded().await?;

    let query = Query::eq("Comments.Author.Username", "admin")?;
    let found = posts.find(Some(&query), &Sorting::new(), Page::all()).await?;

    assert_eq!(titles(&found), vec!["p1"]);
    assert_eq!(found[0].document.comments[0].author.username, "admin");
    Ok(())
}

#[tokio::test]
async fn test_contains_and_not_contains() -> Result<()> {
    let posts = seeded().await?;
    let by_title = Sorting::by("Title")?;

    let tagged = posts
        .find(Some(&Query::contains("Tags", "tag1")?), &by_title, Page::all())
        .await?;
    assert_eq!(titles(&tagged), vec!["p1"]);

    let untagged = posts
        .find(Some(&Query::not_contains("Tags", "tag1")?), &by_title, Page::all())
        .await?;
    assert_eq!(titles(&untagged), vec!["p2", "p3"]);
    Ok(())
}

#[tokio::test]
async fn test_sort_through_array() -> Result<()> {
    let posts = seeded().await?;

    // documents without comments have no row to sort by and drop out
    let found = posts
        .find(None, &Sorting::by_descending("Comments.Updated")?, Page::all())
        .await?;
    assert_eq!(titles(&found), vec!["p2", "p1"]);
    Ok(())
}

#[tokio::test]
async fn test_typed_comparisons() -> Result<()> {
    let posts = seeded().await?;
    let by_title = Sorting::by("Title")?;

    let published = posts
        .find(Some(&Query::eq("IsPublished", true)?), &by_title, Page::all())
        .await?;
    assert_eq!(titles(&published), vec!["p1", "p3"]);

    let since = QueryBuilder::new()
        .bind("since", day(2))
        .build("p => p.Updated >= :since")?;
    let recent = posts.find(Some(&since), &by_title, Page::all()).await?;
    assert_eq!(titles(&recent), vec!["p2", "p3"]);

    let popular = posts
        .find_where("p => p.FavoriteCount > 1 && p.Author.Username == 'alice'", &by_title, Page::all())
        .await?;
    assert_eq!(titles(&popular), vec!["p1", "p3"]);
    Ok(())
}

#[tokio::test]
async fn test_count() -> Result<()> {
    let posts = seeded().await?;

    assert_eq!(posts.count(None).await?, 3);
    assert_eq!(
        posts
            .count(Some(&Query::eq("Comments.Author.Username", "admin")?))
            .await?,
        1
    );
    assert_eq!(posts.count_where("p => p.FavoriteCount > 0").await?, 2);
    assert_eq!(posts.count_where("p => p.Comments[0].Content != null").await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_paging_and_find_first() -> Result<()> {
    let posts = seeded().await?;

    let second = posts
        .find(None, &Sorting::by("Title")?, Page::new(1, 1))
        .await?;
    assert_eq!(titles(&second), vec!["p2"]);

    let rest = posts
        .find(None, &Sorting::by("Title")?, Page::all().skip(1))
        .await?;
    assert_eq!(titles(&rest), vec!["p2", "p3"]);

    let top = posts
        .find_first(None, &Sorting::by_descending("FavoriteCount")?)
        .await?
        .expect("collection is not empty");
    assert_eq!(top.document.title, "p3");

    let none = posts
        .find_first(Some(&Query::eq("Title", "missing")?), &Sorting::new())
        .await?;
    assert!(none.is_none());
    Ok(())
}

#[tokio::test]
async fn test_find_all_defaults_to_id_order() -> Result<()> {
    let posts = seeded().await?;

    let all = posts.find_all().await?;
    assert_eq!(all.len(), 3);

    let ids: Vec<String> = all.iter().map(|s| s.id.to_string()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    Ok(())
}

#[tokio::test]
async fn test_get_update_delete() -> Result<()> {
    let posts = seeded().await?;
    let mut draft = post("draft", "carol", &["wip"], vec![], 0, false, 9);
    let id = posts.insert(&draft).await?;

    assert_eq!(posts.get(id).await?, Some(draft.clone()));

    draft.is_published = true;
    assert!(posts.update(id, &draft).await?);
    let by_id = Query::eq("_id", id)?;
    let found = posts.find(Some(&by_id), &Sorting::new(), Page::all()).await?;
    assert_eq!(found.len(), 1);
    assert!(found[0].document.is_published);

    assert!(posts.delete(id).await?);
    assert_eq!(posts.get(id).await?, None);
    assert!(!posts.update(id, &draft).await?);
    Ok(())
}

#[tokio::test]
async fn test_compile_errors_surface_before_storage() -> Result<()> {
    let posts = seeded().await?;

    let result = posts
        .find(Some(&Query::eq("Comments.Missing", "x")?), &Sorting::new(), Page::all())
        .await;
    assert!(matches!(result, Err(MapperError::PathNotFound { .. })));

    let result = posts.count_where("p => p.Title LIKE 'a%'").await;
    assert!(matches!(result, Err(MapperError::UnsupportedExpressionShape(_))));
    Ok(())
}

#[tokio::test]
async fn test_file_backed_store_persists() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("posts.db");

    {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(StoreConfig::file(&path))?);
        let posts = Collection::<Post>::open(store).await?;
        posts.insert(&post("kept", "dave", &[], vec![], 1, true, 7)).await?;
    }

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(StoreConfig::file(&path))?);
    let posts = Collection::<Post>::open(store).await?;
    let all = posts.find_all().await?;
    assert_eq!(titles(&all), vec!["kept"]);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Event {
    name: String,
    dates: Vec<DateTime<Utc>>,
    scores: Vec<i64>,
}

impl Document for Event {
    fn table_name() -> &'static str {
        "Events"
    }

    fn schema() -> docmapper::Result<Schema> {
        Schema::builder("Event")
            .object(
                ObjectType::new("Event")
                    .field("Name", FieldType::string())
                    .field("Dates", FieldType::array(FieldType::datetime()))
                    .field("Scores", FieldType::array(FieldType::int())),
            )
            .build()
    }
}

#[tokio::test]
async fn test_contains_on_typed_value_arrays() -> Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory()?);
    let events = Collection::<Event>::open(store).await?;
    events
        .insert(&Event {
            name: "launch".to_string(),
            dates: vec![Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap()],
            scores: vec![3, 7],
        })
        .await?;

    let on_day = Query::contains("Dates", "2024-01-02T10:30:00Z")?;
    assert_eq!(events.count(Some(&on_day)).await?, 1);

    let bound = Query::contains("Dates", Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap())?;
    assert_eq!(events.count(Some(&bound)).await?, 1);

    let other_day = Query::not_contains("Dates", "2024-01-02T10:30:00Z")?;
    assert_eq!(events.count(Some(&other_day)).await?, 0);

    assert_eq!(events.count(Some(&Query::contains("Scores", 7)?)).await?, 1);
    assert_eq!(events.count(Some(&Query::not_contains("Scores", 3)?)).await?, 0);
    assert_eq!(events.count(Some(&Query::not_contains("Scores", 4)?)).await?, 1);
    Ok(())
}
