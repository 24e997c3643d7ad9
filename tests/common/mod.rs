#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
    Set,
};

pub mod comment;
pub mod country;
pub mod post;
pub mod post_meta;
pub mod user;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // Only the first call installs the subscriber.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::connect("sqlite::memory:").await?;

    let schema = Schema::new(DbBackend::Sqlite);
    let tables = [
        schema.create_table_from_entity(country::Entity),
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(post::Entity),
        schema.create_table_from_entity(post_meta::Entity),
        schema.create_table_from_entity(comment::Entity),
    ];
    for table in &tables {
        db.execute(db.get_database_backend().build(table)).await?;
    }

    Ok(db)
}

/// Three users, four posts with metadata and two comments:
///
/// | post   | author       | body                 | version | code   | comment   |
/// |--------|--------------|----------------------|---------|--------|-----------|
/// | aliens | foo jensen   | Nothing is out there | 3       |        |           |
/// | fish   | bar larsen   | nobody               | 2       |        | now       |
/// | boats  | mars jensen  | No one is on them    | 1       |        | now + 5m  |
/// | bat    | mars jensen  | foo                  | 9       | numbat |           |
///
/// bar lives in denmark; the others have no country.
pub async fn setup_blog_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;

    country::ActiveModel {
        name: Set("denmark".to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    for (first_name, last_name, country_id) in [
        ("foo", "jensen", None),
        ("bar", "larsen", Some(1)),
        ("mars", "jensen", None),
    ] {
        user::ActiveModel {
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            email: Set(format!("{first_name}@example.com")),
            country_id: Set(country_id),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }

    for (user_id, title, body, version, code) in [
        (1, "aliens", "Nothing is out there", "3", None),
        (2, "fish", "nobody", "2", None),
        (3, "boats", "No one is on them", "1", None),
        (3, "bat", "foo", "9", Some("numbat")),
    ] {
        let post = post::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        post_meta::ActiveModel {
            post_id: Set(post.id),
            version: Set(version.to_string()),
            code: Set(code.map(ToString::to_string)),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }

    let now = Utc::now();
    for (user_id, post_id, created_at) in [(1, 2, now), (2, 3, now + Duration::minutes(5))] {
        comment::ActiveModel {
            user_id: Set(user_id),
            commentable_id: Set(post_id),
            commentable_type: Set("post".to_string()),
            body: Set("nice".to_string()),
            created_at: Set(Some(created_at)),
            ..Default::default()
        }
        .insert(&db)
        .await?;
    }

    Ok(db)
}

/// Titles of posts in result order.
pub fn titles<'a>(posts: impl IntoIterator<Item = &'a repocrate::Record<post::Model>>) -> Vec<String> {
    posts.into_iter().map(|post| post.title.clone()).collect()
}
