mod common;

use common::{post, setup_blog_db, setup_test_db, user};
use repocrate::{Repository, RepositoryError};
use sea_orm::{ActiveValue::Set, EntityTrait, PaginatorTrait};

fn new_user(first_name: &str) -> user::ActiveModel {
    user::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set("hansen".to_string()),
        email: Set(format!("{first_name}@example.com")),
        country_id: Set(None),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create() {
    let db = setup_test_db().await.unwrap();
    let repository = Repository::<user::Entity>::new(db.clone());

    let created = repository.create(new_user("anna")).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.first_name, "anna");

    let found = repository.find(created.id, None).await.unwrap();
    assert_eq!(found.into_model(), created);
}

#[tokio::test]
async fn test_update() {
    let db = setup_test_db().await.unwrap();
    let repository = Repository::<user::Entity>::new(db.clone());
    let created = repository.create(new_user("anna")).await.unwrap();

    let updated = repository
        .update(created, |user: &mut user::ActiveModel| {
            user.last_name = Set("berg".to_string());
        })
        .await
        .unwrap();
    assert_eq!(updated.full_name(), "anna berg");

    let stored = user::Entity::find_by_id(updated.id).one(&db).await.unwrap().unwrap();
    assert_eq!(stored.last_name, "berg");
}

#[tokio::test]
async fn test_destroy() {
    let db = setup_test_db().await.unwrap();
    let repository = Repository::<user::Entity>::new(db.clone());
    let anna = repository.create(new_user("anna")).await.unwrap();
    repository.create(new_user("bo")).await.unwrap();

    repository.destroy(&anna).await.unwrap();
    assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);

    let err = repository.destroy(&anna).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert_eq!(err.to_string(), "users not found");

    let err = repository.find(anna.id, None).await.unwrap_err();
    assert_eq!(err.to_string(), "users with ID '1' not found");
}

#[tokio::test]
async fn test_writes_ignore_the_context() {
    let db = setup_blog_db().await.unwrap();
    let repository = Repository::<post::Entity>::from_values(
        db,
        serde_json::json!({"filters": {"title!": "nothing"}})
            .as_object()
            .cloned()
            .unwrap(),
    );
    let created = repository
        .create(post::ActiveModel {
            user_id: Set(1),
            title: Set("crabs".to_string()),
            body: Set("sideways".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, 5);
    assert!(repository.all(None).await.unwrap().is_empty());
}
