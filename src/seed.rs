use crate::{
    error::ApiError,
    models::{Article, Todo, User},
    password,
    store::Store,
};

/// Startup seeding: a known admin, a known regular user, and a handful of
/// open/closed sample rows. Idempotent — skipped entirely once any user
/// exists.
///
/// The fixed passwords are a development convenience; production deployments
/// are expected to start from an already-populated database.
pub async fn seed(store: &dyn Store) -> Result<(), ApiError> {
    if store.count_users().await? > 0 {
        tracing::info!("database already seeded");
        return Ok(());
    }

    tracing::info!("seeding initial users, todos and articles");

    let admin = store
        .insert_user(&User {
            username: "admin".to_string(),
            email: "admin@workboard.local".to_string(),
            password_hash: password::hash_password("admin1234")?,
            is_admin: true,
            ..User::default()
        })
        .await?;

    let user = store
        .insert_user(&User {
            username: "user".to_string(),
            email: "user@workboard.local".to_string(),
            password_hash: password::hash_password("user1234")?,
            is_admin: false,
            ..User::default()
        })
        .await?;

    let todos = [
        Todo {
            title: "OpenAdmin".to_string(),
            description: Some("Example of an open admin todo".to_string()),
            is_closed: false,
            created_by_id: admin.id,
            updated_by_id: admin.id,
            ..Todo::default()
        },
        Todo {
            title: "ClosedAdmin".to_string(),
            description: Some("Example of a closed admin todo".to_string()),
            is_closed: true,
            created_by_id: admin.id,
            updated_by_id: admin.id,
            ..Todo::default()
        },
        Todo {
            title: "OpenUser".to_string(),
            description: Some("Example of an open user todo".to_string()),
            is_closed: false,
            created_by_id: user.id,
            updated_by_id: user.id,
            ..Todo::default()
        },
        Todo {
            title: "ClosedUser".to_string(),
            description: Some("Example of a closed user todo".to_string()),
            is_closed: true,
            created_by_id: user.id,
            updated_by_id: user.id,
            ..Todo::default()
        },
    ];
    for todo in &todos {
        store.insert_todo(todo).await?;
    }

    let articles = [
        Article {
            name: "Apple".to_string(),
            description: "Apple is a fruit".to_string(),
            price: 0.5,
            created_by_id: admin.id,
            updated_by_id: admin.id,
            ..Article::default()
        },
        Article {
            name: "Notebook".to_string(),
            description: "A5 dotted notebook".to_string(),
            price: 7.9,
            created_by_id: user.id,
            updated_by_id: user.id,
            ..Article::default()
        },
    ];
    for article in &articles {
        store.insert_article(article).await?;
    }

    tracing::info!(admin_id = admin.id, user_id = user.id, "seeding complete");
    Ok(())
}
