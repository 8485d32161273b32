//! Integration tests for model persistence, associations and the class registry
//!
//! Every test runs against the scripted in-memory executor, so the rendered
//! SQL and bound parameters can be checked statement by statement.

use chrono::{DateTime, Utc};
use rowhaus::prelude::*;
use std::sync::Arc;
use std::thread;

struct Author;
struct Post;

impl Model for Author {
    fn table() -> TableMetadata {
        TableMetadata::new("authors", "id")
            .column("id", FieldSpec::big_integer().auto_increment())
            .column("name", FieldSpec::varchar(120).not_null())
            .column("email", FieldSpec::varchar(255))
            .column("created_at", FieldSpec::timestamp())
            .column("updated_at", FieldSpec::timestamp())
            .stamp_on_insert("created_at")
            .stamp_on_update("updated_at")
    }

    fn associations() -> Vec<AssociationDeclaration> {
        vec![
            AssociationDeclaration::new::<Post>("posts")
                .many()
                .foreign_key("author_id")
                .sort("id ASC")
                .backref(),
            AssociationDeclaration::new::<Post>("drafts")
                .many()
                .lazy()
                .foreign_key("author_id")
                .filter("published", false),
        ]
    }

    fn hooks() -> HookSet {
        HookSet::new().on_insert(|mut row| {
            if let Some(Value::String(email)) = row.get("email") {
                let lowered = email.to_lowercase();
                row.insert("email".to_string(), Value::String(lowered));
            }
            Ok(row)
        })
    }
}

impl Model for Post {
    fn table() -> TableMetadata {
        TableMetadata::new("posts", "id")
    }

    fn associations() -> Vec<AssociationDeclaration> {
        vec![AssociationDeclaration::new::<Author>("author")
            .one()
            .local_key("author_id")
            .foreign_key("id")]
    }

    fn hooks() -> HookSet {
        HookSet::new().on_delete(|| anyhow::bail!("posts are archived, never deleted"))
    }
}

fn row(value: Value) -> RowData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

fn haus(mock: &Arc<MockExecutor>) -> RowHaus {
    RowHaus::with_executors(
        OrmConfig::default(),
        [("default".to_string(), mock.clone() as Arc<dyn QueryExecutor>)],
    )
}

fn fixed_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-06T07:08:09Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Inserts ==========

    #[test]
    fn test_multi_row_insert_returns_count() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_status(ExecutionStatus::affected(2));
        let haus = haus(&mock);

        let inserted = haus
            .model::<Author>()
            .unwrap()
            .insert(vec![
                row(json!({"name": "Ann"})),
                row(json!({"name": "Bob", "email": "bob@example.com"})),
            ])
            .unwrap();

        assert!(matches!(inserted, Inserted::Count(2)));
        assert_eq!(mock.execute_count(), 1);
        let sql = &mock.statements()[0];
        assert!(sql.starts_with("INSERT INTO authors (name, created_at, email) VALUES"));
    }

    #[test]
    fn test_single_insert_hydrates_with_key_and_stamp() {
        let mock = Arc::new(MockExecutor::new().without_returning());
        mock.push_status(ExecutionStatus::inserted(json!(42)));
        let ctx = ModelContext::new(mock.clone()).with_clock(fixed_instant);
        let now = fixed_instant().to_rfc3339();

        let author = ctx
            .model::<Author>()
            .unwrap()
            .insert(row(json!({
                "name": "Ann",
                "email": "ANN@Example.COM",
                "created_at": "1999-01-01T00:00:00Z"
            })))
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(author.get("id"), Some(&json!(42)));
        assert_eq!(author.get("created_at"), Some(&json!(now)));
        assert_eq!(author.get("email"), Some(&json!("ann@example.com")));

        let query = mock.last_query().unwrap();
        assert!(query.params.contains(&json!(now)));
        assert!(!query.params.contains(&json!("1999-01-01T00:00:00Z")));
    }

    // ========== Save ==========

    #[test]
    fn test_save_inserts_then_updates_by_key() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_rows(vec![json!({"id": 7, "name": "Ann"})]);
        mock.push_status(ExecutionStatus::affected(1));
        let haus = haus(&mock);

        let mut author = haus
            .model::<Author>()
            .unwrap()
            .from_array(row(json!({"name": "Ann"})));
        assert_eq!(author.save().unwrap(), 1);
        assert!(mock.statements()[0].starts_with("INSERT INTO authors"));
        assert_eq!(author.primary_key_value(), Some(&json!(7)));

        author.set("name", "Bea");
        assert_eq!(author.save().unwrap(), 1);

        let update = mock.last_query().unwrap();
        assert!(update.sql.starts_with("UPDATE authors SET updated_at = ?, name = ?"));
        assert!(update.sql.ends_with("WHERE id = ?"));
        assert_eq!(update.params[1], json!("Bea"));
        assert_eq!(update.params.last(), Some(&json!(7)));
        assert!(author.dirty_fields().is_empty());
    }

    #[test]
    fn test_save_after_setting_existing_key_updates() {
        let mock = Arc::new(MockExecutor::new());
        let haus = haus(&mock);

        let mut author = haus.model::<Author>().unwrap();
        author.set("id", 3).set("email", "x@example.com");
        author.save().unwrap();

        let statements = mock.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0],
            "UPDATE authors SET updated_at = ?, email = ? WHERE id = ?"
        );
    }

    // ========== Delete ==========

    #[test]
    fn test_unguarded_delete_is_refused() {
        let mock = Arc::new(MockExecutor::new());
        let haus = haus(&mock);

        let err = haus.model::<Author>().unwrap().delete(false).unwrap_err();
        assert!(matches!(err, ActiveRecordError::UnguardedDelete { .. }));
        assert!(mock.statements().is_empty());

        haus.model::<Author>().unwrap().delete(true).unwrap();
        assert_eq!(mock.statements(), vec!["DELETE FROM authors"]);
    }

    #[test]
    fn test_conditional_delete_and_veto() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_status(ExecutionStatus::affected(4));
        let haus = haus(&mock);

        let deleted = haus
            .model::<Author>()
            .unwrap()
            .where_lt("created_at", "2020-01-01T00:00:00Z")
            .delete(false)
            .unwrap();
        assert_eq!(deleted, 4);
        assert_eq!(
            mock.last_query().unwrap().sql,
            "DELETE FROM authors WHERE created_at < ?"
        );

        let mut post = haus.model::<Post>().unwrap().from_array(row(json!({"id": 1})));
        assert!(matches!(post.delete(false), Err(ActiveRecordError::Hook(_))));
        assert_eq!(mock.statements().len(), 1);
    }

    // ========== Associations ==========

    #[test]
    fn test_eager_association_queries_once_until_overridden() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_rows(vec![
            json!({"id": 1, "author_id": 9}),
            json!({"id": 2, "author_id": 9}),
        ]);
        let haus = haus(&mock);
        let mut author = haus
            .model::<Author>()
            .unwrap()
            .from_array(row(json!({"id": 9, "name": "Ann"})));

        assert_eq!(author.related("posts").unwrap().len(), 2);
        assert_eq!(author.related("posts").unwrap().len(), 2);
        assert_eq!(mock.fetch_count(), 1);

        author.association("posts", "title LIKE '%rust%'").unwrap();
        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(
            mock.last_query().unwrap().sql,
            "SELECT * FROM posts WHERE author_id = ? AND (title LIKE '%rust%') ORDER BY id ASC"
        );

        // the override left the cached rows in place
        assert_eq!(author.related("posts").unwrap().len(), 2);
        assert_eq!(mock.fetch_count(), 2);
    }

    #[test]
    fn test_lazy_association_queries_every_time() {
        let mock = Arc::new(MockExecutor::new());
        let haus = haus(&mock);
        let mut author = haus
            .model::<Author>()
            .unwrap()
            .from_array(row(json!({"id": 9})));

        author.related("drafts").unwrap();
        author.related("drafts").unwrap();

        assert_eq!(mock.fetch_count(), 2);
        let query = mock.last_query().unwrap();
        assert_eq!(query.sql, "SELECT * FROM posts WHERE author_id = ? AND (published = ?)");
        assert_eq!(query.params, vec![json!(9), json!(false)]);
    }

    #[test]
    fn test_backref_resolves_author_without_query() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_rows(vec![json!({"id": 1, "author_id": 9})]);
        let haus = haus(&mock);
        let mut author = haus
            .model::<Author>()
            .unwrap()
            .from_array(row(json!({"id": 9, "name": "Ann"})));

        let posts = author.related("posts").unwrap();
        let mut post = posts.many().unwrap().first().unwrap().clone();
        let owner = post.related("author").unwrap();

        assert_eq!(owner.one().unwrap().get("name"), Some(&json!("Ann")));
        assert_eq!(mock.fetch_count(), 1);
    }

    // ========== Registry ==========

    #[test]
    fn test_class_built_once_across_instances() {
        let mock = Arc::new(MockExecutor::new());
        let haus = haus(&mock);

        for _ in 0..50 {
            haus.model::<Author>().unwrap();
        }

        assert_eq!(haus.registry().build_count_for::<Author>(), 1);
        assert!(!haus.registry().is_built::<Post>());
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let mock = Arc::new(MockExecutor::new());
        let haus = haus(&mock);

        thread::scope(|scope| {
            for _ in 0..12 {
                scope.spawn(|| {
                    haus.model::<Post>().unwrap();
                });
            }
        });

        assert_eq!(haus.registry().build_count_for::<Post>(), 1);
    }

    // ========== Missing tables ==========

    #[test]
    fn test_missing_table_created_and_retried_once() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(ExecutorError::with_code(
            "42P01",
            "relation \"authors\" does not exist",
        ));
        mock.push_status(ExecutionStatus::affected(0));
        mock.push_rows(vec![json!({"id": 1})]);
        let haus = haus(&mock);

        let found = haus.model::<Author>().unwrap().where_pk(1).find().unwrap();

        assert_eq!(found.len(), 1);
        let statements = mock.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS authors"));
        assert_eq!(statements[0], statements[2]);
    }

    #[test]
    fn test_other_failures_never_create() {
        let mock = Arc::new(MockExecutor::new());
        mock.push_error(ExecutorError::with_code("42703", "column \"nope\" does not exist"));
        let haus = haus(&mock);

        let err = haus
            .model::<Author>()
            .unwrap()
            .where_("nope", 1)
            .find()
            .unwrap_err();

        assert!(err.is_database_error());
        assert_eq!(mock.statements().len(), 1);
    }
}
