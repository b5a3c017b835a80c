//! Fire-and-forget audit trail.
//!
//! Every create/post/void/delete on ledger records emits an audit row with
//! old/new value snapshots, the acting user and a timestamp. A failed
//! audit write is logged and swallowed; it never fails the primary
//! operation.

use chrono::Utc;
use model::entities::audit_log;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use tracing::{debug, warn};

/// Appends an audit record. Errors are logged, never propagated.
pub async fn record_audit<C: ConnectionTrait>(
    conn: &C,
    entity_type: &str,
    entity_id: i32,
    action: &str,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    actor_id: i32,
) {
    debug!(
        "Recording audit: {} {} on {} {}",
        action, entity_id, entity_type, actor_id
    );

    let row = audit_log::ActiveModel {
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id),
        action: Set(action.to_string()),
        old_values: Set(old_values),
        new_values: Set(new_values),
        actor_id: Set(actor_id),
        logged_at: Set(Utc::now()),
        ..Default::default()
    };

    if let Err(err) = row.insert(conn).await {
        warn!(
            "Failed to write audit record for {} {} ({}): {}",
            entity_type, entity_id, action, err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use model::entities::prelude::AuditLog;
    use sea_orm::{Database, EntityTrait};
    use serde_json::json;

    #[tokio::test]
    async fn writes_an_audit_row() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        record_audit(
            &db,
            "account",
            7,
            "create",
            None,
            Some(json!({"code": "1.01", "name": "Cash"})),
            42,
        )
        .await;

        let rows = AuditLog::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity_type, "account");
        assert_eq!(rows[0].entity_id, 7);
        assert_eq!(rows[0].action, "create");
        assert_eq!(rows[0].actor_id, 42);
        assert!(rows[0].old_values.is_none());
    }

    #[tokio::test]
    async fn a_failed_write_does_not_propagate() {
        // No migrations: the audit_logs table does not exist, so the
        // insert fails. The call must still return normally.
        let db = Database::connect("sqlite::memory:").await.unwrap();
        record_audit(&db, "transaction", 1, "post", None, None, 1).await;
    }
}
