use sea_orm::entity::prelude::*;

/// Append-only audit trail of create/update/delete actions on ledger
/// records. Writes are fire-and-forget: a failed audit insert never fails
/// the primary operation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Entity kind, e.g. "account", "transaction", "payment".
    pub entity_type: String,
    pub entity_id: i32,
    /// Action name, e.g. "create", "post", "void", "delete".
    pub action: String,
    pub old_values: Option<Json>,
    pub new_values: Option<Json>,
    pub actor_id: i32,
    pub logged_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
