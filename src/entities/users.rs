use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Login identifier
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Bearer token (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    /// Declared Telegram username, without the leading `@`.
    pub tg_username: String,

    /// Filled in by the notification sweep once the user has written to the bot.
    #[sea_orm(unique)]
    pub tg_chat_id: Option<i64>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub is_staff: bool,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::habits::Entity")]
    Habits,
}

impl Related<super::habits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Habits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
