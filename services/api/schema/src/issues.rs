use sea_orm::entity::prelude::*;

/// Location-tagged report filed by a user.
///
/// `user_id` and `type` are plain references; neither has a foreign key so
/// issues survive deletion of their author or category.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_name = "type")]
    pub issue_type: String,
    pub short_desc: String,
    #[sea_orm(column_type = "Text")]
    pub full_desc: String,
    pub status: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::photos::Entity")]
    Photos,
}

impl Related<super::photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
