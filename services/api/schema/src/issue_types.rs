use sea_orm::entity::prelude::*;

/// Admin-managed vocabulary of issue categories.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "issue_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "type")]
    pub issue_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
