use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    pub price: i64,
    /// Zero means the product is not on sale.
    pub discounted_price: i64,
    pub tags: String,
    /// JSON array of hosted image URLs.
    pub images: Json,
    pub weight_kg: f64,
    pub height_cm: i32,
    pub width_cm: i32,
    pub length_cm: i32,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Price charged right now: the discounted price when set, else the base price.
    pub fn effective_price(&self) -> i64 {
        if self.discounted_price > 0 {
            self.discounted_price
        } else {
            self.price
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_lines::Entity")]
    OrderLines,
}

impl Related<super::order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
