use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use storefront_api::{
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let admin_email =
        std::env::var("ADMIN_EMAIL1").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_id = ensure_user(&orm, &admin_email, "Admin", "admin123", "admin").await?;
    let user_id = ensure_user(&orm, "user@example.com", "Shopper", "user123", "user").await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present (role={})", existing.role);
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        password_hash: Set(password_hash),
        image: Set(None),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let products = [
        ("Linen Tote Bag", "Roomy everyday tote", 8990_i64, 0_i64, "bags,linen"),
        ("Ceramic Mug", "Hand glazed, 350 ml", 4590, 3990, "kitchen,ceramic"),
        ("Wool Beanie", "Ribbed merino knit", 6990, 0, "winter,accessories"),
        ("Scented Candle", "Cedar and vanilla", 5490, 4490, "home,candles"),
    ];

    for (name, description, price, discounted_price, tags) in products {
        let exists = Products::find()
            .filter(ProductCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            price: Set(price),
            discounted_price: Set(discounted_price),
            tags: Set(tags.to_string()),
            images: Set(serde_json::json!([])),
            weight_kg: Set(0.3),
            height_cm: Set(10),
            width_cm: Set(10),
            length_cm: Set(10),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
