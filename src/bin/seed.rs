use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use freshcart_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@freshcart.test", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "shopper@freshcart.test", "shopper123", "user").await?;
    seed_catalog(&pool).await?;
    seed_banners(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, full_name)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = [
        ("Fruits & Vegetables", "Fresh produce delivered daily"),
        ("Dairy & Eggs", "Milk, cheese, butter and eggs"),
        ("Bakery", "Bread and baked goods"),
        ("Snacks", "Chips, biscuits and more"),
    ];

    for (name, description) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    let products = [
        ("Bananas (1 dozen)", "Fresh ripe bananas", 60_i64, 120, "Fruits & Vegetables"),
        ("Tomatoes (1 kg)", "Vine-ripened tomatoes", 40, 80, "Fruits & Vegetables"),
        ("Whole Milk (1 l)", "Pasteurized whole milk", 70, 60, "Dairy & Eggs"),
        ("Farm Eggs (12)", "Free-range eggs", 90, 50, "Dairy & Eggs"),
        ("Sourdough Loaf", "Baked this morning", 120, 25, "Bakery"),
        ("Potato Chips", "Salted, family pack", 50, 200, "Snacks"),
    ];

    for (name, description, price, inventory, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, inventory, category_id)
            VALUES ($1, $2, $3, $4, $5, (SELECT id FROM categories WHERE name = $6))
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(inventory)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_banners(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let banners = [
        ("Groceries in 30 minutes", "Order now, unpack soon", "/banners/hero-1.jpg", 0),
        ("Free delivery over 500", "No fee on big baskets", "/banners/hero-2.jpg", 1),
    ];

    for (title, subtitle, image_url, sort_order) in banners {
        sqlx::query(
            r#"
            INSERT INTO banners (id, title, subtitle, image_url, sort_order)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (SELECT 1 FROM banners WHERE title = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(subtitle)
        .bind(image_url)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    println!("Seeded banners");
    Ok(())
}
