//! Account persistence.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::auth::{hash_password, verify_password, AuthError, TokenService};
use crate::domain::{Capability, DomainError, Role, Shop, ShopPatch, TenantContext, User};
use crate::error::AppError;

use super::{
    AuthResponse, LoginInput, NewUser, Profile, RegisterInput, ShopProfile, UserPatch,
    UserSummary, MIN_PASSWORD_LEN,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, shop_id, created_at";
const SHOP_COLUMNS: &str = "id, name, active, contact_number, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: Role,
    shop_id: i64,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            shop_id: row.shop_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    id: i64,
    name: String,
    active: bool,
    contact_number: String,
    created_at: DateTime<Utc>,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Shop {
            id: row.id,
            name: row.name,
            active: row.active,
            contact_number: row.contact_number,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountService {
    pool: SqlitePool,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(pool: SqlitePool, tokens: TokenService) -> Self {
        Self { pool, tokens }
    }

    // ===== Authentication =====

    /// Create a user, and a shop when no `shop_id` is given, then sign them in.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthResponse, AppError> {
        let name = required("name", &input.name)?;
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;

        if self.email_taken(&email, None).await? {
            return Err(DomainError::Conflict("email is already registered".into()).into());
        }

        let password_hash = hash_password(&input.password)?;

        let mut tx = self.pool.begin().await?;

        let shop_id = match input.shop_id {
            Some(shop_id) => {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM shops WHERE id = ?1")
                    .bind(shop_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                exists.ok_or(DomainError::not_found("Shop"))?
            }
            None => {
                let (shop_name, contact_number) = match (&input.shop_name, &input.contact_number) {
                    (Some(shop_name), Some(contact_number)) => (
                        required("shop_name", shop_name)?,
                        required("contact_number", contact_number)?,
                    ),
                    _ => {
                        return Err(DomainError::validation(
                            "shop_name and contact_number are required to create a new shop",
                        )
                        .into())
                    }
                };

                let shop_id = sqlx::query(
                    "INSERT INTO shops (name, active, contact_number, created_at) VALUES (?1, 1, ?2, ?3)",
                )
                .bind(shop_name)
                .bind(contact_number)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

                tracing::info!(shop_id, "Shop created");
                shop_id
            }
        };

        let user_id = insert_user(&mut *tx, name, &email, &password_hash, input.role, shop_id).await?;
        let user = fetch_user(&mut *tx, user_id)
            .await?
            .ok_or_else(|| AppError::Internal("registered user vanished".into()))?;

        tx.commit().await?;

        tracing::info!(user_id, shop_id, role = %user.role, "User registered");

        self.auth_response(&user)
    }

    /// Wrong email and wrong password fail identically.
    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse, AppError> {
        let email = input.email.trim().to_lowercase();

        let user: Option<User> = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::from);

        let user = match user {
            Some(user) if verify_password(&input.password, &user.password_hash) => user,
            _ => {
                tracing::debug!("Login rejected");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.is_shop_active(user.shop_id).await? {
            return Err(DomainError::Forbidden("shop is inactive".into()).into());
        }

        tracing::info!(user_id = user.id, shop_id = user.shop_id, "User logged in");

        self.auth_response(&user)
    }

    pub async fn me(&self, ctx: &TenantContext) -> Result<Profile, AppError> {
        let user = self.find_user(ctx.shop_id, ctx.user_id).await?;
        let shop = self.find_shop(ctx.shop_id).await?;

        Ok(Profile {
            user: UserSummary::from(&user),
            shop: ShopProfile::from(&shop),
        })
    }

    /// Missing shops count as inactive.
    pub async fn is_shop_active(&self, shop_id: i64) -> Result<bool, AppError> {
        let active: Option<bool> = sqlx::query_scalar("SELECT active FROM shops WHERE id = ?1")
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(active.unwrap_or(false))
    }

    // ===== Shop management =====

    pub async fn get_shop(&self, ctx: &TenantContext) -> Result<Shop, AppError> {
        ctx.require(Capability::ManageShop)?;
        self.find_shop(ctx.shop_id).await
    }

    pub async fn update_shop(&self, ctx: &TenantContext, patch: ShopPatch) -> Result<Shop, AppError> {
        ctx.require(Capability::ManageShop)?;

        if patch.name.is_none() && patch.contact_number.is_none() && patch.active.is_none() {
            return self.find_shop(ctx.shop_id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE shops SET ");
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(required("name", name)?.to_string());
        }
        if let Some(contact_number) = &patch.contact_number {
            set.push("contact_number = ")
                .push_bind_unseparated(required("contact_number", contact_number)?.to_string());
        }
        if let Some(active) = patch.active {
            set.push("active = ").push_bind_unseparated(active);
        }
        query.push(" WHERE id = ").push_bind(ctx.shop_id);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Shop").into());
        }

        tracing::info!(shop_id = ctx.shop_id, active = ?patch.active, "Shop updated");

        self.find_shop(ctx.shop_id).await
    }

    // ===== User management =====

    pub async fn list_users(&self, ctx: &TenantContext) -> Result<Vec<UserSummary>, AppError> {
        ctx.require(Capability::ManageShop)?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE shop_id = ?1 ORDER BY id"
        ))
        .bind(ctx.shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserSummary::from(&User::from(row)))
            .collect())
    }

    pub async fn create_user(&self, ctx: &TenantContext, input: NewUser) -> Result<UserSummary, AppError> {
        ctx.require(Capability::ManageShop)?;

        let name = required("name", &input.name)?;
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;

        if self.email_taken(&email, None).await? {
            return Err(DomainError::Conflict("email is already registered".into()).into());
        }

        let password_hash = hash_password(&input.password)?;
        let user_id =
            insert_user(&self.pool, name, &email, &password_hash, input.role, ctx.shop_id).await?;

        tracing::info!(user_id, shop_id = ctx.shop_id, role = %input.role, "User created");

        let user = self.find_user(ctx.shop_id, user_id).await?;
        Ok(UserSummary::from(&user))
    }

    pub async fn update_user(
        &self,
        ctx: &TenantContext,
        id: i64,
        patch: UserPatch,
    ) -> Result<UserSummary, AppError> {
        ctx.require(Capability::ManageShop)?;

        // Scope check first so other shops' users stay invisible.
        let existing = self.find_user(ctx.shop_id, id).await?;
        if patch.is_empty() {
            return Ok(UserSummary::from(&existing));
        }

        let email = patch.email.as_deref().map(normalize_email).transpose()?;
        if let Some(email) = &email {
            if self.email_taken(email, Some(id)).await? {
                return Err(DomainError::Conflict("email is already registered".into()).into());
            }
        }
        let password_hash = match &patch.password {
            Some(password) => {
                check_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(required("name", name)?.to_string());
        }
        if let Some(email) = email {
            set.push("email = ").push_bind_unseparated(email);
        }
        if let Some(password_hash) = password_hash {
            set.push("password_hash = ").push_bind_unseparated(password_hash);
        }
        if let Some(role) = patch.role {
            set.push("role = ").push_bind_unseparated(role);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND shop_id = ")
            .push_bind(ctx.shop_id);

        query.build().execute(&self.pool).await?;

        tracing::info!(user_id = id, shop_id = ctx.shop_id, "User updated");

        let user = self.find_user(ctx.shop_id, id).await?;
        Ok(UserSummary::from(&user))
    }

    pub async fn delete_user(&self, ctx: &TenantContext, id: i64) -> Result<(), AppError> {
        ctx.require(Capability::ManageShop)?;

        if id == ctx.user_id {
            return Err(DomainError::validation("you cannot delete your own account").into());
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(ctx.shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("User").into());
        }

        tracing::info!(user_id = id, shop_id = ctx.shop_id, "User deleted");
        Ok(())
    }

    // ===== Helpers =====

    fn auth_response(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            token: self.tokens.issue(user)?,
            user: UserSummary::from(user),
        })
    }

    async fn find_shop(&self, shop_id: i64) -> Result<Shop, AppError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?1"
        ))
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Shop::from)
            .ok_or_else(|| DomainError::not_found("Shop").into())
    }

    async fn find_user(&self, shop_id: i64, id: i64) -> Result<User, AppError> {
        match fetch_user(&self.pool, id).await? {
            Some(user) if user.shop_id == shop_id => Ok(user),
            _ => Err(DomainError::not_found("User").into()),
        }
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool, AppError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE email = ?1 AND id != ?2")
                .bind(email)
                .bind(except.unwrap_or(0))
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

async fn insert_user<'e, E>(
    executor: E,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    shop_id: i64,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, role, shop_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(shop_id)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn fetch_user<'e, E>(executor: E, id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(User::from))
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Trimmed and lowercased; must look like `local@domain`.
fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DomainError::validation("email is invalid")),
    }
}

fn check_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Owner@Shop.BF ").unwrap(), "owner@shop.bf");
        assert!(normalize_email("owner").is_err());
        assert!(normalize_email("@shop.bf").is_err());
        assert!(normalize_email("owner@localhost").is_err());
    }

    #[test]
    fn test_check_password() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("name", "  Awa ").unwrap(), "Awa");
        assert!(matches!(required("name", "   "), Err(DomainError::Validation(_))));
    }
}
