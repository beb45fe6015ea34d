//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::{AuthResponse, LoginInput, NewUser, Profile, RegisterInput, UserPatch, UserSummary};
use crate::domain::{
    Capability, EntryKind, LedgerEntry, NewProduct, Product, ProductPatch, ProductView,
    RecordEntry, Role, Shop, ShopPatch, ShopSummary, TenantContext,
};
use crate::error::AppError;
use crate::ledger::DeletedEntry;
use crate::reporting::Dashboard;
use crate::state::AppState;
use crate::storefront::{PublicCatalog, PublicProductDetail, PublicProductFilter};

use super::extract::{Json, Path, Query};
use super::middleware::{require_active_shop, require_capability};

// =========================================================================
// Request/Response types
// =========================================================================

/// Body of `POST /transactions`
#[derive(Debug, Deserialize)]
pub struct RecordTransactionRequest {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Ignored for sales
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    #[serde(default, rename = "type")]
    pub kind: Option<EntryKind>,
}

/// Ledger entry as returned to staff; the embedded product is redacted
/// for the caller's role.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub amount: Decimal,
    pub shop_id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_stock: Option<i64>,
}

impl TransactionResponse {
    fn new(entry: LedgerEntry, role: Role) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            product_id: entry.product_id,
            quantity: entry.quantity,
            amount: entry.amount,
            shop_id: entry.shop_id,
            created_at: entry.created_at,
            product: entry.product.as_ref().map(|p| p.view_for(role)),
            new_stock: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionsListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct LowStockResponse {
    pub products: Vec<Product>,
    pub count: usize,
}

// =========================================================================
// API Router
// =========================================================================

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/public/shops", get(list_public_shops))
        .route("/public/:shop_id/products", get(list_public_products))
        .route("/public/:shop_id/products/:product_id", get(get_public_product))
}

/// Routes behind bearer authentication.
///
/// The caller must still add the authentication layer on top; the role and
/// active-shop gates here read the [`TenantContext`] it inserts.
pub fn create_router(state: &AppState) -> Router<AppState> {
    let catalog = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .layer(middleware::from_fn_with_state(
            Capability::ManageCatalog,
            require_capability,
        ));

    let ledger = Router::new()
        .route("/transactions", get(list_transactions).post(record_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction).delete(delete_transaction),
        )
        .layer(middleware::from_fn_with_state(
            Capability::RecordTransactions,
            require_capability,
        ));

    let reports = Router::new()
        .route("/reports/dashboard", get(dashboard))
        .route("/reports/low-stock", get(low_stock))
        .layer(middleware::from_fn_with_state(
            Capability::ViewReports,
            require_capability,
        ));

    // Outer layer: the active-shop check runs before the role gates.
    let shop_data = catalog
        .merge(ledger)
        .merge(reports)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_active_shop,
        ));

    // Left open for inactive shops so a SuperAdmin can reactivate.
    let administration = Router::new()
        .route("/shop", get(get_shop).put(update_shop))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .layer(middleware::from_fn_with_state(
            Capability::ManageShop,
            require_capability,
        ));

    Router::new()
        .route("/me", get(me))
        .merge(shop_data)
        .merge(administration)
}

// =========================================================================
// Accounts
// =========================================================================

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = state.accounts().register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.accounts().login(input).await?))
}

async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.accounts().me(&ctx).await?))
}

// =========================================================================
// Public catalog
// =========================================================================

async fn list_public_shops(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShopSummary>>, AppError> {
    Ok(Json(state.storefront().list_public_shops().await?))
}

async fn list_public_products(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
    Query(filter): Query<PublicProductFilter>,
) -> Result<Json<PublicCatalog>, AppError> {
    Ok(Json(state.storefront().list_products(shop_id, filter).await?))
}

async fn get_public_product(
    State(state): State<AppState>,
    Path((shop_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<PublicProductDetail>, AppError> {
    Ok(Json(state.storefront().get_product(shop_id, product_id).await?))
}

// =========================================================================
// Products
// =========================================================================

async fn list_products(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    Ok(Json(state.catalog().list(ctx.shop_id, ctx.role).await?))
}

async fn get_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> Result<Json<ProductView>, AppError> {
    Ok(Json(state.catalog().get(ctx.shop_id, id, ctx.role).await?))
}

async fn create_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    let product = state.catalog().create(ctx.shop_id, input).await?;
    Ok((StatusCode::CREATED, Json(product.view_for(ctx.role))))
}

async fn update_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductView>, AppError> {
    let product = state.catalog().update(ctx.shop_id, id, patch).await?;
    Ok(Json(product.view_for(ctx.role)))
}

async fn delete_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.catalog().delete(ctx.shop_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Transactions
// =========================================================================

async fn record_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(request): Json<RecordTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let entry = RecordEntry::from_parts(
        request.kind,
        request.product_id,
        request.quantity,
        request.amount,
    )?;

    let recorded = state.ledger().record(ctx.shop_id, entry).await?;

    tracing::info!(
        shop_id = ctx.shop_id,
        user_id = ctx.user_id,
        entry_id = recorded.entry.id,
        kind = %recorded.entry.kind,
        correlation_id = ?ctx.correlation_id,
        "Transaction recorded"
    );

    let mut response = TransactionResponse::new(recorded.entry, ctx.role);
    response.new_stock = recorded.new_stock;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionsListResponse>, AppError> {
    let transactions: Vec<TransactionResponse> = state
        .ledger()
        .list(ctx.shop_id, query.kind)
        .await?
        .into_iter()
        .map(|entry| TransactionResponse::new(entry, ctx.role))
        .collect();

    Ok(Json(TransactionsListResponse {
        count: transactions.len(),
        transactions,
    }))
}

async fn get_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionResponse>, AppError> {
    let entry = state.ledger().get(ctx.shop_id, id).await?;
    Ok(Json(TransactionResponse::new(entry, ctx.role)))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedEntry>, AppError> {
    let deleted = state.ledger().delete(ctx.shop_id, id).await?;

    tracing::info!(
        shop_id = ctx.shop_id,
        user_id = ctx.user_id,
        entry_id = id,
        correlation_id = ?ctx.correlation_id,
        "Transaction deleted"
    );

    Ok(Json(deleted))
}

// =========================================================================
// Reports
// =========================================================================

async fn dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(state.reporting().dashboard(ctx.shop_id).await?))
}

async fn low_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<LowStockResponse>, AppError> {
    let products = state.reporting().low_stock(ctx.shop_id).await?;
    Ok(Json(LowStockResponse {
        count: products.len(),
        products,
    }))
}

// =========================================================================
// Shop and users
// =========================================================================

async fn get_shop(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Shop>, AppError> {
    Ok(Json(state.accounts().get_shop(&ctx).await?))
}

async fn update_shop(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(patch): Json<ShopPatch>,
) -> Result<Json<Shop>, AppError> {
    Ok(Json(state.accounts().update_shop(&ctx, patch).await?))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(state.accounts().list_users(&ctx).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let user = state.accounts().create_user(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserSummary>, AppError> {
    Ok(Json(state.accounts().update_user(&ctx, id, patch).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.accounts().delete_user(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
