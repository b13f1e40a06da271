use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dto::inventory::{CreateItemRequest, ItemList, UpdateItemRequest},
    entity::inventory_items::{
        ActiveModel as ItemActive, Column, Entity as InventoryItems, Model as ItemModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{InventoryItem, StockState},
    response::{ApiResponse, Meta},
    routes::params::{ItemQuery, ItemSortBy, LowStockQuery, SortOrder},
    state::AppState,
};

/// Line-level reservation failure. Reported to the order workflow as a
/// warning; never aborts the sibling lines of a batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReserveError {
    #[error("item {0} not found")]
    NotFound(Uuid),

    #[error("insufficient stock for {name}: only {available} available")]
    InsufficientStock { name: String, available: i32 },
}

/// Successful reservation: the price and name snapshots for the order
/// line, plus whether this decrement crossed the warn threshold.
#[derive(Debug)]
pub struct Reservation {
    pub item_id: Uuid,
    pub name: String,
    pub price_at_order: i64,
    pub remaining: i32,
    pub crossed_warn_limit: bool,
}

/// Reserve `quantity` units of an item inside the caller's transaction.
///
/// The decrement is a single conditional UPDATE (`on_hand >= quantity`),
/// so concurrent placements against the same item cannot oversell.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    quantity: i32,
) -> AppResult<Result<Reservation, ReserveError>> {
    let updated = InventoryItems::update_many()
        .col_expr(Column::OnHand, Expr::col(Column::OnHand).sub(quantity))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(item_id))
        .filter(Column::OnHand.gte(quantity))
        .exec(conn)
        .await?;

    if updated.rows_affected == 0 {
        return match InventoryItems::find_by_id(item_id).one(conn).await? {
            None => Ok(Err(ReserveError::NotFound(item_id))),
            Some(item) => Ok(Err(ReserveError::InsufficientStock {
                name: item.name,
                available: item.on_hand,
            })),
        };
    }

    let item = InventoryItems::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("item vanished during reserve")))?;

    let before = item.on_hand + quantity;
    let crossed_warn_limit = before > item.warn_limit && item.on_hand <= item.warn_limit;

    Ok(Ok(Reservation {
        item_id,
        name: item.name,
        price_at_order: item.price,
        remaining: item.on_hand,
        crossed_warn_limit,
    }))
}

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    let sort_by = query.sort_by.unwrap_or(ItemSortBy::Name);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Asc);
    let sort_col = match sort_by {
        ItemSortBy::Name => Column::Name,
        ItemSortBy::Price => Column::Price,
        ItemSortBy::CreatedAt => Column::CreatedAt,
    };

    let mut finder = InventoryItems::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Items", ItemList { items }, Some(meta)))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<InventoryItem>> {
    let item = InventoryItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(item_from_entity);
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Item", item, None))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_staff(user)?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.on_hand < 0 {
        return Err(AppError::BadRequest("on_hand must not be negative".into()));
    }

    let active = ItemActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        on_hand: Set(payload.on_hand),
        warn_limit: Set(payload.warn_limit.unwrap_or(5)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let item = active.insert(&state.orm).await?;

    Ok(ApiResponse::success(
        "Item created",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

/// Staff update. A restock or correction that drops `on_hand` from above
/// the warn limit to at-or-below it fires the same low-stock alert the
/// order workflow does; an update that stays on one side fires nothing.
pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateItemRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_staff(user)?;
    let existing = InventoryItems::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let old_on_hand = existing.on_hand;

    let mut active: ItemActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(on_hand) = payload.on_hand {
        if on_hand < 0 {
            return Err(AppError::BadRequest("on_hand must not be negative".into()));
        }
        active.on_hand = Set(on_hand);
    }
    if let Some(warn_limit) = payload.warn_limit {
        active.warn_limit = Set(warn_limit);
    }
    active.updated_at = Set(Utc::now().into());

    let item = active.update(&state.orm).await?;

    // Crossing is judged against the updated limit: raising warn_limit
    // over the current stock is not a drop in stock.
    if old_on_hand > item.warn_limit && item.on_hand <= item.warn_limit {
        let notifier = state.notifier.clone();
        let name = item.name.clone();
        let remaining = item.on_hand;
        tokio::spawn(async move {
            notifier.low_stock(&name, remaining).await;
        });
    }

    Ok(ApiResponse::success(
        "Item updated",
        item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = InventoryItems::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ItemList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let finder = InventoryItems::find()
        .filter(Expr::col(Column::OnHand).lte(Expr::col(Column::WarnLimit)))
        .order_by_asc(Column::OnHand)
        .order_by_asc(Column::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(item_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        ItemList { items },
        Some(meta),
    ))
}

pub fn item_from_entity(model: ItemModel) -> InventoryItem {
    InventoryItem {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        on_hand: model.on_hand,
        warn_limit: model.warn_limit,
        state: StockState::derive(model.on_hand, model.warn_limit),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
