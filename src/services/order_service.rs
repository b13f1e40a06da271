use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderReceipt, OrderWithItems, PlaceOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{customer_service, inventory_service},
    state::AppState,
};

/// Place a multi-line order for the calling customer.
///
/// Lines are processed independently: a line that names an unknown item or
/// asks for more than is on hand becomes a warning, the rest of the batch
/// continues. The order and all successful reservations commit as one
/// transaction; if no line succeeds, nothing is persisted and the caller
/// gets the full warning list back. Notifications go out after commit and
/// never fail the placement.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderReceipt>> {
    // Staff accounts manage the shop, they do not buy from it.
    if user.is_staff {
        return Err(AppError::Forbidden);
    }
    if payload.lines.is_empty() {
        return Err(AppError::BadRequest("order has no lines".into()));
    }

    let txn = state.orm.begin().await?;

    let customer = customer_service::find_for_user(&txn, user.user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("register as a customer first".into()))?;

    let mut warnings: Vec<String> = Vec::new();
    let mut reservations = Vec::new();
    let mut line_summaries: Vec<String> = Vec::new();
    let mut low_stock_events: Vec<(String, i32)> = Vec::new();
    let mut total_amount: i64 = 0;

    for line in &payload.lines {
        if line.quantity <= 0 {
            warnings.push(format!(
                "item {}: quantity must be positive, got {}",
                line.item_id, line.quantity
            ));
            continue;
        }

        match inventory_service::reserve(&txn, line.item_id, line.quantity).await? {
            Ok(reservation) => {
                total_amount += reservation.price_at_order * line.quantity as i64;
                line_summaries.push(format!("{} x{}", reservation.name, line.quantity));
                if reservation.crossed_warn_limit {
                    low_stock_events.push((reservation.name.clone(), reservation.remaining));
                }
                reservations.push((reservation, line.quantity));
            }
            Err(err) => warnings.push(err.to_string()),
        }
    }

    if reservations.is_empty() {
        txn.rollback().await?;
        return Err(AppError::NoValidItems(warnings));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        status: Set(OrderStatus::Created.to_string()),
        total_amount: Set(total_amount),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::new();
    for (reservation, quantity) in reservations {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            item_id: Set(reservation.item_id),
            item_name: Set(reservation.name),
            quantity: Set(quantity),
            price_at_order: Set(reservation.price_at_order),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    let order = order_from_entity(order)?;

    // Fire-and-forget: the response does not wait on the SMS provider.
    let notifier = state.notifier.clone();
    let customer_model = customer_service::customer_from_entity(customer);
    let summary = line_summaries.join(", ");
    let order_for_sms = order.clone();
    tokio::spawn(async move {
        notifier
            .order_confirmation(&customer_model, &order_for_sms, &summary)
            .await;
        for (name, remaining) in low_stock_events {
            notifier.low_stock(&name, remaining).await;
        }
    });

    Ok(ApiResponse::success(
        "Order placed",
        OrderReceipt {
            order,
            items,
            line_summaries,
            warnings,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let customer = customer_service::find_for_user(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::CustomerId.eq(customer.id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.to_string()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<Order>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let customer = customer_service::find_for_user(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::CustomerId.eq(customer.id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => order_from_entity(o)?,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        status,
        total_amount: model.total_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        item_id: model.item_id,
        item_name: model.item_name,
        quantity: model.quantity,
        price_at_order: model.price_at_order,
    }
}
